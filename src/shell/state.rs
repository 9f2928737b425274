use crate::shared::infrastructure::engine::context::RouteContext;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub context: Arc<RouteContext>,
}
