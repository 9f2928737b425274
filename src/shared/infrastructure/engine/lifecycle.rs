// Two-phase startup observer registered with a RouteContext.
//
// before_application_start runs after routes are added but before any consumer starts.
// after_application_start runs once every route is started.

use crate::shared::infrastructure::engine::EngineError;
use crate::shared::infrastructure::engine::context::RouteContext;
use async_trait::async_trait;

#[async_trait]
pub trait ContextConfiguration: Send + Sync {
    async fn before_application_start(&self, context: &RouteContext) -> Result<(), EngineError>;

    async fn after_application_start(&self, context: &RouteContext) -> Result<(), EngineError>;
}
