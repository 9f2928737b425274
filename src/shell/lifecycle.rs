// Lifecycle hook registered by the bootstrap. Diagnostics must be switched on before the
// first timer fires, so the work happens in the before-start phase.

use crate::modules::hello_world::use_cases::enable_diagnostics::configure::enable_stats_and_inflight_browse;
use crate::shared::infrastructure::engine::EngineError;
use crate::shared::infrastructure::engine::context::RouteContext;
use crate::shared::infrastructure::engine::lifecycle::ContextConfiguration;
use async_trait::async_trait;

pub struct DiagnosticsContextConfiguration;

#[async_trait]
impl ContextConfiguration for DiagnosticsContextConfiguration {
    async fn before_application_start(&self, context: &RouteContext) -> Result<(), EngineError> {
        enable_stats_and_inflight_browse(context);
        Ok(())
    }

    async fn after_application_start(&self, _context: &RouteContext) -> Result<(), EngineError> {
        Ok(())
    }
}
