use crate::shared::infrastructure::engine::context::RouteContext;
use crate::shared::infrastructure::engine::diagnostics::StatisticsLevel;
use tracing::info;

/// Switches on statistics, in-flight browsing and backlog tracing.
///
/// The runtime endpoint registry is left as it is.
pub fn enable_stats_and_inflight_browse(context: &RouteContext) {
    context.exchange_factory_manager().set_statistics_enabled(true);
    context.exchange_factory().set_statistics_enabled(true);
    context.processor_exchange_factory().set_statistics_enabled(true);

    let agent = context.management_agent();
    agent.set_load_statistics_enabled(true);
    agent.set_endpoint_runtime_statistics_enabled(true);
    agent.set_statistics_level(StatisticsLevel::Extended);

    context.inflight_repository().set_inflight_browse_enabled(true);
    context.set_backlog_tracing(true);

    info!(context = %context.name(), "statistics, inflight browse and backlog tracing enabled");
}

#[cfg(test)]
mod enable_diagnostics_tests {
    use super::*;
    use crate::shared::infrastructure::engine::diagnostics::DiagnosticsSettings;
    use rstest::{fixture, rstest};

    #[fixture]
    fn context() -> RouteContext {
        RouteContext::new("test")
    }

    fn fully_enabled() -> DiagnosticsSettings {
        DiagnosticsSettings {
            exchange_factory_manager_statistics_enabled: true,
            exchange_factory_statistics_enabled: true,
            processor_exchange_factory_statistics_enabled: true,
            load_statistics_enabled: true,
            endpoint_runtime_statistics_enabled: true,
            statistics_level: StatisticsLevel::Extended,
            inflight_browse_enabled: true,
            backlog_tracing: true,
            runtime_endpoint_registry_enabled: false,
        }
    }

    #[rstest]
    fn it_should_enable_every_diagnostic(context: RouteContext) {
        enable_stats_and_inflight_browse(&context);
        let settings = context.diagnostics_settings();
        assert_eq!(settings, fully_enabled());
        assert!(settings.statistics_enabled());
    }

    #[rstest]
    fn it_should_leave_the_runtime_endpoint_registry_disabled(context: RouteContext) {
        enable_stats_and_inflight_browse(&context);
        assert!(!context.runtime_endpoint_registry().is_enabled());
    }

    #[rstest]
    fn it_should_be_idempotent(context: RouteContext) {
        enable_stats_and_inflight_browse(&context);
        enable_stats_and_inflight_browse(&context);
        assert_eq!(context.diagnostics_settings(), fully_enabled());
    }
}
