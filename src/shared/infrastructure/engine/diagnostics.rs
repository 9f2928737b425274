// Diagnostics switches owned by the route context.
//
// Responsibilities
// - Exchange factories count created and released exchanges when their statistics are enabled.
// - The management agent decides which statistics the context collects.
// - DiagnosticsSettings is both the snapshot of every switch and the explicit configuration
//   accepted by RouteContext::with_diagnostics.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum StatisticsLevel {
    Off,
    #[default]
    Default,
    Extended,
}

impl StatisticsLevel {
    fn as_u8(self) -> u8 {
        match self {
            StatisticsLevel::Off => 0,
            StatisticsLevel::Default => 1,
            StatisticsLevel::Extended => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => StatisticsLevel::Off,
            2 => StatisticsLevel::Extended,
            _ => StatisticsLevel::Default,
        }
    }

    pub fn collects_routes(self) -> bool {
        self >= StatisticsLevel::Default
    }

    pub fn collects_processors(self) -> bool {
        self == StatisticsLevel::Extended
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsSettings {
    pub exchange_factory_manager_statistics_enabled: bool,
    pub exchange_factory_statistics_enabled: bool,
    pub processor_exchange_factory_statistics_enabled: bool,
    pub load_statistics_enabled: bool,
    pub endpoint_runtime_statistics_enabled: bool,
    pub statistics_level: StatisticsLevel,
    pub inflight_browse_enabled: bool,
    pub backlog_tracing: bool,
    pub runtime_endpoint_registry_enabled: bool,
}

impl DiagnosticsSettings {
    pub fn statistics_enabled(&self) -> bool {
        self.exchange_factory_manager_statistics_enabled
            && self.exchange_factory_statistics_enabled
            && self.processor_exchange_factory_statistics_enabled
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeFactoryStatistics {
    pub name: &'static str,
    pub statistics_enabled: bool,
    pub created: u64,
    pub released: u64,
}

#[derive(Debug)]
pub struct ExchangeFactory {
    name: &'static str,
    statistics_enabled: AtomicBool,
    created: AtomicU64,
    released: AtomicU64,
}

impl ExchangeFactory {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            statistics_enabled: AtomicBool::new(false),
            created: AtomicU64::new(0),
            released: AtomicU64::new(0),
        }
    }

    pub fn set_statistics_enabled(&self, enabled: bool) {
        self.statistics_enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn is_statistics_enabled(&self) -> bool {
        self.statistics_enabled.load(Ordering::SeqCst)
    }

    pub fn on_created(&self) {
        if self.is_statistics_enabled() {
            self.created.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn on_released(&self) {
        if self.is_statistics_enabled() {
            self.released.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn statistics(&self) -> ExchangeFactoryStatistics {
        ExchangeFactoryStatistics {
            name: self.name,
            statistics_enabled: self.is_statistics_enabled(),
            created: self.created.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Default)]
pub struct ManagementAgent {
    load_statistics_enabled: AtomicBool,
    endpoint_runtime_statistics_enabled: AtomicBool,
    statistics_level: AtomicU8,
}

impl ManagementAgent {
    pub fn new() -> Self {
        let agent = Self::default();
        agent.set_statistics_level(StatisticsLevel::Default);
        agent
    }

    pub fn set_load_statistics_enabled(&self, enabled: bool) {
        self.load_statistics_enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn is_load_statistics_enabled(&self) -> bool {
        self.load_statistics_enabled.load(Ordering::SeqCst)
    }

    pub fn set_endpoint_runtime_statistics_enabled(&self, enabled: bool) {
        self.endpoint_runtime_statistics_enabled
            .store(enabled, Ordering::SeqCst);
    }

    pub fn is_endpoint_runtime_statistics_enabled(&self) -> bool {
        self.endpoint_runtime_statistics_enabled.load(Ordering::SeqCst)
    }

    pub fn set_statistics_level(&self, level: StatisticsLevel) {
        self.statistics_level.store(level.as_u8(), Ordering::SeqCst);
    }

    pub fn statistics_level(&self) -> StatisticsLevel {
        StatisticsLevel::from_u8(self.statistics_level.load(Ordering::SeqCst))
    }
}

/// Registry of endpoints used at runtime. Kept switched off by the application.
#[derive(Debug, Default)]
pub struct RuntimeEndpointRegistry {
    enabled: AtomicBool,
}

impl RuntimeEndpointRegistry {
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod engine_diagnostics_tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn it_should_only_count_when_statistics_are_enabled() {
        let factory = ExchangeFactory::new("exchangeFactory");
        factory.on_created();
        factory.set_statistics_enabled(true);
        factory.on_created();
        factory.on_created();
        factory.on_released();
        let stats = factory.statistics();
        assert!(stats.statistics_enabled);
        assert_eq!(stats.created, 2);
        assert_eq!(stats.released, 1);
    }

    #[rstest]
    #[case(StatisticsLevel::Off)]
    #[case(StatisticsLevel::Default)]
    #[case(StatisticsLevel::Extended)]
    fn it_should_store_the_statistics_level(#[case] level: StatisticsLevel) {
        let agent = ManagementAgent::new();
        agent.set_statistics_level(level);
        assert_eq!(agent.statistics_level(), level);
    }

    #[rstest]
    fn it_should_start_with_default_agent_settings() {
        let agent = ManagementAgent::new();
        assert_eq!(agent.statistics_level(), StatisticsLevel::Default);
        assert!(!agent.is_load_statistics_enabled());
        assert!(!agent.is_endpoint_runtime_statistics_enabled());
    }

    #[rstest]
    fn it_should_order_levels_by_verbosity() {
        assert!(!StatisticsLevel::Off.collects_routes());
        assert!(StatisticsLevel::Default.collects_routes());
        assert!(!StatisticsLevel::Default.collects_processors());
        assert!(StatisticsLevel::Extended.collects_processors());
    }

    #[rstest]
    fn it_should_report_statistics_enabled_only_when_all_factories_are_on() {
        let mut settings = DiagnosticsSettings {
            exchange_factory_manager_statistics_enabled: true,
            exchange_factory_statistics_enabled: true,
            ..Default::default()
        };
        assert!(!settings.statistics_enabled());
        settings.processor_exchange_factory_statistics_enabled = true;
        assert!(settings.statistics_enabled());
    }
}
