// Runtime statistics collected by the route context.
//
// Notes
// - Route and processor counters are keyed by id, endpoint counters by URI.
// - Load averages follow the usual 1, 5 and 15 minute exponential decay, sampled once per second.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingStats {
    pub exchanges_total: u64,
    pub exchanges_completed: u64,
    pub exchanges_failed: u64,
    pub exchanges_inflight: u64,
    pub min_processing_ms: Option<u64>,
    pub max_processing_ms: u64,
    pub last_processing_ms: u64,
    pub total_processing_ms: u64,
    pub last_completed_at: Option<DateTime<Utc>>,
}

impl ProcessingStats {
    fn started(&mut self) {
        self.exchanges_total += 1;
        self.exchanges_inflight += 1;
    }

    fn done(&mut self, elapsed: Duration, failed: bool) {
        let ms = elapsed.as_millis() as u64;
        self.exchanges_inflight = self.exchanges_inflight.saturating_sub(1);
        if failed {
            self.exchanges_failed += 1;
        } else {
            self.exchanges_completed += 1;
            self.last_completed_at = Some(Utc::now());
        }
        self.min_processing_ms = Some(self.min_processing_ms.map_or(ms, |min| min.min(ms)));
        self.max_processing_ms = self.max_processing_ms.max(ms);
        self.last_processing_ms = ms;
        self.total_processing_ms += ms;
    }

    pub fn mean_processing_ms(&self) -> u64 {
        let finished = self.exchanges_completed + self.exchanges_failed;
        if finished == 0 {
            0
        } else {
            self.total_processing_ms / finished
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EndpointStats {
    #[serde(rename = "in")]
    pub hits_in: u64,
    #[serde(rename = "out")]
    pub hits_out: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LoadTriplet {
    pub load01: f64,
    pub load05: f64,
    pub load15: f64,
}

impl LoadTriplet {
    pub fn update(&mut self, reading: f64) {
        self.load01 = decay(self.load01, reading, 60.0);
        self.load05 = decay(self.load05, reading, 300.0);
        self.load15 = decay(self.load15, reading, 900.0);
    }
}

fn decay(load: f64, reading: f64, window_secs: f64) -> f64 {
    let exp = (-1.0 / window_secs).exp();
    load * exp + reading * (1.0 - exp)
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSnapshot {
    pub routes: BTreeMap<String, ProcessingStats>,
    pub processors: BTreeMap<String, ProcessingStats>,
    pub endpoints: BTreeMap<String, EndpointStats>,
    pub load: Option<LoadTriplet>,
}

#[derive(Debug, Default)]
pub struct StatisticsRegistry {
    routes: RwLock<BTreeMap<String, ProcessingStats>>,
    processors: RwLock<BTreeMap<String, ProcessingStats>>,
    endpoints: RwLock<BTreeMap<String, EndpointStats>>,
    load: RwLock<Option<LoadTriplet>>,
}

impl StatisticsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn route_started(&self, route_id: &str) {
        self.routes
            .write()
            .await
            .entry(route_id.to_string())
            .or_default()
            .started();
    }

    pub async fn route_done(&self, route_id: &str, elapsed: Duration, failed: bool) {
        self.routes
            .write()
            .await
            .entry(route_id.to_string())
            .or_default()
            .done(elapsed, failed);
    }

    pub async fn processor_done(&self, node_id: &str, elapsed: Duration, failed: bool) {
        let mut guard = self.processors.write().await;
        let stats = guard.entry(node_id.to_string()).or_default();
        stats.started();
        stats.done(elapsed, failed);
    }

    pub async fn endpoint_in(&self, uri: &str) {
        self.endpoints
            .write()
            .await
            .entry(uri.to_string())
            .or_default()
            .hits_in += 1;
    }

    pub async fn endpoint_out(&self, uri: &str) {
        self.endpoints
            .write()
            .await
            .entry(uri.to_string())
            .or_default()
            .hits_out += 1;
    }

    pub async fn sample_load(&self, inflight: usize) {
        self.load
            .write()
            .await
            .get_or_insert_with(LoadTriplet::default)
            .update(inflight as f64);
    }

    pub async fn route(&self, route_id: &str) -> Option<ProcessingStats> {
        self.routes.read().await.get(route_id).cloned()
    }

    pub async fn processor(&self, node_id: &str) -> Option<ProcessingStats> {
        self.processors.read().await.get(node_id).cloned()
    }

    pub async fn endpoint(&self, uri: &str) -> Option<EndpointStats> {
        self.endpoints.read().await.get(uri).copied()
    }

    pub async fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            routes: self.routes.read().await.clone(),
            processors: self.processors.read().await.clone(),
            endpoints: self.endpoints.read().await.clone(),
            load: *self.load.read().await,
        }
    }
}

#[cfg(test)]
mod engine_statistics_tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn registry() -> StatisticsRegistry {
        StatisticsRegistry::new()
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_track_route_processing(registry: StatisticsRegistry) {
        registry.route_started("route1").await;
        registry.route_done("route1", Duration::from_millis(4), false).await;
        registry.route_started("route1").await;
        registry.route_done("route1", Duration::from_millis(8), true).await;

        let stats = registry.route("route1").await.expect("route stats");
        assert_eq!(stats.exchanges_total, 2);
        assert_eq!(stats.exchanges_completed, 1);
        assert_eq!(stats.exchanges_failed, 1);
        assert_eq!(stats.exchanges_inflight, 0);
        assert_eq!(stats.min_processing_ms, Some(4));
        assert_eq!(stats.max_processing_ms, 8);
        assert_eq!(stats.last_processing_ms, 8);
        assert_eq!(stats.mean_processing_ms(), 6);
        assert!(stats.last_completed_at.is_some());
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_count_endpoint_hits_per_direction(registry: StatisticsRegistry) {
        registry.endpoint_in("timer://foo?period=5000").await;
        registry.endpoint_in("timer://foo?period=5000").await;
        registry.endpoint_out("log:mylogger").await;

        assert_eq!(
            registry.endpoint("timer://foo?period=5000").await,
            Some(EndpointStats { hits_in: 2, hits_out: 0 })
        );
        assert_eq!(
            registry.endpoint("log:mylogger").await,
            Some(EndpointStats { hits_in: 0, hits_out: 1 })
        );
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_only_report_load_once_sampled(registry: StatisticsRegistry) {
        assert!(registry.snapshot().await.load.is_none());
        registry.sample_load(1).await;
        let load = registry.snapshot().await.load.expect("load sampled");
        assert!(load.load01 > load.load05);
        assert!(load.load05 > load.load15);
        assert!(load.load15 > 0.0);
    }

    #[rstest]
    fn it_should_converge_towards_a_constant_reading() {
        let mut load = LoadTriplet::default();
        for _ in 0..3600 {
            load.update(2.0);
        }
        assert!((load.load01 - 2.0).abs() < 0.01);
        assert!(load.load15 < load.load01);
    }
}
