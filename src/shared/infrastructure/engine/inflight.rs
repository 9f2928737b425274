// In-flight repository.
//
// Responsibilities
// - Track every exchange between creation and the end of its route.
// - Expose the tracked exchanges for browsing, but only when browsing is switched on.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct InflightEntry {
    route_id: String,
    node_id: Option<String>,
    started: Instant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InflightExchange {
    pub exchange_id: String,
    pub route_id: String,
    pub node_id: Option<String>,
    pub elapsed_ms: u64,
}

#[derive(Debug, Default)]
pub struct InflightRepository {
    browse_enabled: AtomicBool,
    entries: RwLock<HashMap<String, InflightEntry>>,
}

impl InflightRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_inflight_browse_enabled(&self, enabled: bool) {
        self.browse_enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn is_inflight_browse_enabled(&self) -> bool {
        self.browse_enabled.load(Ordering::SeqCst)
    }

    pub async fn add(&self, exchange_id: &str, route_id: &str) {
        self.entries.write().await.insert(
            exchange_id.to_string(),
            InflightEntry {
                route_id: route_id.to_string(),
                node_id: None,
                started: Instant::now(),
            },
        );
    }

    pub async fn set_node(&self, exchange_id: &str, node_id: &str) {
        if let Some(entry) = self.entries.write().await.get_mut(exchange_id) {
            entry.node_id = Some(node_id.to_string());
        }
    }

    pub async fn remove(&self, exchange_id: &str) {
        self.entries.write().await.remove(exchange_id);
    }

    pub async fn size(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Longest running first. Empty when browsing is disabled.
    pub async fn browse(&self) -> Vec<InflightExchange> {
        if !self.is_inflight_browse_enabled() {
            return Vec::new();
        }
        let mut exchanges: Vec<InflightExchange> = self
            .entries
            .read()
            .await
            .iter()
            .map(|(exchange_id, entry)| InflightExchange {
                exchange_id: exchange_id.clone(),
                route_id: entry.route_id.clone(),
                node_id: entry.node_id.clone(),
                elapsed_ms: entry.started.elapsed().as_millis() as u64,
            })
            .collect();
        exchanges.sort_by(|a, b| b.elapsed_ms.cmp(&a.elapsed_ms));
        exchanges
    }
}

#[cfg(test)]
mod engine_inflight_tests {
    use super::*;
    use rstest::rstest;
    use std::time::Duration;

    #[rstest]
    #[tokio::test]
    async fn it_should_track_size_even_when_browsing_is_disabled() {
        let repository = InflightRepository::new();
        repository.add("ex-1", "route1").await;
        assert_eq!(repository.size().await, 1);
        assert!(repository.browse().await.is_empty());
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn it_should_browse_the_longest_running_exchange_first() {
        let repository = InflightRepository::new();
        repository.set_inflight_browse_enabled(true);
        repository.add("ex-1", "route1").await;
        tokio::time::sleep(Duration::from_millis(250)).await;
        repository.add("ex-2", "route1").await;
        repository.set_node("ex-1", "to1").await;

        let browsed = repository.browse().await;
        assert_eq!(browsed.len(), 2);
        assert_eq!(browsed[0].exchange_id, "ex-1");
        assert_eq!(browsed[0].node_id.as_deref(), Some("to1"));
        assert!(browsed[0].elapsed_ms >= 250);
        assert_eq!(browsed[1].exchange_id, "ex-2");
        assert_eq!(browsed[1].node_id, None);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_forget_removed_exchanges() {
        let repository = InflightRepository::new();
        repository.set_inflight_browse_enabled(true);
        repository.add("ex-1", "route1").await;
        repository.remove("ex-1").await;
        assert_eq!(repository.size().await, 0);
        assert!(repository.browse().await.is_empty());
    }
}
