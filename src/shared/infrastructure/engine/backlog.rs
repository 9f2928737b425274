// Backlog tracer.
//
// Keeps the most recent trace events in a bounded ring so recently processed messages can be
// inspected after the fact. Oldest events are dropped first once the ring is full.

use crate::shared::infrastructure::engine::exchange::Exchange;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Mutex;

pub const DEFAULT_BACKLOG_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BacklogTracerEvent {
    pub uid: u64,
    pub timestamp: DateTime<Utc>,
    pub route_id: String,
    pub node_id: String,
    pub exchange_id: String,
    pub body: Option<String>,
}

#[derive(Debug)]
pub struct BacklogTracer {
    enabled: AtomicBool,
    capacity: usize,
    next_uid: AtomicU64,
    events: Mutex<VecDeque<BacklogTracerEvent>>,
}

impl Default for BacklogTracer {
    fn default() -> Self {
        Self::new(DEFAULT_BACKLOG_SIZE)
    }
}

impl BacklogTracer {
    pub fn new(capacity: usize) -> Self {
        Self {
            enabled: AtomicBool::new(false),
            capacity: capacity.max(1),
            next_uid: AtomicU64::new(1),
            events: Mutex::new(VecDeque::new()),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn trace(&self, route_id: &str, node_id: &str, exchange: &Exchange) {
        if !self.is_enabled() {
            return;
        }
        let event = BacklogTracerEvent {
            uid: self.next_uid.fetch_add(1, Ordering::Relaxed),
            timestamp: Utc::now(),
            route_id: route_id.to_string(),
            node_id: node_id.to_string(),
            exchange_id: exchange.exchange_id.clone(),
            body: exchange.message.body.as_text(),
        };
        let mut events = self.events.lock().await;
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    pub async fn dump_all(&self) -> Vec<BacklogTracerEvent> {
        self.events.lock().await.iter().cloned().collect()
    }

    pub async fn clear(&self) {
        self.events.lock().await.clear();
    }
}
