// In-process routing engine.
//
// Purpose
// - Host declarative routes (source endpoint, processor steps, sink endpoints) on tokio tasks.
// - Own the diagnostics facilities the application toggles: exchange factory statistics,
//   the management agent, the in-flight repository and the backlog tracer.
//
// Boundaries
// - The application never reaches into engine internals; it only builds routes,
//   registers lifecycle hooks and flips diagnostics switches through RouteContext.

use thiserror::Error;

pub mod backlog;
pub mod context;
pub mod diagnostics;
pub mod endpoint;
pub mod exchange;
pub mod inflight;
pub mod lifecycle;
pub mod processor;
pub mod route;
pub mod statistics;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid endpoint uri {uri}: {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("no component found for scheme: {0}")]
    UnknownComponent(String),

    #[error("invalid option {option}={value} on endpoint {uri}")]
    InvalidOption {
        uri: String,
        option: String,
        value: String,
    },

    #[error("invalid expression: {0}")]
    InvalidExpression(String),

    #[error("endpoint cannot be used as a producer: {0}")]
    UnsupportedProducer(String),

    #[error("endpoint cannot be used as a consumer: {0}")]
    UnsupportedConsumer(String),

    #[error("route context is {actual}, expected {expected}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("duplicate route id: {0}")]
    DuplicateRoute(String),

    #[error("lifecycle hook failed: {0}")]
    Lifecycle(String),

    #[error("processing failed at {node_id}: {reason}")]
    Processing { node_id: String, reason: String },
}
