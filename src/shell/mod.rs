// Composition root.
//
// Responsibilities
// - Read config from the environment.
// - Build the route context, register the diagnostics hook and the hello world route.
// - Serve the management API until shutdown, then stop the context.

pub mod bootstrap;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod state;
