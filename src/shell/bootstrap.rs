use crate::modules::hello_world::use_cases::hello_world_route::route::HelloWorldRouter;
use crate::shared::infrastructure::engine::EngineError;
use crate::shared::infrastructure::engine::context::RouteContext;
use crate::shell::config::AppConfig;
use crate::shell::http::router;
use crate::shell::lifecycle::DiagnosticsContextConfiguration;
use crate::shell::state::AppState;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

pub const CONTEXT_NAME: &str = "hello-router";

/// Starts the route context and serves the management API until Ctrl-C.
///
/// Command-line arguments are accepted for parity with other launchers but define no flags.
pub async fn run(args: Vec<String>) -> anyhow::Result<()> {
    debug!(?args, "bootstrapping");
    let config = AppConfig::from_env()?;
    let addr = config.socket_addr()?;
    let context = build_context(&config).await?;

    let listener = TcpListener::bind(addr).await?;
    context.start().await?;
    info!("Management API: http://{}", addr);

    let app = router(AppState {
        context: context.clone(),
    });
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    context.stop().await?;
    served?;
    Ok(())
}

pub async fn build_context(config: &AppConfig) -> Result<Arc<RouteContext>, EngineError> {
    let context = Arc::new(RouteContext::new(CONTEXT_NAME).with_backlog_size(config.backlog_size));
    context
        .add_configuration(Arc::new(DiagnosticsContextConfiguration))
        .await;
    context.add_routes(&HelloWorldRouter).await?;
    Ok(context)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "unable to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
