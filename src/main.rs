//! Tickwheel - countdown timer daemon
//!
//! This is the main entry point for the tickwheel application.

use std::sync::Arc;
use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use tickwheel::{
    api::create_router,
    config::Config,
    state::{AppState, Countdown},
    tasks::TokioScheduler,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("tickwheel={},tower_http=info", config.log_level()))
        .init();

    info!("Starting tickwheel server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, duration={}s, tick={}ms",
          config.host, config.port, config.duration, config.tick_ms);

    // Create the countdown on this runtime
    let countdown = Countdown::new(Arc::new(TokioScheduler::current()), config.tick_interval());
    if config.duration > 0 {
        let seconds = i64::try_from(config.duration).context("initial duration is too large")?;
        countdown.set_duration(seconds)?;
    }

    let state = Arc::new(AppState::new(config.port, config.host.clone(), countdown));

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /drag/start - Begin a drag (angle or x/y)");
    info!("  POST /drag/move  - Rotate the pointer (delta or dx/dy)");
    info!("  POST /drag/end   - Finish the drag");
    info!("  POST /toggle     - Start or pause the countdown");
    info!("  POST /reset      - Clear the countdown");
    info!("  POST /duration   - Set the duration (seconds or hours/minutes/seconds)");
    info!("  GET  /status     - Current timer and server status");
    info!("  GET  /events     - Server-sent timer updates");
    info!("  GET  /health     - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        signal = shutdown_signal() => {
            match signal {
                Ok(_) => info!("Shutdown signal received"),
                Err(e) => tracing::error!("Failed to install signal handlers: {}", e),
            }
        }
    }

    // Releases the countdown and with it any scheduled tick
    drop(state);
    info!("Server shutdown complete");
    Ok(())
}
