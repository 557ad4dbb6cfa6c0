//! WOD Coach - A workout interval timer service
//!
//! This is the main entry point for the wod-coach application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use wod_coach::{
    api::create_router,
    config::Config,
    services::WodGenerator,
    state::AppState,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("wod_coach={},tower_http=info", config.log_level()))
        .init();

    info!("Starting wod-coach server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, cues={:?}, tabata={}s/{}s",
          config.host, config.port, config.cues, config.tabata_work, config.tabata_rest);

    // Create application state
    let mut state = AppState::new(config.port, config.host.clone(), config.cues)
        .with_tabata(config.tabata_work, config.tabata_rest);

    match config.generator() {
        Some(generator) => {
            info!("Workout generation enabled via deployment {}", generator.deployment);
            state = state.with_generator(WodGenerator::new(generator));
        }
        None => warn!("Azure OpenAI settings missing, workout generation disabled"),
    }

    let state = Arc::new(state);

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST   /workout                - Load a workout and build its timer");
    info!("  POST   /workout/generate       - Generate a workout and load it");
    info!("  POST   /timer/start            - Start the 10 second countdown");
    info!("  POST   /timer/pause            - Pause the timer");
    info!("  POST   /timer/resume           - Resume the timer");
    info!("  POST   /timer/reset            - Reset the timer");
    info!("  POST   /timer/rounds/add       - Count a round");
    info!("  POST   /timer/rounds/subtract  - Uncount a round");
    info!("  DELETE /timer                  - Unload the workout");
    info!("  GET    /preferences            - Read saved preferences");
    info!("  PUT    /preferences            - Replace saved preferences");
    info!("  GET    /status                 - Workout and timer status");
    info!("  GET    /health                 - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    // Release the timer and its audio device before exiting
    if let Err(e) = state.clear_session().await {
        warn!("Failed to unload workout on shutdown: {}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}
