use schsvg_service::{build_router, config::Config, state::AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    tracing::info!("Starting schematic render service...");

    // Load configuration
    let config = Config::load()?;
    tracing::info!("Configuration loaded");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let max_renders = config.render.max_concurrent_renders;

    // Create application state
    let app_state = AppState::new(config)?;

    // Build router
    let app = build_router(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Listening on {} ({} concurrent renders)", addr, max_renders);
    tracing::info!("Endpoints:");
    tracing::info!("  - GET /render?url=<schematic url>");
    tracing::info!("  - GET /github/<owner>/<repo>/blob/<ref>/<path>.sch");
    tracing::info!("  - GET /health");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,schsvg_service=debug,schsvg_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
