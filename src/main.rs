use clap::Parser;
use eyre::{Result, WrapErr};
use home_dash::{
    config::Config,
    http::{create_router, AppState},
};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(e) if e.not_found() => {}
        Err(e) => return Err(e).wrap_err("Error loading .env file"),
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate().wrap_err("Invalid configuration")?;

    info!("Starting home-dash v{}", env!("CARGO_PKG_VERSION"));
    info!("Dashboard input dir: {}", config.dashboard_input_dir.display());
    info!("Messages file: {}", config.messages_path().display());
    info!("Cache TTL: {}s", config.cache_ttl_secs);

    let app = create_router(AppState::from_config(&config));

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .wrap_err_with(|| format!("Failed to bind {}", config.listen_addr))?;
    info!("Listening on {}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("Server error")?;

    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
