use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use session::{AuthConfig, GoogleProvider, HttpAuthBackend};
use tracing_subscriber::EnvFilter;

mod auth;
mod error;
mod proxy;
mod registry;
mod routes;
mod state;
#[cfg(test)]
mod test_support;

use state::AppState;

#[derive(Parser)]
#[command(name = "gateway")]
#[command(about = "Session gateway: sign-in, session cookies, route guard and authenticated backend calls")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:3000", env = "GATEWAY_LISTEN")]
    listen: SocketAddr,

    /// Directory with the built frontend; pages are served from here after the route guard
    #[arg(long, default_value = "frontend/dist", env = "FRONTEND_DIR")]
    frontend_dir: String,

    /// Comma-separated list of allowed CORS origins
    #[arg(long, env = "CORS_ALLOWED_ORIGINS")]
    cors_origins: Option<String>,

    /// Evict session managers unused for this many seconds
    #[arg(long, default_value_t = 1800, env = "SESSION_IDLE_SECS")]
    session_idle_secs: u64,

    /// Seconds between session eviction sweeps
    #[arg(long, default_value_t = 60, env = "SESSION_SWEEP_INTERVAL_SECS", value_parser = clap::value_parser!(u64).range(1..))]
    sweep_interval_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = AuthConfig::from_env().context("Failed to load auth configuration")?;

    let backend = HttpAuthBackend::new(config.backend_url.clone(), config.backend_timeout())
        .context("Failed to build backend client")?;
    let http = reqwest::Client::builder()
        .timeout(config.backend_timeout())
        .build()
        .context("Failed to build HTTP client")?;
    let google = config
        .google
        .clone()
        .map(|google| GoogleProvider::new(google, http.clone()));

    tracing::info!(
        "Auth backend at {}, allowed domain {}",
        backend.base_url(),
        config.allowed_domain
    );

    let state = AppState::new(config, Arc::new(backend), google, http);

    let registry = state.registry.clone();
    let idle_ttl = Duration::from_secs(args.session_idle_secs);
    let sweep_interval = Duration::from_secs(args.sweep_interval_secs);
    tokio::spawn(async move {
        registry::start_sweep_task(registry, idle_ttl, sweep_interval).await;
    });

    let app = routes::build_router(
        state,
        Some(&args.frontend_dir),
        routes::build_cors_layer(args.cors_origins.as_deref()),
    );

    tracing::info!("Server listening on {}", args.listen);

    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
