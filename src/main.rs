//! Portfolio API backend binary.

use anyhow::{Context, Result};
use axum::middleware::{from_fn, from_fn_with_state};
use portfolio_backend::auth::{AuthState, JwtHandler, SqliteUserStore};
use portfolio_backend::config::Config;
use portfolio_backend::middleware::{
    cors_layer, rate_limit, request_logging, security_headers, RateLimiter,
};
use portfolio_backend::build_router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::{net::TcpListener, time::interval};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::from_env()?;

    let store = Arc::new(
        SqliteUserStore::new(&config.auth_db_path).context("Failed to open user store")?,
    );
    let jwt = Arc::new(JwtHandler::new(&config.jwt_secret, config.jwt_ttl_secs));
    let state = AuthState::new(store, jwt, config.bcrypt_cost);

    let limiter = RateLimiter::default();
    spawn_limiter_sweep(limiter.clone());

    let cors = cors_layer(config.client_url.as_deref())?;

    let app = build_router(state)
        .layer(from_fn(request_logging))
        .layer(from_fn_with_state(limiter, rate_limit))
        .layer(from_fn(security_headers))
        .layer(cors);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("API server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portfolio_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Keep the limiter's per-IP map from growing unbounded.
fn spawn_limiter_sweep(limiter: RateLimiter) {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(15 * 60));
        loop {
            ticker.tick().await;
            limiter.sweep();
        }
    });
}
