//! Portfolio API backend.
//!
//! Stateless JWT authentication over a SQLite user store, with role-gated
//! routes. The router is built here so integration tests can drive it
//! without a listening socket.

pub mod api;
pub mod auth;
pub mod config;
pub mod middleware;

use auth::{handlers, AuthState, ADMIN_ONLY};
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

/// Assemble the application router.
///
/// Outer plumbing layers (CORS, rate limiting, security headers, request
/// logging) are applied by the binary, not here.
pub fn build_router(state: AuthState) -> Router {
    let public = Router::new()
        .route("/health", get(api::health_check))
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/portfolio", get(api::portfolio::get_portfolio))
        .with_state(state.clone());

    let protected = Router::new()
        .route("/api/auth/me", get(handlers::me))
        .route_layer(from_fn_with_state(state.clone(), auth::auth_middleware));

    // Layers run outermost-last: authentication resolves the user before
    // the role gate inspects it.
    let admin = Router::new()
        .route("/api/portfolio", post(api::portfolio::update_portfolio))
        .route_layer(from_fn_with_state(ADMIN_ONLY, auth::require_roles))
        .route_layer(from_fn_with_state(state, auth::auth_middleware));

    public.merge(protected).merge(admin)
}
