//! CORS configuration.

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use tower_http::cors::CorsLayer;

/// Build the CORS layer. With a configured client origin the layer is
/// scoped to that origin and allows credentials; without one it stays
/// permissive. Credentialed CORS cannot use wildcards, so the scoped
/// branch spells out methods and headers.
pub fn cors_layer(client_url: Option<&str>) -> Result<CorsLayer> {
    let layer = match client_url {
        Some(origin) => {
            let origin: HeaderValue = origin
                .parse()
                .context("CLIENT_URL is not a valid origin")?;
            CorsLayer::new()
                .allow_origin(origin)
                .allow_credentials(true)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        }
        None => CorsLayer::permissive(),
    };
    Ok(layer)
}
