//! API Endpoints

pub mod portfolio;

/// Health check endpoint.
pub async fn health_check() -> &'static str {
    "API Running"
}
