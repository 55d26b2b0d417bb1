//! Portfolio Endpoints
//! Mission: Serve the portfolio payload; writes are admin-gated

use axum::{http::StatusCode, Json};
use serde_json::{json, Value};

/// GET /api/portfolio (public)
///
/// Placeholder payload; the real data source is an external collaborator.
pub async fn get_portfolio() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Portfolio Owner",
            "title": "Full Stack Developer",
            "skills": ["Rust", "Axum", "SQLite", "TypeScript"],
            "projects": [
                {
                    "id": 1,
                    "title": "Portfolio Website",
                    "description": "Personal portfolio website with an authenticated API backend",
                    "technologies": ["Rust", "Axum", "SQLite"]
                }
            ]
        }
    }))
}

/// POST /api/portfolio (admin only; authentication and role gate are
/// applied as route layers)
pub async fn update_portfolio(Json(payload): Json<Value>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": payload,
        })),
    )
}
