pub mod giftcards;
pub mod users;
pub mod utils;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::app::AppContext;
use crate::error::ApiError;

/// GET /health - liveness plus a store ping
pub async fn health(State(app): State<AppContext>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match app.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "OK",
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "ERR",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database": "unavailable"
                    }
                })),
            )
        }
    }
}

/// Catch-all for unmatched routes and methods
pub async fn not_found() -> ApiError {
    ApiError::not_found("endpoint not found")
}
