use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::database::{self, Store, StoreError};
use crate::handlers;

/// Everything a handler may touch, built once at startup and shared by clone
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub tokens: TokenService,
    pub store: Arc<dyn Store>,
}

impl AppContext {
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Self {
        let tokens = TokenService::new(&config.security.token_secret, config.security.token_ttl_secs);
        Self {
            config: Arc::new(config),
            tokens,
            store,
        }
    }

    /// Connect the configured store and assemble the context
    pub async fn connect(config: AppConfig) -> Result<Self, StoreError> {
        let store = database::connect(&config.database).await?;
        Ok(Self::new(config, store))
    }
}

pub fn app(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/giftcards", handlers::giftcards::routes())
        .nest("/api/users", handlers::users::routes())
        .fallback(handlers::not_found)
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    fn router() -> Router {
        app(AppContext::new(AppConfig::for_memory("router-secret"), Arc::new(MemoryStore::new())))
    }

    async fn send(method: &str, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_unknown_path_is_enveloped_404() {
        let (status, body) = send("GET", "/nowhere").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "ERR");
        assert_eq!(body["data"], "endpoint not found");
    }

    #[tokio::test]
    async fn test_unsupported_method_is_enveloped_404() {
        let (status, body) = send("PATCH", "/api/users/login").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["data"], "endpoint not found");
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send("GET", "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "OK");
    }

    #[tokio::test]
    async fn test_admin_write_without_token_is_401() {
        let (status, body) = send("DELETE", "/api/giftcards/abc").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["status"], "ERR");
    }
}
