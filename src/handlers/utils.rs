use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::FieldError;

/// Parse a path identifier before it reaches the store
pub fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::invalid_id(raw))
}

pub fn invalid_fields(errors: Vec<FieldError>) -> ApiError {
    ApiError::ValidationFailed(errors)
}

/// Run CPU-bound work (bcrypt) off the async workers
pub async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        tracing::error!("Blocking task failed: {}", e);
        ApiError::internal("Internal task failed")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
        assert!(matches!(parse_id("not-an-id"), Err(ApiError::InvalidId(raw)) if raw == "not-an-id"));
    }
}
