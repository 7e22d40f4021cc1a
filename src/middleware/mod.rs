//! Request guards and the pipeline that chains them.
//!
//! Each route declares an ordered [`Pipeline`] of [`Guard`]s. A guard receives
//! the [`RequestContext`] by value and either hands it on ([`Flow::Continue`])
//! or gives it up in exchange for an error response ([`Flow::Respond`]), so a
//! guard that answers the request can never also let it through.

pub mod auth;
pub mod fields;
pub mod response;
pub mod validate;

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::header::AUTHORIZATION,
};
use serde_json::{Map, Value};

use crate::auth::Claims;
use crate::error::ApiError;

pub use auth::{Authenticate, RequireRole};
pub use fields::{omit_fields, FilterAllowed, RequireFields};
pub use response::{ApiResponse, ApiResult};
pub use validate::{FieldError, Validate};

/// Typed state threaded through a guard chain
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Parsed JSON object body (empty when the request had none)
    pub body: Map<String, Value>,
    /// Raw `Authorization` header value
    pub authorization: Option<String>,
    /// Identity set by [`Authenticate`]
    pub claims: Option<Claims>,
    /// Sanitized body set by [`FilterAllowed`]
    pub filtered: Option<Map<String, Value>>,
}

impl RequestContext {
    pub fn with_body(body: Map<String, Value>) -> Self {
        Self {
            body,
            ..Default::default()
        }
    }

    pub fn with_authorization(mut self, header: impl Into<String>) -> Self {
        self.authorization = Some(header.into());
        self
    }

    /// The filtered body when a filter ran, the raw body otherwise
    pub fn payload(&self) -> &Map<String, Value> {
        self.filtered.as_ref().unwrap_or(&self.body)
    }
}

#[async_trait]
impl<S> FromRequest<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let authorization = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::MalformedBody(e.body_text()))?;

        let body = if bytes.iter().all(u8::is_ascii_whitespace) {
            Map::new()
        } else {
            match serde_json::from_slice::<Value>(&bytes) {
                Ok(Value::Object(map)) => map,
                Ok(_) => Map::new(),
                Err(e) => return Err(ApiError::MalformedBody(e.to_string())),
            }
        };

        Ok(Self {
            body,
            authorization,
            claims: None,
            filtered: None,
        })
    }
}

/// Outcome of a single guard
#[derive(Debug)]
pub enum Flow {
    Continue(RequestContext),
    Respond(ApiError),
}

/// One step of a request chain
pub trait Guard: Send + Sync {
    fn name(&self) -> &'static str;

    fn check(&self, ctx: RequestContext) -> Flow;
}

/// Ordered guard chain bound to one route
#[derive(Default)]
pub struct Pipeline {
    guards: Vec<Box<dyn Guard>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, guard: impl Guard + 'static) -> Self {
        self.guards.push(Box::new(guard));
        self
    }

    /// Run every guard in declared order, stopping at the first response
    pub fn run(&self, mut ctx: RequestContext) -> Result<RequestContext, ApiError> {
        for guard in &self.guards {
            match guard.check(ctx) {
                Flow::Continue(next) => ctx = next,
                Flow::Respond(err) => {
                    tracing::debug!("Guard '{}' halted request: {}", guard.name(), err.error_code());
                    return Err(err);
                }
            }
        }
        Ok(ctx)
    }
}
