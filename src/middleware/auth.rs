use crate::auth::{Role, TokenService};
use crate::error::ApiError;

use super::{Flow, Guard, RequestContext};

/// Requires `Authorization: Bearer <token>` and attaches the verified claims
#[derive(Clone)]
pub struct Authenticate {
    tokens: TokenService,
}

impl Authenticate {
    pub fn new(tokens: TokenService) -> Self {
        Self { tokens }
    }
}

impl Guard for Authenticate {
    fn name(&self) -> &'static str {
        "authenticate"
    }

    fn check(&self, mut ctx: RequestContext) -> Flow {
        let Some(header) = ctx.authorization.as_deref() else {
            return Flow::Respond(ApiError::unauthenticated(
                "Authorization header with a valid token is required",
            ));
        };

        let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();

        match self.tokens.verify(token) {
            Ok(claims) => {
                tracing::debug!("Authenticated {} ({})", claims.email, claims.role);
                ctx.claims = Some(claims);
                Flow::Continue(ctx)
            }
            Err(e) => {
                tracing::warn!("Token rejected: {}", e);
                Flow::Respond(e.into())
            }
        }
    }
}

/// Requires the authenticated identity to hold one of the allowed roles.
///
/// Must run after [`Authenticate`]; a missing identity is a wiring fault and
/// answers 500.
#[derive(Clone, Debug)]
pub struct RequireRole {
    allowed: Vec<Role>,
}

impl RequireRole {
    pub fn new(allowed: impl IntoIterator<Item = Role>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }

    pub fn admin() -> Self {
        Self::new([Role::Admin])
    }
}

impl Guard for RequireRole {
    fn name(&self) -> &'static str {
        "require_role"
    }

    fn check(&self, ctx: RequestContext) -> Flow {
        let Some(claims) = ctx.claims.as_ref() else {
            tracing::error!("Role check reached without an authenticated identity");
            return Flow::Respond(ApiError::internal(
                "No authenticated identity available for role check",
            ));
        };

        if self.allowed.contains(&claims.role) {
            Flow::Continue(ctx)
        } else {
            tracing::warn!("{} with role {} denied", claims.email, claims.role);
            Flow::Respond(ApiError::Forbidden)
        }
    }
}
