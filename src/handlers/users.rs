// handlers/users.rs - /api/users
//
// Every user payload leaves through User::public_view, so the password
// digest is never serialized to a client.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::not_found;
use super::utils::{blocking, invalid_fields, parse_id};
use crate::app::AppContext;
use crate::auth::{hash_password, verify_password, Claims};
use crate::database::models::{NewUser, User, UserPatch};
use crate::database::Page;
use crate::error::ApiError;
use crate::middleware::{
    ApiResponse, ApiResult, Authenticate, FieldError, FilterAllowed, Pipeline, RequestContext,
    RequireFields, RequireRole, Validate,
};

const UPDATABLE_FIELDS: &[&str] = &["name", "email", "avatar", "role", "cart"];

/// Largest offset or limit the store can bind as a signed 64-bit value
const MAX_PAGE_PARAM: u64 = i64::MAX as u64;

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/", get(list).post(register).fallback(not_found))
        .route("/paginated", get(paginated).fallback(not_found))
        .route("/one/:id", get(one).fallback(not_found))
        .route("/protected", get(protected).fallback(not_found))
        .route("/protected_adm", get(protected_admin).fallback(not_found))
        .route("/login", post(login).fallback(not_found))
        .route("/:id", put(update).delete(remove).fallback(not_found))
}

fn authenticated(app: &AppContext) -> Pipeline {
    Pipeline::new().then(Authenticate::new(app.tokens.clone()))
}

fn admin(app: &AppContext) -> Pipeline {
    authenticated(app).then(RequireRole::admin())
}

fn missing(id: &str) -> ApiError {
    ApiError::not_found(format!("No user exists with ID {}", id))
}

/// GET /api/users
pub async fn list(State(app): State<AppContext>) -> ApiResult<Vec<Value>> {
    let users = app.store.list_users().await?;
    Ok(ApiResponse::success(users.iter().map(User::public_view).collect()))
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub offset: Option<String>,
    pub limit: Option<String>,
}

impl PageQuery {
    /// Resolve offset and limit, reporting every malformed parameter at once
    fn resolve(&self, default_limit: u64) -> Result<(u64, u64), Vec<FieldError>> {
        let mut errors = Vec::new();

        let offset = match self.offset.as_deref().map(str::parse::<u64>) {
            None => 0,
            Some(Ok(offset)) if offset <= MAX_PAGE_PARAM => offset,
            Some(_) => {
                errors.push(FieldError::new("offset", "offset must be a non-negative 64-bit integer"));
                0
            }
        };

        let limit = match self.limit.as_deref().map(str::parse::<u64>) {
            None => default_limit,
            Some(Ok(limit)) if limit > 0 && limit <= MAX_PAGE_PARAM => limit,
            Some(_) => {
                errors.push(FieldError::new("limit", "limit must be a positive integer"));
                default_limit
            }
        };

        if errors.is_empty() {
            Ok((offset, limit))
        } else {
            Err(errors)
        }
    }
}

/// GET /api/users/paginated?offset=&limit=
pub async fn paginated(
    State(app): State<AppContext>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Page<Value>> {
    let default_limit = u64::from(app.config.api.default_page_limit);
    let (offset, limit) = query.resolve(default_limit).map_err(invalid_fields)?;

    let page = app.store.page_users(offset, limit).await?;
    Ok(ApiResponse::success(page.map(|u| u.public_view())))
}

/// GET /api/users/one/:id
pub async fn one(State(app): State<AppContext>, Path(id): Path<String>) -> ApiResult<Value> {
    let user_id = parse_id(&id)?;

    match app.store.find_user(user_id).await? {
        Some(user) => Ok(ApiResponse::success(user.public_view())),
        None => Err(missing(&id)),
    }
}

fn identity(claims: Option<&Claims>) -> Value {
    match claims {
        Some(c) => json!({ "name": c.name, "email": c.email, "role": c.role }),
        None => Value::Null,
    }
}

/// GET /api/users/protected (any authenticated user)
pub async fn protected(State(app): State<AppContext>, ctx: RequestContext) -> ApiResult<Value> {
    let ctx = authenticated(&app).run(ctx)?;

    Ok(ApiResponse::success(json!({
        "message": "Protected resource reached",
        "user": identity(ctx.claims.as_ref()),
    })))
}

/// GET /api/users/protected_adm (admin)
pub async fn protected_admin(State(app): State<AppContext>, ctx: RequestContext) -> ApiResult<Value> {
    let ctx = admin(&app).run(ctx)?;

    Ok(ApiResponse::success(json!({
        "message": "Admin resource reached",
        "user": identity(ctx.claims.as_ref()),
    })))
}

/// Text of a field already checked by RequireFields and Validate
fn required_text(body: &serde_json::Map<String, Value>, name: &str) -> String {
    match body.get(name) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// POST /api/users - register
pub async fn register(State(app): State<AppContext>, ctx: RequestContext) -> ApiResult<Value> {
    let ctx = Pipeline::new()
        .then(RequireFields::new(&["name", "email", "password"]))
        .then(Validate::user_register())
        .run(ctx)?;

    let name = required_text(&ctx.body, "name");
    let email = required_text(&ctx.body, "email");
    let password = required_text(&ctx.body, "password");
    let avatar = match ctx.body.get("avatar") {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    };

    // Fast path; the store's unique constraint is the authoritative check
    if app.store.find_user_by_email(&email).await?.is_some() {
        return Err(ApiError::AlreadyRegistered(email));
    }

    let digest = blocking(move || hash_password(&password)).await??;
    let user = app
        .store
        .create_user(NewUser::new(name, email, digest).with_avatar(avatar))
        .await?;

    tracing::info!("User {} registered", user.id);
    Ok(ApiResponse::success(user.public_view()))
}

/// POST /api/users/login - verify credentials and issue a session token
pub async fn login(State(app): State<AppContext>, ctx: RequestContext) -> ApiResult<Value> {
    let ctx = Pipeline::new()
        .then(RequireFields::new(&["email", "password"]))
        .then(Validate::user_login())
        .run(ctx)?;

    let email = required_text(&ctx.body, "email");
    let password = required_text(&ctx.body, "password");

    let Some(user) = app.store.find_user_by_email(&email).await? else {
        tracing::warn!("Login attempt for unknown email {}", email);
        return Err(ApiError::InvalidCredentials);
    };

    let digest = user.password.clone();
    if !blocking(move || verify_password(&password, &digest)).await? {
        tracing::warn!("Login attempt with wrong password for {}", email);
        return Err(ApiError::InvalidCredentials);
    }

    let token = app.tokens.issue(&user.name, &user.email, user.role)?;

    let mut data = user.public_view();
    if let Value::Object(map) = &mut data {
        map.insert("token".to_string(), Value::String(token));
    }

    tracing::info!("User {} logged in", user.id);
    Ok(ApiResponse::success(data))
}

/// PUT /api/users/:id (admin) - password is not among the writable fields
pub async fn update(
    State(app): State<AppContext>,
    Path(id): Path<String>,
    ctx: RequestContext,
) -> ApiResult<Value> {
    let ctx = admin(&app)
        .then(FilterAllowed::new(UPDATABLE_FIELDS))
        .run(ctx)?;

    let user_id = parse_id(&id)?;
    let patch = UserPatch::from_payload(ctx.payload()).map_err(invalid_fields)?;

    match app.store.update_user(user_id, patch).await? {
        Some(user) => Ok(ApiResponse::success(user.public_view())),
        None => Err(missing(&id)),
    }
}

/// DELETE /api/users/:id (admin)
pub async fn remove(
    State(app): State<AppContext>,
    Path(id): Path<String>,
    ctx: RequestContext,
) -> ApiResult<Value> {
    admin(&app).run(ctx)?;

    let user_id = parse_id(&id)?;
    match app.store.delete_user(user_id).await? {
        Some(user) => {
            tracing::info!("User {} deleted", user.id);
            Ok(ApiResponse::success(user.public_view()))
        }
        None => Err(missing(&id)),
    }
}
