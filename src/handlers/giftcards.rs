// handlers/giftcards.rs - /api/giftcards
//
// Reads are public. Writes run authenticate -> require admin before the
// required-field and rule checks. Only malformed JSON is rejected earlier,
// while the body is extracted.

use axum::{
    extract::{Path, State},
    routing::{get, put},
    Router,
};

use super::not_found;
use super::utils::{invalid_fields, parse_id};
use crate::app::AppContext;
use crate::database::models::{GiftCard, GiftCardPatch, NewGiftCard};
use crate::error::ApiError;
use crate::middleware::{
    ApiResponse, ApiResult, Authenticate, FilterAllowed, Pipeline, RequestContext, RequireFields,
    RequireRole, Validate,
};

const UPDATABLE_FIELDS: &[&str] = &["title", "price", "image"];

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/", get(list).post(create).fallback(not_found))
        .route("/one/:id", get(one).fallback(not_found))
        .route("/:id", put(update).delete(remove).fallback(not_found))
}

fn admin(app: &AppContext) -> Pipeline {
    Pipeline::new()
        .then(Authenticate::new(app.tokens.clone()))
        .then(RequireRole::admin())
}

fn missing(id: &str) -> ApiError {
    ApiError::not_found(format!("No gift card exists with ID {}", id))
}

/// GET /api/giftcards
pub async fn list(State(app): State<AppContext>) -> ApiResult<Vec<GiftCard>> {
    Ok(ApiResponse::success(app.store.list_giftcards().await?))
}

/// GET /api/giftcards/one/:id
pub async fn one(State(app): State<AppContext>, Path(id): Path<String>) -> ApiResult<GiftCard> {
    let card_id = parse_id(&id)?;

    match app.store.find_giftcard(card_id).await? {
        Some(card) => Ok(ApiResponse::success(card)),
        None => Err(missing(&id)),
    }
}

/// POST /api/giftcards (admin)
pub async fn create(State(app): State<AppContext>, ctx: RequestContext) -> ApiResult<GiftCard> {
    let ctx = admin(&app)
        .then(RequireFields::new(&["title", "price"]))
        .then(Validate::giftcard_create())
        .run(ctx)?;

    let card = NewGiftCard::from_payload(&ctx.body).map_err(invalid_fields)?;
    let created = app.store.create_giftcard(card).await?;

    tracing::info!("Gift card {} created", created.id);
    Ok(ApiResponse::success(created))
}

/// PUT /api/giftcards/:id (admin) - only title, price and image are written
pub async fn update(
    State(app): State<AppContext>,
    Path(id): Path<String>,
    ctx: RequestContext,
) -> ApiResult<GiftCard> {
    let ctx = admin(&app)
        .then(FilterAllowed::new(UPDATABLE_FIELDS))
        .run(ctx)?;

    let card_id = parse_id(&id)?;
    let patch = GiftCardPatch::from_payload(ctx.payload()).map_err(invalid_fields)?;

    match app.store.update_giftcard(card_id, patch).await? {
        Some(card) => Ok(ApiResponse::success(card)),
        None => Err(missing(&id)),
    }
}

/// DELETE /api/giftcards/:id (admin)
pub async fn remove(
    State(app): State<AppContext>,
    Path(id): Path<String>,
    ctx: RequestContext,
) -> ApiResult<GiftCard> {
    admin(&app).run(ctx)?;

    let card_id = parse_id(&id)?;
    match app.store.delete_giftcard(card_id).await? {
        Some(card) => {
            tracing::info!("Gift card {} deleted", card.id);
            Ok(ApiResponse::success(card))
        }
        None => Err(missing(&id)),
    }
}
