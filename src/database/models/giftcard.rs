use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use uuid::Uuid;

use super::{text_field, FieldErrors};
use crate::middleware::FieldError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct GiftCard {
    pub id: Uuid,
    pub title: String,
    pub price: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGiftCard {
    pub title: String,
    pub price: String,
    pub image: Option<String>,
}

impl NewGiftCard {
    /// Build from a body that already passed the required-field and rule checks
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self, Vec<FieldError>> {
        let mut errors = FieldErrors::default();
        let title = errors.take(text_field(payload, "title"));
        let price = errors.take(text_field(payload, "price"));
        let image = errors.take(text_field(payload, "image"));

        errors.finish(Self {
            title: title.unwrap_or_default(),
            price: price.unwrap_or_default(),
            image,
        })
    }
}

/// Partial update; `None` leaves the stored value untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GiftCardPatch {
    pub title: Option<String>,
    pub price: Option<String>,
    pub image: Option<String>,
}

impl GiftCardPatch {
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self, Vec<FieldError>> {
        let mut errors = FieldErrors::default();
        let patch = Self {
            title: errors.take(text_field(payload, "title")),
            price: errors.take(text_field(payload, "price")),
            image: errors.take(text_field(payload, "image")),
        };
        errors.finish(patch)
    }

    pub fn apply(self, card: &mut GiftCard) {
        if let Some(title) = self.title {
            card.title = title;
        }
        if let Some(price) = self.price {
            card.price = price;
        }
        if let Some(image) = self.image {
            card.image = Some(image);
        }
    }
}
