use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::{postgres::PgRow, types::Json, FromRow, Row};
use uuid::Uuid;

use super::{text_field, FieldErrors};
use crate::auth::Role;
use crate::middleware::{omit_fields, FieldError};

/// Keys never sent to a client
pub const PROTECTED_FIELDS: &[&str] = &["password"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// bcrypt digest
    pub password: String,
    pub avatar: Option<String>,
    pub role: Role,
    pub cart: Vec<Value>,
}

impl User {
    /// Outbound representation with protected fields removed
    pub fn public_view(&self) -> Value {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Value::Object(omit_fields(&map, PROTECTED_FIELDS)),
            _ => Value::Null,
        }
    }
}

impl<'r> FromRow<'r, PgRow> for User {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let role: String = row.try_get("role")?;
        let role = role.parse::<Role>().map_err(|e| sqlx::Error::ColumnDecode {
            index: "role".to_string(),
            source: e.into(),
        })?;
        let Json(cart): Json<Vec<Value>> = row.try_get("cart")?;

        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password: row.try_get("password")?,
            avatar: row.try_get("avatar")?,
            role,
            cart,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub avatar: Option<String>,
    pub role: Role,
    pub cart: Vec<Value>,
}

impl NewUser {
    pub fn new(name: impl Into<String>, email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            avatar: None,
            role: Role::User,
            cart: Vec::new(),
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn with_avatar(mut self, avatar: Option<String>) -> Self {
        self.avatar = avatar;
        self
    }
}

/// Partial update; `None` leaves the stored value untouched.
/// The password is deliberately not updatable here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub role: Option<Role>,
    pub cart: Option<Vec<Value>>,
}

impl UserPatch {
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self, Vec<FieldError>> {
        let mut errors = FieldErrors::default();
        let patch = Self {
            name: errors.take(text_field(payload, "name")),
            email: errors.take(text_field(payload, "email")),
            avatar: errors.take(text_field(payload, "avatar")),
            role: errors.take(role_field(payload)),
            cart: errors.take(cart_field(payload)),
        };
        errors.finish(patch)
    }

    pub fn apply(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(avatar) = self.avatar {
            user.avatar = Some(avatar);
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(cart) = self.cart {
            user.cart = cart;
        }
    }
}

fn role_field(payload: &Map<String, Value>) -> Result<Option<Role>, FieldError> {
    match payload.get("role") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => s
            .parse()
            .map(Some)
            .map_err(|_| FieldError::new("role", "role must be 'user' or 'admin'")),
        Some(_) => Err(FieldError::new("role", "role must be 'user' or 'admin'")),
    }
}

fn cart_field(payload: &Map<String, Value>) -> Result<Option<Vec<Value>>, FieldError> {
    match payload.get("cart") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items.clone())),
        Some(_) => Err(FieldError::new("cart", "cart must be a list")),
    }
}
