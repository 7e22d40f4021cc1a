pub mod giftcard;
pub mod user;

pub use giftcard::{GiftCard, GiftCardPatch, NewGiftCard};
pub use user::{NewUser, User, UserPatch};

use serde_json::{Map, Value};

use crate::middleware::FieldError;

/// Optional text field. Numbers are accepted and kept in their textual form.
pub(crate) fn text_field(
    payload: &Map<String, Value>,
    name: &str,
) -> Result<Option<String>, FieldError> {
    match payload.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(FieldError::new(name, format!("{} must be a string", name))),
    }
}

/// Collects field conversion failures so they can be reported together
#[derive(Default)]
pub(crate) struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn take<T>(&mut self, result: Result<Option<T>, FieldError>) -> Option<T> {
        match result {
            Ok(value) => value,
            Err(e) => {
                self.0.push(e);
                None
            }
        }
    }

    pub fn finish<T>(self, value: T) -> Result<T, Vec<FieldError>> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(self.0)
        }
    }
}
