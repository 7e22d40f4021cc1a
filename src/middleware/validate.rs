use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiError;

use super::{Flow, Guard, RequestContext};

static NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?([0-9]*\.)?[0-9]+$").expect("numeric pattern"));

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*\.[A-Za-z]{2,}$",
    )
    .expect("email pattern")
});

const MAX_EMAIL_LEN: usize = 254;

/// One failed rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Check {
    /// Character count within `[min, max]`
    Length { min: usize, max: usize },
    Numeric,
    Email,
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub field: &'static str,
    pub check: Check,
    pub message: &'static str,
}

impl Rule {
    pub fn length(field: &'static str, min: usize, max: usize, message: &'static str) -> Self {
        Self { field, check: Check::Length { min, max }, message }
    }

    pub fn numeric(field: &'static str, message: &'static str) -> Self {
        Self { field, check: Check::Numeric, message }
    }

    pub fn email(field: &'static str, message: &'static str) -> Self {
        Self { field, check: Check::Email, message }
    }

    pub fn passes(&self, body: &Map<String, Value>) -> bool {
        let text = field_text(body.get(self.field));

        match self.check {
            Check::Length { min, max } => {
                let len = text.chars().count();
                len >= min && len <= max
            }
            Check::Numeric => NUMERIC.is_match(&text),
            Check::Email => text.len() <= MAX_EMAIL_LEN && EMAIL.is_match(&text),
        }
    }
}

/// Field value as the text the rules inspect. Absent and null read as empty.
fn field_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Evaluates every rule and fails with the full error list when any rule
/// fails. Unlike the other guards it never stops at the first failure.
#[derive(Debug, Clone)]
pub struct Validate {
    rules: Vec<Rule>,
}

impl Validate {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn giftcard_create() -> Self {
        Self::new(vec![
            Rule::length("title", 2, 32, "Title must be between 2 and 32 characters"),
            Rule::numeric("price", "Price must be numeric"),
        ])
    }

    pub fn user_register() -> Self {
        Self::new(vec![
            Rule::length("name", 2, 32, "Name must be between 2 and 32 characters"),
            Rule::email("email", "Email must be a valid address"),
            Rule::length("password", 6, 12, "Password must be between 6 and 12 characters"),
        ])
    }

    pub fn user_login() -> Self {
        Self::new(vec![
            Rule::email("email", "Email must be a valid address"),
            Rule::length("password", 6, 12, "Password must be between 6 and 12 characters"),
        ])
    }

    pub fn errors(&self, body: &Map<String, Value>) -> Vec<FieldError> {
        self.rules
            .iter()
            .filter(|rule| !rule.passes(body))
            .map(|rule| FieldError::new(rule.field, rule.message))
            .collect()
    }
}

impl Guard for Validate {
    fn name(&self) -> &'static str {
        "validate"
    }

    fn check(&self, ctx: RequestContext) -> Flow {
        let errors = self.errors(&ctx.body);
        if errors.is_empty() {
            Flow::Continue(ctx)
        } else {
            Flow::Respond(ApiError::ValidationFailed(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_title_length_bounds() {
        let v = Validate::giftcard_create();
        assert_eq!(v.errors(&body(json!({ "title": "A", "price": "10" }))).len(), 1);
        assert!(v.errors(&body(json!({ "title": "Ab", "price": "10" }))).is_empty());
        assert!(v.errors(&body(json!({ "title": "x".repeat(32), "price": "10" }))).is_empty());
        assert_eq!(v.errors(&body(json!({ "title": "x".repeat(33), "price": "10" }))).len(), 1);
    }

    #[test]
    fn test_length_counts_characters() {
        let rule = Rule::length("name", 2, 3, "");
        assert!(rule.passes(&body(json!({ "name": "ñé" }))));
        assert!(!rule.passes(&body(json!({ "name": "ñéüö" }))));
    }

    #[test]
    fn test_numeric_price() {
        let rule = Rule::numeric("price", "");
        for ok in ["10", "10.50", "-3", "+7", ".5"] {
            assert!(rule.passes(&body(json!({ "price": ok }))), "{} should pass", ok);
        }
        for bad in ["", "ten", "1e3", "10.", "1,000", " 10"] {
            assert!(!rule.passes(&body(json!({ "price": bad }))), "{} should fail", bad);
        }
        assert!(rule.passes(&body(json!({ "price": 25 }))));
    }

    #[test]
    fn test_email_syntax() {
        let rule = Rule::email("email", "");
        for ok in ["a@b.com", "first.last+tag@sub.example.org"] {
            assert!(rule.passes(&body(json!({ "email": ok }))), "{} should pass", ok);
        }
        for bad in ["", "plain", "a@b", "@b.com", "a@@b.com", "a b@c.com", "a@-b.com"] {
            assert!(!rule.passes(&body(json!({ "email": bad }))), "{} should fail", bad);
        }
    }

    #[test]
    fn test_all_rules_run() {
        let errors = Validate::user_register().errors(&body(json!({
            "name": "A",
            "email": "nope",
            "password": "123"
        })));

        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "email", "password"]);
    }

    #[test]
    fn test_guard_responds_with_full_list() {
        let ctx = RequestContext::with_body(body(json!({ "title": "", "price": "abc" })));
        match Validate::giftcard_create().check(ctx) {
            Flow::Respond(ApiError::ValidationFailed(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_field_fails_rule() {
        let errors = Validate::user_login().errors(&Map::new());
        assert_eq!(errors.len(), 2);
    }
}
