use serde_json::{Map, Value};

use crate::error::ApiError;

use super::{Flow, Guard, RequestContext};

/// Rejects the request when any named field is absent, null, or a blank string
#[derive(Clone, Debug)]
pub struct RequireFields {
    names: Vec<&'static str>,
}

impl RequireFields {
    pub fn new(names: &[&'static str]) -> Self {
        Self {
            names: names.to_vec(),
        }
    }
}

impl Guard for RequireFields {
    fn name(&self) -> &'static str {
        "require_fields"
    }

    fn check(&self, ctx: RequestContext) -> Flow {
        let missing = self.names.iter().find(|name| match ctx.body.get(**name) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(_) => false,
        });

        match missing {
            Some(name) => Flow::Respond(ApiError::missing_field(*name)),
            None => Flow::Continue(ctx),
        }
    }
}

/// Copies only the listed keys into the context's filtered body.
/// Unlisted keys are dropped silently.
#[derive(Clone, Debug)]
pub struct FilterAllowed {
    names: Vec<&'static str>,
}

impl FilterAllowed {
    pub fn new(names: &[&'static str]) -> Self {
        Self {
            names: names.to_vec(),
        }
    }

    pub fn apply(&self, body: &Map<String, Value>) -> Map<String, Value> {
        body.iter()
            .filter(|(key, _)| self.names.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

impl Guard for FilterAllowed {
    fn name(&self) -> &'static str {
        "filter_allowed"
    }

    fn check(&self, mut ctx: RequestContext) -> Flow {
        ctx.filtered = Some(self.apply(&ctx.body));
        Flow::Continue(ctx)
    }
}

/// Shallow copy of `record` without the named keys
pub fn omit_fields(record: &Map<String, Value>, names: &[&str]) -> Map<String, Value> {
    let mut copy = record.clone();
    for name in names {
        copy.remove(*name);
    }
    copy
}
