//! `description`: a non-empty string on create and update.

use std::sync::Arc;

use futures::future::ready;
use serde_json::Value;

use crate::failure::Rejection;
use crate::field::FieldValidator;
use crate::request::{RequestKind, ValidationRequest};

pub const FIELD: &str = "description";

/// Validator for the description field.
#[must_use]
pub fn description_validator() -> FieldValidator {
    FieldValidator::new(FIELD).on_each(
        &[RequestKind::Create, RequestKind::Update],
        |request: Arc<ValidationRequest>| ready(check(request.field(FIELD))),
    )
}

fn check(description: Option<&Value>) -> Result<(), Rejection> {
    match description {
        None => Err(Rejection::invalid("description not available")),
        Some(Value::String(text)) if !text.is_empty() => Ok(()),
        Some(_) => Err(Rejection::invalid("description must be non-empty string.")),
    }
}
