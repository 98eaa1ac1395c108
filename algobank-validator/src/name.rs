//! `algoName`: slug shape and existence, depending on the request kind.
//!
//! | kind | source | rule |
//! |---|---|---|
//! | create | body | slug, must not exist (conflict) |
//! | update | body | must exist (not found) |
//! | retrieve, delete | path | must exist (not found) |

use std::sync::Arc;

use serde_json::Value;

use algobank_core::AlgoName;
use algobank_store::RecordCollection;

use crate::failure::Rejection;
use crate::field::FieldValidator;
use crate::request::{RequestKind, ValidationRequest};

pub const FIELD: &str = "algoName";

/// Validator for the algorithm name, backed by the record collection.
#[must_use]
pub fn name_validator(records: Arc<dyn RecordCollection>) -> FieldValidator {
    let on_create = records.clone();
    let on_update = records.clone();
    FieldValidator::new(FIELD)
        .on(RequestKind::Create, move |request: Arc<ValidationRequest>| {
            let records = on_create.clone();
            async move {
                let name = body_name(&request)?;
                let name = AlgoName::parse(name).map_err(|_| {
                    Rejection::invalid(
                        "algoName must contain only lower case alphabets, numerals and hyphens.",
                    )
                })?;
                if exists(records.as_ref(), &name).await? {
                    return Err(Rejection::conflict(format!(
                        "algoName `{name}` already exists. Use /update to update the algorithm"
                    )));
                }
                Ok(())
            }
        })
        .on(RequestKind::Update, move |request: Arc<ValidationRequest>| {
            let records = on_update.clone();
            async move {
                let name = body_name(&request)?.to_owned();
                must_exist(records.as_ref(), &name).await
            }
        })
        .on_each(
            &[RequestKind::Retrieve, RequestKind::Delete],
            move |request: Arc<ValidationRequest>| {
                let records = records.clone();
                async move {
                    let Some(name) = request.path_name.as_deref() else {
                        return Err(Rejection::invalid("algoName not available"));
                    };
                    must_exist(records.as_ref(), name).await
                }
            },
        )
}

fn body_name(request: &ValidationRequest) -> Result<&str, Rejection> {
    match request.field(FIELD) {
        None => Err(Rejection::invalid("algoName not available")),
        Some(Value::String(name)) => Ok(name),
        Some(_) => Err(Rejection::invalid("algoName must be a string")),
    }
}

async fn exists(records: &dyn RecordCollection, name: &AlgoName) -> Result<bool, Rejection> {
    records
        .find_max(name)
        .await
        .map(|latest| latest.is_some())
        .map_err(|e| Rejection::internal(format!("error in record lookup: {e}")))
}

/// A name that is not a slug cannot have been stored, so it is simply absent.
async fn must_exist(records: &dyn RecordCollection, raw: &str) -> Result<(), Rejection> {
    let present = match AlgoName::parse(raw) {
        Ok(name) => exists(records, &name).await?,
        Err(_) => false,
    };
    if present {
        Ok(())
    } else {
        Err(Rejection::not_found(format!(
            "algoName `{raw}` does not exist. Use /add to add the algorithm"
        )))
    }
}
