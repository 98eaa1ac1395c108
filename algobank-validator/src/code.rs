//! `algorithm` and `privacyAlgorithm`: the submitted code blocks.
//!
//! Each block is checked as a whole and every problem in it is reported,
//! not only the first. The checks never execute the submitted code: the
//! payload is decoded, comments are stripped, and the remaining text is
//! matched against the block's [`CodePolicy`].

use std::sync::Arc;

use futures::future::ready;
use serde_json::{Map, Value};

use algobank_core::{CodePolicy, ReducerKind, SourceScanner, TransportCodec};

use crate::failure::Rejection;
use crate::field::FieldValidator;
use crate::key::AccessKey;
use crate::request::{RequestKind, ValidationRequest};

pub const MAIN_FIELD: &str = "algorithm";
pub const PRIVACY_FIELD: &str = "privacyAlgorithm";

/// Shared pieces both code validators use.
#[derive(Clone)]
pub struct CodeChecker {
    scanner: Arc<dyn SourceScanner>,
    codec: Arc<dyn TransportCodec>,
}

impl CodeChecker {
    pub fn new(scanner: Arc<dyn SourceScanner>, codec: Arc<dyn TransportCodec>) -> Self {
        Self { scanner, codec }
    }

    /// Pushes a reason for every problem with `className` or `code`.
    fn check_source(&self, block: &Map<String, Value>, policy: &CodePolicy, reasons: &mut Vec<String>) {
        let class_name = match string_member(block, "className") {
            Ok(name) => Some(name),
            Err(reason) => {
                reasons.push(reason);
                None
            }
        };
        let code = match string_member(block, "code") {
            Ok(code) => code,
            Err(reason) => {
                reasons.push(reason);
                return;
            }
        };
        let source = match self.codec.decode(code) {
            Ok(source) => source,
            Err(e) => {
                reasons.push(format!("code could not be decoded: {e}"));
                return;
            }
        };
        // Without a class name the library checks still run.
        let outcome = match class_name {
            Some(class_name) => self.scanner.analyze(&source, policy, class_name),
            None => {
                let stripped = self.scanner.strip_comments(&source);
                self.scanner.check_libraries(
                    &stripped,
                    &policy.forbidden_libraries,
                    &policy.required_libraries,
                )
            }
        };
        if let Err(violations) = outcome {
            reasons.extend(violations.iter().map(ToString::to_string));
        }
    }
}

/// Validator for the main algorithm block.
#[must_use]
pub fn main_code_validator(checker: CodeChecker, policy: CodePolicy) -> FieldValidator {
    FieldValidator::new(MAIN_FIELD).on_each(
        &[RequestKind::Create, RequestKind::Update],
        move |request: Arc<ValidationRequest>| {
            ready(check_main(&checker, &policy, request.field(MAIN_FIELD)))
        },
    )
}

/// Validator for the optional privacy block.
#[must_use]
pub fn privacy_code_validator(
    checker: CodeChecker,
    policy: CodePolicy,
    access_key: AccessKey,
) -> FieldValidator {
    FieldValidator::new(PRIVACY_FIELD).on_each(
        &[RequestKind::Create, RequestKind::Update],
        move |request: Arc<ValidationRequest>| {
            ready(check_privacy(
                &checker,
                &policy,
                &access_key,
                request.field(PRIVACY_FIELD),
            ))
        },
    )
}

fn check_main(
    checker: &CodeChecker,
    policy: &CodePolicy,
    block: Option<&Value>,
) -> Result<(), Rejection> {
    let block = block_object(MAIN_FIELD, block)?;
    let mut reasons = Vec::new();
    checker.check_source(block, policy, &mut reasons);
    match block.get("reducer").filter(|v| !v.is_null()) {
        None => reasons.push("reducer not available".to_owned()),
        Some(Value::String(r)) if r.parse::<ReducerKind>().is_ok() => {}
        Some(_) => reasons.push(format!(
            "reducer must be from {}",
            ReducerKind::ALL.map(ReducerKind::as_str).join(",")
        )),
    }
    Rejection::invalid_if_any(reasons)
}

fn check_privacy(
    checker: &CodeChecker,
    policy: &CodePolicy,
    access_key: &AccessKey,
    block: Option<&Value>,
) -> Result<(), Rejection> {
    if block.is_none() {
        return Ok(());
    }
    let block = block_object(PRIVACY_FIELD, block)?;
    let mut reasons = Vec::new();
    match string_member(block, "key") {
        Ok(key) if access_key.matches(key) => {}
        Ok(_) => reasons.push("key does not match".to_owned()),
        Err(reason) => reasons.push(reason),
    }
    checker.check_source(block, policy, &mut reasons);
    Rejection::invalid_if_any(reasons)
}

fn block_object<'a>(
    field: &str,
    block: Option<&'a Value>,
) -> Result<&'a Map<String, Value>, Rejection> {
    match block {
        None => Err(Rejection::invalid(format!("{field} not available"))),
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err(Rejection::invalid(format!("{field} must be an object"))),
    }
}

fn string_member<'a>(block: &'a Map<String, Value>, member: &str) -> Result<&'a str, String> {
    match block.get(member) {
        None | Some(Value::Null) => Err(format!("{member} not available")),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(format!("{member} must be a string")),
    }
}
