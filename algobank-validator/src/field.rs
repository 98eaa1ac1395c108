//! Field validators tagged with the request kinds they handle.
//!
//! A validator is a field name plus a table from [`RequestKind`] to a check.
//! Kinds missing from the table simply do not involve the field.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::failure::{FieldFailure, Rejection};
use crate::request::{RequestKind, ValidationRequest};

/// A check's pending verdict.
pub type CheckFuture = BoxFuture<'static, Result<(), Rejection>>;

/// A check bound to one field for one or more request kinds.
pub type CheckFn = Arc<dyn Fn(Arc<ValidationRequest>) -> CheckFuture + Send + Sync>;

/// One request field and the checks that apply to it, per request kind.
#[derive(Clone)]
pub struct FieldValidator {
    field: &'static str,
    handlers: BTreeMap<RequestKind, CheckFn>,
}

impl FieldValidator {
    /// A validator for `field` with no handlers yet.
    #[must_use]
    pub fn new(field: &'static str) -> Self {
        Self {
            field,
            handlers: BTreeMap::new(),
        }
    }

    /// Registers `check` for `kind`, replacing any earlier handler.
    #[must_use]
    pub fn on<F, Fut>(self, kind: RequestKind, check: F) -> Self
    where
        F: Fn(Arc<ValidationRequest>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), Rejection>> + Send + 'static,
    {
        self.on_each(&[kind], check)
    }

    /// Registers the same `check` for every kind in `kinds`.
    #[must_use]
    pub fn on_each<F, Fut>(mut self, kinds: &[RequestKind], check: F) -> Self
    where
        F: Fn(Arc<ValidationRequest>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), Rejection>> + Send + 'static,
    {
        let handler: CheckFn = Arc::new(move |request| check(request).boxed());
        for &kind in kinds {
            self.handlers.insert(kind, handler.clone());
        }
        self
    }

    /// The field this validator is bound to.
    #[must_use]
    pub fn field(&self) -> &'static str {
        self.field
    }

    /// Whether this validator takes part in `kind` requests.
    #[must_use]
    pub fn handles(&self, kind: RequestKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Runs the check for the request's kind. Unhandled kinds pass.
    ///
    /// # Errors
    /// Returns the check's rejection attributed to this field.
    pub async fn check(&self, request: Arc<ValidationRequest>) -> Result<(), FieldFailure> {
        match self.handlers.get(&request.kind) {
            Some(check) => check(request.clone()).await.map_err(|r| r.for_field(self.field)),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for FieldValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldValidator")
            .field("field", &self.field)
            .field("kinds", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
