//! Per-kind pipelines assembled from the registered field validators.
//!
//! Every validator that handles a kind takes part in that kind's pipeline.
//! A pipeline runs all of its checks concurrently and reports every failing
//! field; it never stops at the first one.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use tracing::debug;

use algobank_core::{CodePolicy, SourceScanner, TransportCodec};
use algobank_store::RecordCollection;

use crate::code::{main_code_validator, privacy_code_validator, CodeChecker};
use crate::description::description_validator;
use crate::failure::ValidationFailure;
use crate::field::FieldValidator;
use crate::key::AccessKey;
use crate::name::name_validator;
use crate::request::{RequestKind, ValidationRequest};

/// The validators taking part in one request kind.
#[derive(Debug, Clone)]
pub struct RequestPipeline {
    kind: RequestKind,
    validators: Vec<FieldValidator>,
}

impl RequestPipeline {
    /// Keeps the validators that handle `kind`, in registration order.
    #[must_use]
    pub fn assemble(kind: RequestKind, validators: &[FieldValidator]) -> Self {
        Self {
            kind,
            validators: validators
                .iter()
                .filter(|v| v.handles(kind))
                .cloned()
                .collect(),
        }
    }

    /// Fields checked by this pipeline.
    #[must_use]
    pub fn fields(&self) -> Vec<&'static str> {
        self.validators.iter().map(FieldValidator::field).collect()
    }

    /// Runs every check and collects every failure.
    ///
    /// # Errors
    /// Returns [`ValidationFailure`] listing each failing field in
    /// registration order.
    pub async fn run(&self, request: ValidationRequest) -> Result<(), ValidationFailure> {
        let request = Arc::new(request);
        let outcomes = join_all(
            self.validators
                .iter()
                .map(|validator| validator.check(request.clone())),
        )
        .await;
        let failures: Vec<_> = outcomes.into_iter().filter_map(Result::err).collect();
        if failures.is_empty() {
            return Ok(());
        }
        debug!(
            kind = %self.kind,
            fields = ?failures.iter().map(|f| f.field.as_str()).collect::<Vec<_>>(),
            "request rejected"
        );
        Err(ValidationFailure { failures })
    }
}

/// Policies and secrets the code validators are built with.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    pub main_policy: CodePolicy,
    pub privacy_policy: CodePolicy,
    pub access_key: AccessKey,
}

impl ValidatorConfig {
    /// Default main and privacy policies with the given access key.
    #[must_use]
    pub fn with_access_key(access_key: AccessKey) -> Self {
        Self {
            main_policy: CodePolicy::main(),
            privacy_policy: CodePolicy::privacy(),
            access_key,
        }
    }
}

/// The field validators of the algorithm bank, in reporting order.
#[must_use]
pub fn algorithm_validators(
    records: Arc<dyn RecordCollection>,
    config: ValidatorConfig,
    scanner: Arc<dyn SourceScanner>,
    codec: Arc<dyn TransportCodec>,
) -> Vec<FieldValidator> {
    let checker = CodeChecker::new(scanner, codec);
    vec![
        name_validator(records),
        description_validator(),
        main_code_validator(checker.clone(), config.main_policy),
        privacy_code_validator(checker, config.privacy_policy, config.access_key),
    ]
}

/// One pipeline per request kind, built once at startup.
#[derive(Debug, Clone)]
pub struct ValidationRegistry {
    pipelines: BTreeMap<RequestKind, RequestPipeline>,
}

impl ValidationRegistry {
    #[must_use]
    pub fn new(validators: &[FieldValidator]) -> Self {
        let pipelines = RequestKind::ALL
            .into_iter()
            .map(|kind| (kind, RequestPipeline::assemble(kind, validators)))
            .collect();
        Self { pipelines }
    }

    /// The pipeline for `kind`.
    #[must_use]
    pub fn pipeline(&self, kind: RequestKind) -> Option<&RequestPipeline> {
        self.pipelines.get(&kind)
    }

    /// Runs the pipeline matching the request's kind.
    ///
    /// # Errors
    /// Returns every field failure found.
    pub async fn validate(&self, request: ValidationRequest) -> Result<(), ValidationFailure> {
        match self.pipelines.get(&request.kind) {
            Some(pipeline) => pipeline.run(request).await,
            None => Ok(()),
        }
    }
}
