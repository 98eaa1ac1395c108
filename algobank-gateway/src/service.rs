//! The five algorithm operations: validate first, then touch storage.

use std::sync::Arc;

use serde_json::Value;

use algobank_core::{
    AlgoName, AlgorithmSubmission, Base64Codec, LatestVersion, LexicalScanner, RetrievedAlgorithm,
    StoredRecord, TransportCodec, Version,
};
use algobank_store::{AlgorithmStore, FsArtifactStore, MemoryRecordCollection, RecordCollection};
use algobank_validator::{algorithm_validators, RequestKind, ValidationRegistry, ValidationRequest};

use crate::config::ServiceConfig;
use crate::error::GatewayError;

/// Runs the validation pipeline for a request, then the matching store operation.
///
/// No store operation runs for a request that failed validation.
pub struct AlgorithmService {
    registry: ValidationRegistry,
    store: AlgorithmStore,
    codec: Arc<dyn TransportCodec>,
}

impl AlgorithmService {
    #[must_use]
    pub fn new(
        registry: ValidationRegistry,
        store: AlgorithmStore,
        codec: Arc<dyn TransportCodec>,
    ) -> Self {
        Self {
            registry,
            store,
            codec,
        }
    }

    /// Filesystem artifacts under the configured root, in-memory records,
    /// base64 transport, and the lexical scanner.
    #[must_use]
    pub fn from_config(config: &ServiceConfig) -> Self {
        let records: Arc<dyn RecordCollection> = Arc::new(MemoryRecordCollection::new());
        let codec: Arc<dyn TransportCodec> = Arc::new(Base64Codec);
        let validators = algorithm_validators(
            records.clone(),
            config.validator_config(),
            Arc::new(LexicalScanner::new()),
            codec.clone(),
        );
        let store = AlgorithmStore::new(
            Arc::new(FsArtifactStore::new(config.storage_root.clone())),
            records,
        );
        Self::new(ValidationRegistry::new(&validators), store, codec)
    }

    /// Stores version 1 of a new algorithm.
    ///
    /// # Errors
    /// Validation failures, or store failures after validation passed.
    pub async fn create(&self, body: Value) -> Result<StoredRecord, GatewayError> {
        let submission = self.accept(RequestKind::Create, body).await?;
        let draft = submission.decode(self.codec.as_ref())?;
        let record = self.store.create(&draft).await?;
        tracing::info!(name = %record.algo_name, version = %record.version, "algorithm created");
        Ok(record)
    }

    /// Stores the next version of an existing algorithm.
    ///
    /// # Errors
    /// Validation failures, or store failures after validation passed.
    pub async fn update(&self, body: Value) -> Result<StoredRecord, GatewayError> {
        let submission = self.accept(RequestKind::Update, body).await?;
        let draft = submission.decode(self.codec.as_ref())?;
        let record = self.store.update(&draft).await?;
        tracing::info!(name = %record.algo_name, version = %record.version, "algorithm updated");
        Ok(record)
    }

    /// Every stored name with its latest version.
    ///
    /// # Errors
    /// Propagates collection failures.
    pub async fn list(&self) -> Result<Vec<LatestVersion>, GatewayError> {
        self.registry.validate(ValidationRequest::bare(RequestKind::List)).await?;
        Ok(self.store.list().await?)
    }

    /// A record with its code inlined; the latest one when `version` is `None`.
    ///
    /// # Errors
    /// Not-found for unknown names or versions, bad request for version `0`.
    pub async fn retrieve(
        &self,
        name: &str,
        version: Option<u32>,
    ) -> Result<RetrievedAlgorithm, GatewayError> {
        let (name, version) = self.address(RequestKind::Retrieve, name, version).await?;
        Ok(self.store.retrieve(&name, version).await?)
    }

    /// Removes one record; the latest one when `version` is `None`.
    ///
    /// # Errors
    /// Not-found for unknown names or versions, bad request for version `0`.
    pub async fn delete(
        &self,
        name: &str,
        version: Option<u32>,
    ) -> Result<StoredRecord, GatewayError> {
        let (name, version) = self.address(RequestKind::Delete, name, version).await?;
        Ok(self.store.delete(&name, version).await?)
    }

    async fn accept(
        &self,
        kind: RequestKind,
        body: Value,
    ) -> Result<AlgorithmSubmission, GatewayError> {
        self.registry
            .validate(ValidationRequest::with_body(kind, body.clone()))
            .await?;
        serde_json::from_value(body).map_err(|e| GatewayError::InvalidRequest(e.to_string()))
    }

    async fn address(
        &self,
        kind: RequestKind,
        name: &str,
        version: Option<u32>,
    ) -> Result<(AlgoName, Option<Version>), GatewayError> {
        self.registry
            .validate(ValidationRequest::with_path(kind, name, version))
            .await?;
        let version = version.map(Version::new).transpose()?;
        Ok((AlgoName::parse(name)?, version))
    }
}
