//! Versioned algorithm storage over an [`ArtifactStore`] and a
//! [`RecordCollection`].
//!
//! Writes go artifacts first, record last: a record becomes visible only once
//! every artifact it references exists. Version assignment uses the
//! collection's conditional insert, so two racing updates can never store the
//! same `(name, version)`.

use std::sync::Arc;

use chrono::Utc;

use algobank_core::{
    AlgoName, AlgorithmDraft, ArtifactKey, ArtifactRef, CodeRole, ContentDigest, LatestVersion,
    RetrievedAlgorithm, RetrievedMainCode, RetrievedPrivacyCode, StoredMainCode,
    StoredPrivacyCode, StoredRecord, Version,
};

use crate::{ArtifactStore, RecordCollection, StoreError};

/// Read-then-append attempts an update makes before giving up on a busy name.
pub const DEFAULT_APPEND_ATTEMPTS: usize = 3;

/// Assigns versions, persists code artifacts, and answers lookups.
///
/// All operations are safe to call concurrently.
pub struct AlgorithmStore {
    artifacts: Arc<dyn ArtifactStore>,
    records: Arc<dyn RecordCollection>,
    append_attempts: usize,
}

impl AlgorithmStore {
    /// Create a store over the given collaborators.
    #[must_use]
    pub fn new(artifacts: Arc<dyn ArtifactStore>, records: Arc<dyn RecordCollection>) -> Self {
        Self {
            artifacts,
            records,
            append_attempts: DEFAULT_APPEND_ATTEMPTS,
        }
    }

    /// Override how many times an update retries after losing a version race.
    #[must_use]
    pub fn with_append_attempts(mut self, attempts: usize) -> Self {
        self.append_attempts = attempts.max(1);
        self
    }

    /// Store the first version of a new algorithm.
    ///
    /// # Errors
    /// Returns [`StoreError::AlreadyExists`] if the name already has records.
    /// Propagates artifact and collection failures.
    pub async fn create(&self, draft: &AlgorithmDraft) -> Result<StoredRecord, StoreError> {
        if self.records.find_max(&draft.name).await?.is_some() {
            return Err(StoreError::AlreadyExists { name: draft.name.clone() });
        }
        match self.append(draft, None).await {
            Err(StoreError::VersionConflict { .. }) => {
                Err(StoreError::AlreadyExists { name: draft.name.clone() })
            }
            other => other,
        }
    }

    /// Store a new version of an existing algorithm, one above the current latest.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] if the name has no records, or
    /// [`StoreError::VersionConflict`] if every attempt lost a race with a
    /// concurrent update. Propagates artifact and collection failures.
    pub async fn update(&self, draft: &AlgorithmDraft) -> Result<StoredRecord, StoreError> {
        let mut attempt = 1;
        loop {
            let Some(latest) = self.records.find_max(&draft.name).await? else {
                return Err(StoreError::NotFound { name: draft.name.clone() });
            };
            match self.append(draft, Some(latest)).await {
                Err(StoreError::VersionConflict { actual, .. }) if attempt < self.append_attempts => {
                    tracing::warn!(
                        name = %draft.name,
                        expected = %latest,
                        actual = ?actual,
                        attempt,
                        "lost version race, retrying update"
                    );
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    /// Every stored name with its latest version.
    ///
    /// # Errors
    /// Propagates collection failures.
    pub async fn list(&self) -> Result<Vec<LatestVersion>, StoreError> {
        self.records.latest_versions().await
    }

    /// Fetch a record with its source texts inlined. `None` selects the latest.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] / [`StoreError::VersionNotFound`] if no
    /// record matches, [`StoreError::DigestMismatch`] if an artifact changed
    /// since it was written.
    pub async fn retrieve(
        &self,
        name: &AlgoName,
        version: Option<Version>,
    ) -> Result<RetrievedAlgorithm, StoreError> {
        let record = self
            .records
            .find_one(name, version)
            .await?
            .ok_or_else(|| missing(name, version))?;

        let code = self.read_verified(&record.algorithm.artifact).await?;
        let privacy_algorithm = match &record.privacy_algorithm {
            Some(privacy) => Some(RetrievedPrivacyCode {
                code: self.read_verified(&privacy.artifact).await?,
                class_name: privacy.class_name.clone(),
            }),
            None => None,
        };

        Ok(RetrievedAlgorithm {
            algo_name: record.algo_name,
            version: record.version,
            description: record.description,
            algorithm: RetrievedMainCode {
                code,
                class_name: record.algorithm.class_name,
                reducer: record.algorithm.reducer,
            },
            privacy_algorithm,
            created_at: record.created_at,
        })
    }

    /// Remove one record (the latest when `version` is `None`) and its artifacts.
    ///
    /// The record leaves the collection first; artifact removal is best effort
    /// and failures are only logged.
    ///
    /// # Errors
    /// Returns [`StoreError::NotFound`] / [`StoreError::VersionNotFound`] if no
    /// record matches.
    pub async fn delete(
        &self,
        name: &AlgoName,
        version: Option<Version>,
    ) -> Result<StoredRecord, StoreError> {
        let record = self
            .records
            .delete_one(name, version)
            .await?
            .ok_or_else(|| missing(name, version))?;

        self.discard(record.artifact_keys()).await;
        tracing::info!(name = %record.algo_name, version = %record.version, "algorithm version deleted");
        Ok(record)
    }

    /// Write artifacts for the version after `expected_latest`, then insert
    /// the record conditionally on `expected_latest` still being the latest.
    async fn append(
        &self,
        draft: &AlgorithmDraft,
        expected_latest: Option<Version>,
    ) -> Result<StoredRecord, StoreError> {
        let version = Version::after(expected_latest)?;

        let main = self
            .persist(&draft.name, version, CodeRole::Main, &draft.main.source)
            .await?;
        let privacy = match &draft.privacy {
            Some(code) => {
                match self
                    .persist(&draft.name, version, CodeRole::Privacy, &code.source)
                    .await
                {
                    Ok(artifact) => Some(artifact),
                    Err(e) => {
                        self.discard(vec![&main.key]).await;
                        return Err(e);
                    }
                }
            }
            None => None,
        };

        let record = StoredRecord {
            algo_name: draft.name.clone(),
            version,
            description: draft.description.clone(),
            algorithm: StoredMainCode {
                artifact: main,
                class_name: draft.main.class_name.clone(),
                reducer: draft.main.reducer,
            },
            privacy_algorithm: privacy.zip(draft.privacy.as_ref()).map(|(artifact, code)| {
                StoredPrivacyCode {
                    artifact,
                    class_name: code.class_name.clone(),
                }
            }),
            created_at: Utc::now(),
        };

        match self.records.insert_next(record.clone(), expected_latest).await {
            Ok(()) => {
                tracing::info!(name = %record.algo_name, version = %record.version, "algorithm version stored");
                Ok(record)
            }
            Err(e @ StoreError::VersionConflict { .. }) => {
                // Rejected before insert, so nothing references these keys.
                self.discard(record.artifact_keys()).await;
                Err(e)
            }
            Err(e) => {
                tracing::warn!(
                    name = %record.algo_name,
                    version = %record.version,
                    error = %e,
                    "record insert failed; artifacts left orphaned"
                );
                Err(e)
            }
        }
    }

    async fn persist(
        &self,
        name: &AlgoName,
        version: Version,
        role: CodeRole,
        source: &str,
    ) -> Result<ArtifactRef, StoreError> {
        let key = ArtifactKey::generate(name, version, role);
        self.artifacts.create(&key, source).await?;
        Ok(ArtifactRef {
            key,
            digest: ContentDigest::of(source),
        })
    }

    async fn read_verified(&self, artifact: &ArtifactRef) -> Result<String, StoreError> {
        let text = self.artifacts.read(&artifact.key).await?;
        if ContentDigest::of(&text) != artifact.digest {
            return Err(StoreError::DigestMismatch { key: artifact.key.clone() });
        }
        Ok(text)
    }

    async fn discard(&self, keys: Vec<&ArtifactKey>) {
        for key in keys {
            if let Err(e) = self.artifacts.delete(key).await {
                tracing::warn!(artifact = %key, error = %e, "failed to remove artifact; left orphaned");
            }
        }
    }
}

fn missing(name: &AlgoName, version: Option<Version>) -> StoreError {
    match version {
        Some(version) => StoreError::VersionNotFound { name: name.clone(), version },
        None => StoreError::NotFound { name: name.clone() },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use algobank_core::{samples, Base64Codec, MainCode, PrivacyCode, ReducerKind};

    use super::*;
    use crate::{FsArtifactStore, MemoryRecordCollection};

    fn draft(with_privacy: bool) -> AlgorithmDraft {
        let submission = match samples::pop_density_submission(&Base64Codec, with_privacy.then_some("k")) {
            Ok(s) => s,
            Err(e) => panic!("sample must build: {e}"),
        };
        match submission.decode(&Base64Codec) {
            Ok(d) => d,
            Err(e) => panic!("sample must decode: {e}"),
        }
    }

    fn fs_store() -> (tempfile::TempDir, Arc<MemoryRecordCollection>, AlgorithmStore) {
        let dir = match tempfile::tempdir() {
            Ok(d) => d,
            Err(e) => panic!("failed to create temp dir: {e}"),
        };
        let records = Arc::new(MemoryRecordCollection::new());
        let store = AlgorithmStore::new(Arc::new(FsArtifactStore::new(dir.path())), records.clone());
        (dir, records, store)
    }

    fn version(raw: u32) -> Version {
        match Version::new(raw) {
            Ok(v) => v,
            Err(e) => panic!("bad test version: {e}"),
        }
    }

    /// Fails every privacy artifact write and counts deletes.
    struct PrivacyWriteFails {
        inner: FsArtifactStore,
        deletes: AtomicUsize,
    }

    #[async_trait]
    impl ArtifactStore for PrivacyWriteFails {
        async fn create(&self, key: &ArtifactKey, text: &str) -> Result<(), StoreError> {
            if key.as_str().contains("/privacy_v") {
                return Err(StoreError::Io(std::io::Error::other("disk full")));
            }
            self.inner.create(key, text).await
        }

        async fn read(&self, key: &ArtifactKey) -> Result<String, StoreError> {
            self.inner.read(key).await
        }

        async fn delete(&self, key: &ArtifactKey) -> Result<(), StoreError> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            self.inner.delete(key).await
        }
    }

    #[tokio::test]
    async fn create_assigns_version_one_and_retrieve_inlines_code() {
        let (_dir, _records, store) = fs_store();
        let d = draft(true);

        let stored = match store.create(&d).await {
            Ok(r) => r,
            Err(e) => panic!("create failed: {e}"),
        };
        assert_eq!(stored.version, Version::FIRST);
        assert!(stored.privacy_algorithm.is_some(), "privacy ref must be present when supplied");

        let got = match store.retrieve(&d.name, None).await {
            Ok(r) => r,
            Err(e) => panic!("retrieve failed: {e}"),
        };
        assert_eq!(got.version, Version::FIRST);
        assert_eq!(got.algorithm.code, samples::POP_DENSITY_SOURCE);
        assert_eq!(got.algorithm.reducer, ReducerKind::Sum);
        match got.privacy_algorithm {
            Some(p) => assert_eq!(p.code, samples::DENSITY_PRIVACY_SOURCE),
            None => panic!("privacy code must be inlined"),
        }
    }

    #[tokio::test]
    async fn create_twice_is_already_exists() {
        let (_dir, _records, store) = fs_store();
        let d = draft(false);
        assert!(store.create(&d).await.is_ok());
        assert!(matches!(store.create(&d).await, Err(StoreError::AlreadyExists { .. })));
    }

    #[tokio::test]
    async fn create_without_privacy_stores_no_privacy_ref() {
        let (_dir, _records, store) = fs_store();
        match store.create(&draft(false)).await {
            Ok(r) => assert!(r.privacy_algorithm.is_none()),
            Err(e) => panic!("create failed: {e}"),
        }
    }

    #[tokio::test]
    async fn update_unknown_name_is_not_found() {
        let (_dir, _records, store) = fs_store();
        assert!(matches!(store.update(&draft(false)).await, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn updates_append_consecutive_versions() {
        let (_dir, _records, store) = fs_store();
        let mut d = draft(false);
        assert!(store.create(&d).await.is_ok());
        for expected in 2..=4 {
            d.description = format!("revision {expected}");
            match store.update(&d).await {
                Ok(r) => assert_eq!(r.version, version(expected)),
                Err(e) => panic!("update failed: {e}"),
            }
        }
        match store.retrieve(&d.name, Some(version(1))).await {
            Ok(r) => assert_eq!(r.description, "Population density", "v1 must be untouched"),
            Err(e) => panic!("retrieve v1 failed: {e}"),
        }
        match store.retrieve(&d.name, None).await {
            Ok(r) => assert_eq!(r.description, "revision 4"),
            Err(e) => panic!("retrieve latest failed: {e}"),
        }
    }

    #[tokio::test]
    async fn concurrent_updates_never_share_a_version() {
        let (_dir, records, store) = fs_store();
        let store = Arc::new(store.with_append_attempts(16));
        let d = Arc::new(draft(true));
        assert!(store.create(&d).await.is_ok());

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                let d = d.clone();
                tokio::spawn(async move { store.update(&d).await })
            })
            .collect();
        for task in tasks {
            match task.await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => panic!("update failed: {e}"),
                Err(e) => panic!("task panicked: {e}"),
            }
        }

        assert_eq!(records.len().await, 9, "create plus eight updates");
        assert!(matches!(records.find_max(&d.name).await, Ok(Some(v)) if v == version(9)));
    }

    #[tokio::test]
    async fn privacy_write_failure_inserts_no_record() {
        let dir = match tempfile::tempdir() {
            Ok(d) => d,
            Err(e) => panic!("failed to create temp dir: {e}"),
        };
        let artifacts = Arc::new(PrivacyWriteFails {
            inner: FsArtifactStore::new(dir.path()),
            deletes: AtomicUsize::new(0),
        });
        let records = Arc::new(MemoryRecordCollection::new());
        let store = AlgorithmStore::new(artifacts.clone(), records.clone());

        assert!(matches!(store.create(&draft(true)).await, Err(StoreError::Io(_))));
        assert!(records.is_empty().await, "no record may be visible without its artifacts");
        assert_eq!(artifacts.deletes.load(Ordering::SeqCst), 1, "main artifact is cleaned up");
    }

    #[tokio::test]
    async fn delete_specific_version_keeps_latest_retrievable() {
        let (_dir, _records, store) = fs_store();
        let d = draft(false);
        assert!(store.create(&d).await.is_ok());
        assert!(store.update(&d).await.is_ok());

        match store.delete(&d.name, Some(version(1))).await {
            Ok(r) => assert_eq!(r.version, version(1)),
            Err(e) => panic!("delete failed: {e}"),
        }
        assert!(matches!(
            store.retrieve(&d.name, Some(version(1))).await,
            Err(StoreError::VersionNotFound { .. })
        ));
        match store.retrieve(&d.name, None).await {
            Ok(r) => assert_eq!(r.version, version(2)),
            Err(e) => panic!("latest must survive: {e}"),
        }
    }

    #[tokio::test]
    async fn delete_without_version_removes_latest_and_its_files() {
        let (dir, _records, store) = fs_store();
        let d = draft(true);
        assert!(store.create(&d).await.is_ok());
        let removed = match store.delete(&d.name, None).await {
            Ok(r) => r,
            Err(e) => panic!("delete failed: {e}"),
        };
        for key in removed.artifact_keys() {
            assert!(!dir.path().join(key.as_str()).exists(), "{key} must be removed");
        }
        assert!(matches!(store.retrieve(&d.name, None).await, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn retrieve_detects_tampered_artifact() {
        let (dir, _records, store) = fs_store();
        let stored = match store.create(&draft(false)).await {
            Ok(r) => r,
            Err(e) => panic!("create failed: {e}"),
        };
        let path = dir.path().join(stored.algorithm.artifact.key.as_str());
        if let Err(e) = tokio::fs::write(&path, "import multiprocessing\n").await {
            panic!("failed to tamper: {e}");
        }
        assert!(matches!(
            store.retrieve(&stored.algo_name, None).await,
            Err(StoreError::DigestMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn list_reports_latest_version_per_name() {
        let (_dir, _records, store) = fs_store();
        let mut d = draft(false);
        assert!(store.create(&d).await.is_ok());
        assert!(store.update(&d).await.is_ok());
        d.name = match AlgoName::parse("another") {
            Ok(n) => n,
            Err(e) => panic!("bad name: {e}"),
        };
        d.main = MainCode { reducer: ReducerKind::Count, ..d.main };
        d.privacy = Some(PrivacyCode { source: "x".to_owned(), class_name: "X".to_owned() });
        assert!(store.create(&d).await.is_ok());

        let listed = match store.list().await {
            Ok(l) => l,
            Err(e) => panic!("list failed: {e}"),
        };
        let rows: Vec<(&str, u32)> = listed
            .iter()
            .map(|l| (l.algo_name.as_str(), l.version.get()))
            .collect();
        assert_eq!(rows, vec![("another", 1), ("pop-density", 2)]);
    }

    proptest::proptest! {
        #![proptest_config(proptest::prelude::ProptestConfig::with_cases(16))]

        #[test]
        fn proptest_n_updates_yield_versions_one_through_n(updates in 0u32..8) {
            let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                Ok(rt) => rt,
                Err(e) => panic!("runtime: {e}"),
            };
            let versions = rt.block_on(async {
                let (_dir, records, store) = fs_store();
                let d = draft(false);
                if let Err(e) = store.create(&d).await {
                    panic!("create failed: {e}");
                }
                for _ in 0..updates {
                    if let Err(e) = store.update(&d).await {
                        panic!("update failed: {e}");
                    }
                }
                let mut seen = Vec::new();
                for v in 1..=updates + 1 {
                    if let Ok(Some(r)) = records.find_one(&d.name, Some(version(v))).await {
                        seen.push(r.version.get());
                    }
                }
                let latest = records.find_max(&d.name).await.ok().flatten().map(Version::get);
                (seen, latest)
            });
            let expected: Vec<u32> = (1..=updates + 1).collect();
            proptest::prop_assert_eq!(versions.0, expected);
            proptest::prop_assert_eq!(versions.1, Some(updates + 1));
        }
    }
}
