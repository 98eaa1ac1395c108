//! Record collection abstraction and the in-memory implementation.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use algobank_core::{AlgoName, LatestVersion, StoredRecord, Version};

use crate::StoreError;

/// Index of stored `(name, version)` records.
///
/// The only mutations are inserting a new record and deleting one record;
/// no stored record is ever modified in place.
#[async_trait]
pub trait RecordCollection: Send + Sync {
    /// Inserts `record` only if the latest version stored for its name is
    /// `expected_latest` (`None` meaning the name has no records) and
    /// `record.version` directly follows it.
    ///
    /// The check and the insert happen atomically.
    ///
    /// # Errors
    /// Returns [`StoreError::VersionConflict`] if the precondition fails.
    async fn insert_next(
        &self,
        record: StoredRecord,
        expected_latest: Option<Version>,
    ) -> Result<(), StoreError>;

    /// Finds the record at `version`, or the latest one when `version` is `None`.
    async fn find_one(
        &self,
        name: &AlgoName,
        version: Option<Version>,
    ) -> Result<Option<StoredRecord>, StoreError>;

    /// Returns the highest stored version for `name`.
    async fn find_max(&self, name: &AlgoName) -> Result<Option<Version>, StoreError>;

    /// Removes and returns the record at `version`, or the latest one when
    /// `version` is `None`.
    async fn delete_one(
        &self,
        name: &AlgoName,
        version: Option<Version>,
    ) -> Result<Option<StoredRecord>, StoreError>;

    /// Every stored name with its latest version, ordered by name.
    async fn latest_versions(&self) -> Result<Vec<LatestVersion>, StoreError>;
}

type Index = BTreeMap<AlgoName, BTreeMap<Version, StoredRecord>>;

/// Process-local [`RecordCollection`] guarded by a single `RwLock`.
///
/// The lock is never held across artifact I/O; callers only touch it inside
/// the individual collection methods.
#[derive(Debug, Default)]
pub struct MemoryRecordCollection {
    index: RwLock<Index>,
}

impl MemoryRecordCollection {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored records across all names.
    pub async fn len(&self) -> usize {
        self.index.read().await.values().map(BTreeMap::len).sum()
    }

    /// Returns `true` if no records are stored.
    pub async fn is_empty(&self) -> bool {
        self.index.read().await.is_empty()
    }
}

fn pick(versions: &BTreeMap<Version, StoredRecord>, version: Option<Version>) -> Option<Version> {
    match version {
        Some(v) => versions.contains_key(&v).then_some(v),
        None => versions.keys().next_back().copied(),
    }
}

#[async_trait]
impl RecordCollection for MemoryRecordCollection {
    async fn insert_next(
        &self,
        record: StoredRecord,
        expected_latest: Option<Version>,
    ) -> Result<(), StoreError> {
        let mut index = self.index.write().await;
        let actual = index
            .get(&record.algo_name)
            .and_then(|versions| versions.keys().next_back().copied());
        let follows = Version::after(expected_latest).is_ok_and(|next| next == record.version);
        if actual != expected_latest || !follows {
            return Err(StoreError::VersionConflict {
                name: record.algo_name,
                expected: expected_latest,
                actual,
            });
        }
        index
            .entry(record.algo_name.clone())
            .or_default()
            .insert(record.version, record);
        Ok(())
    }

    async fn find_one(
        &self,
        name: &AlgoName,
        version: Option<Version>,
    ) -> Result<Option<StoredRecord>, StoreError> {
        let index = self.index.read().await;
        Ok(index.get(name).and_then(|versions| {
            pick(versions, version).and_then(|v| versions.get(&v).cloned())
        }))
    }

    async fn find_max(&self, name: &AlgoName) -> Result<Option<Version>, StoreError> {
        let index = self.index.read().await;
        Ok(index
            .get(name)
            .and_then(|versions| versions.keys().next_back().copied()))
    }

    async fn delete_one(
        &self,
        name: &AlgoName,
        version: Option<Version>,
    ) -> Result<Option<StoredRecord>, StoreError> {
        let mut index = self.index.write().await;
        let Some(versions) = index.get_mut(name) else {
            return Ok(None);
        };
        let removed = pick(versions, version).and_then(|v| versions.remove(&v));
        if versions.is_empty() {
            index.remove(name);
        }
        Ok(removed)
    }

    async fn latest_versions(&self) -> Result<Vec<LatestVersion>, StoreError> {
        let index = self.index.read().await;
        Ok(index
            .iter()
            .filter_map(|(name, versions)| {
                versions.keys().next_back().map(|&version| LatestVersion {
                    algo_name: name.clone(),
                    version,
                })
            })
            .collect())
    }
}
