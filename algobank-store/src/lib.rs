//! Versioned storage for submitted algorithms.
//!
//! Persists code artifacts through an [`ArtifactStore`], indexes records in a
//! [`RecordCollection`], and assigns strictly increasing per-name versions
//! through [`AlgorithmStore`].

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod artifact;
pub mod collection;
pub mod error;
pub mod store;

pub use artifact::{ArtifactStore, FsArtifactStore};
pub use collection::{MemoryRecordCollection, RecordCollection};
pub use error::StoreError;
pub use store::{AlgorithmStore, DEFAULT_APPEND_ATTEMPTS};
