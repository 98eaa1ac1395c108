//! Request validation for the algorithm bank.
//!
//! Field validators are tagged with the request kinds they handle; the
//! [`ValidationRegistry`] assembles one [`RequestPipeline`] per kind from
//! them. A pipeline checks every participating field and reports all
//! failures together, each tagged with a [`FailureKind`] so callers can map
//! the rejection to a response.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod code;
pub mod description;
pub mod failure;
pub mod field;
pub mod key;
pub mod name;
pub mod pipeline;
pub mod request;

pub use code::CodeChecker;
pub use failure::{FailureKind, FieldFailure, Rejection, ValidationFailure};
pub use field::{CheckFn, CheckFuture, FieldValidator};
pub use key::AccessKey;
pub use pipeline::{algorithm_validators, RequestPipeline, ValidationRegistry, ValidatorConfig};
pub use request::{RequestKind, ValidationRequest};
