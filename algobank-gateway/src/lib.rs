//! HTTP gateway for the algorithm bank.
//!
//! Exposes create, update, list, retrieve and delete over JSON. Every
//! request runs through the validation pipeline before the store is
//! touched; rejections come back as `{"ok": false, ...}` bodies with the
//! failing fields listed.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod error;
pub mod routes;
pub mod service;
