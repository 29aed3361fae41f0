//! Bagflow Registry Client
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! HTTP client for the authoritative metadata registry. All reads and
//! writes of intellectual objects, generic files, provenance events and
//! processing-status records go through [`api::RegistryClient`].
//!
//! Work items arrive at least once, so every write here is safe under
//! duplicate delivery: callers branch on get-before-create, and reads apply
//! latest-wins-by-timestamp rather than trusting server-side deduplication.

pub mod api;

pub use api::client::{CreatedObject, RegistryClient};
pub use api::types::EventParent;
