//! Bagflow Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared foundation for the bagflow preservation pipeline:
//!
//! - **Types**: workflow enums, status records, files, objects, events
//! - **Status**: pure workflow predicates over status records
//! - **Identifier**: the `{institution}/{bag}[/data/{path}]` grammar
//! - **Checksum**: md5/sha256 digest utilities
//! - **Error Handling**: the shared error taxonomy
//! - **Logging / Config**: worker-process bootstrap

pub mod checksum;
pub mod config;
pub mod error;
pub mod identifier;
pub mod logging;
pub mod status;
pub mod types;

// Re-export commonly used types
pub use error::{BagflowError, Result};
