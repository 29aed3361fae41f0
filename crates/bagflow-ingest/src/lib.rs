//! Bagflow Ingest Core
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Per-object processing logic used by the stage workers:
//!
//! - **Reconcile**: decide, by content hash, which freshly unpacked files
//!   actually changed relative to what the registry already holds
//! - **Batch**: stream the files that need saving in fixed-size chunks
//!
//! Both operate on one object's own file list; nothing here is shared
//! across workers or spawns concurrency of its own.

pub mod batch;
pub mod reconcile;

pub use batch::BatchIterator;
pub use reconcile::{Reconciler, ReconcileSummary};
