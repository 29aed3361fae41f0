//! Workflow predicates over processing-status records
//!
//! Pure, single-record functions. Stage workers apply these to persisted
//! records to decide whether any work remains and whether a retry is safe;
//! no synchronization is needed across workers.
//!
//! Withdrawing a pending restore/delete request is expressed by setting
//! `retry = false` on the latest record. The record keeps its stage and
//! status; there is no transition to `Cancelled`. The pending queries filter
//! on retryability, so a withdrawn item simply stops matching.

use crate::types::{Action, ProcessStatus, Stage, Status};

impl Action {
    /// Ordered stage sequence for this action. `Resolve` is additionally
    /// reachable out-of-band from any point for conflict resolution.
    pub fn stages(&self) -> &'static [Stage] {
        match self {
            Action::Ingest => &[
                Stage::Receive,
                Stage::Fetch,
                Stage::Unpack,
                Stage::Validate,
                Stage::Store,
                Stage::Record,
                Stage::Cleanup,
            ],
            Action::Restore => &[Stage::Requested, Stage::Resolve, Stage::Fetch, Stage::Record],
            Action::Delete => &[Stage::Requested, Stage::Resolve, Stage::Cleanup, Stage::Record],
        }
    }
}

impl ProcessStatus {
    /// Whether the item's payload has already reached long-term storage.
    ///
    /// For ingest this is true once the record/cleanup/resolve stages are
    /// reached, or at (Store, Pending) where the transfer has completed and
    /// only the status flip is outstanding. (Store, Started) is
    /// mid-transfer and counts as not stored. Restore and delete have no
    /// storage step of their own, so the question does not arise and the
    /// answer is always true.
    pub fn has_been_stored(&self) -> bool {
        match self.action {
            Action::Ingest => match self.stage {
                Stage::Record | Stage::Cleanup | Stage::Resolve => true,
                Stage::Store => self.status == Status::Pending,
                _ => false,
            },
            Action::Restore | Action::Delete => true,
        }
    }

    /// Whether a storage transfer is currently in flight for this item
    pub fn is_storing(&self) -> bool {
        self.action == Action::Ingest
            && self.stage == Stage::Store
            && self.status == Status::Started
    }

    /// The sole admission gate for re-processing an ingest item.
    ///
    /// False once the item is stored or mid-store, and false once retry has
    /// been withdrawn, so duplicate deliveries cannot double-process.
    pub fn should_try_ingest(&self) -> bool {
        !self.has_been_stored() && !self.is_storing() && self.retry
    }

    /// Whether the latest record still represents retryable pending work
    pub fn is_retryable_pending(&self) -> bool {
        matches!(self.status, Status::Pending | Status::Started) && self.retry
    }
}

fn has_pending_request(records: &[ProcessStatus], action: Action) -> bool {
    records.iter().any(|r| {
        r.action == action && matches!(r.status, Status::Pending | Status::Started)
    })
}

/// True if any record is an ingest with status Started or Pending
pub fn has_pending_ingest_request(records: &[ProcessStatus]) -> bool {
    has_pending_request(records, Action::Ingest)
}

/// True if any record is a restore with status Started or Pending.
/// Used to block duplicate concurrent restore requests for one object.
pub fn has_pending_restore_request(records: &[ProcessStatus]) -> bool {
    has_pending_request(records, Action::Restore)
}

/// True if any record is a delete with status Started or Pending
pub fn has_pending_delete_request(records: &[ProcessStatus]) -> bool {
    has_pending_request(records, Action::Delete)
}

/// Reduce a record set to the latest record per object-or-file identifier,
/// by record timestamp. Queries against the registry return superseded
/// records too; only the latest one per identifier is authoritative.
pub fn latest_per_identifier(records: Vec<ProcessStatus>) -> Vec<ProcessStatus> {
    let mut latest: Vec<ProcessStatus> = Vec::new();
    for record in records {
        let key = if record.generic_file_identifier.is_empty() {
            record.object_identifier.clone()
        } else {
            record.generic_file_identifier.clone()
        };
        match latest.iter_mut().find(|r| {
            let existing = if r.generic_file_identifier.is_empty() {
                &r.object_identifier
            } else {
                &r.generic_file_identifier
            };
            *existing == key
        }) {
            Some(existing) if existing.date < record.date => *existing = record,
            Some(_) => {}
            None => latest.push(record),
        }
    }
    latest
}
