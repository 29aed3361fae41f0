//! Domain types shared across the bagflow pipeline
//!
//! These mirror the registry's wire representation where one exists; field
//! names on serialized structs are the compatibility contract and must not
//! drift.

use crate::error::BagflowError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Workflow Enums
// ============================================================================

/// High-level operation being performed on an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Ingest,
    Restore,
    Delete,
}

/// A named step within a workflow for a given action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Receive,
    Fetch,
    Unpack,
    Validate,
    Store,
    Record,
    Cleanup,
    Requested,
    Resolve,
}

/// Outcome overlay at each stage visit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Pending,
    Started,
    Success,
    Failed,
    Cancelled,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Ingest => write!(f, "Ingest"),
            Action::Restore => write!(f, "Restore"),
            Action::Delete => write!(f, "Delete"),
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Receive => "Receive",
            Stage::Fetch => "Fetch",
            Stage::Unpack => "Unpack",
            Stage::Validate => "Validate",
            Stage::Store => "Store",
            Stage::Record => "Record",
            Stage::Cleanup => "Cleanup",
            Stage::Requested => "Requested",
            Stage::Resolve => "Resolve",
        };
        write!(f, "{}", name)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Status::Pending => "Pending",
            Status::Started => "Started",
            Status::Success => "Success",
            Status::Failed => "Failed",
            Status::Cancelled => "Cancelled",
        };
        write!(f, "{}", name)
    }
}

// ============================================================================
// Checksums
// ============================================================================

/// Recognized content-hash algorithms: a 128-bit and a 256-bit digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    Md5,
    Sha256,
}

impl std::fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChecksumAlgorithm::Md5 => write!(f, "md5"),
            ChecksumAlgorithm::Sha256 => write!(f, "sha256"),
        }
    }
}

impl std::str::FromStr for ChecksumAlgorithm {
    type Err = BagflowError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "md5" => Ok(ChecksumAlgorithm::Md5),
            "sha256" => Ok(ChecksumAlgorithm::Sha256),
            other => Err(BagflowError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// One registered digest for a file
///
/// A file accumulates these over its history. The history is not guaranteed
/// to arrive in chronological order; "most recent" is always an explicit
/// max-by-timestamp scan, never a first-match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecksumAttribute {
    pub algorithm: ChecksumAlgorithm,
    pub digest: String,
    /// When the digest was computed
    pub date_time: DateTime<Utc>,
}

impl ChecksumAttribute {
    pub fn new(algorithm: ChecksumAlgorithm, digest: impl Into<String>) -> Self {
        Self {
            algorithm,
            digest: digest.into(),
            date_time: Utc::now(),
        }
    }
}

// ============================================================================
// Processing Status
// ============================================================================

/// One processing-status record per (object-or-file, action)
///
/// Field names are the wire contract. The record's own `id` is
/// server-assigned: it is deserialized when the registry returns it but
/// never sent on a write. Records are superseded, not deleted; the latest
/// record per logical key (`name`, `etag`, `bag_date`) wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessStatus {
    /// Server-assigned, immutable once set; never serialized on write
    #[serde(skip_serializing, default)]
    pub id: Option<i64>,

    pub action: Action,
    pub bag_date: DateTime<Utc>,
    pub bucket: String,
    pub date: DateTime<Utc>,
    pub etag: String,
    pub generic_file_identifier: String,
    pub institution: String,
    pub name: String,
    pub note: String,
    pub object_identifier: String,
    pub outcome: String,
    pub retry: bool,
    pub reviewed: bool,
    pub stage: Stage,
    /// Serialized administrative snapshot of the worker state
    pub state: Option<String>,
    pub status: Status,
    pub node: String,
    pub pid: i64,
    pub needs_admin_review: bool,
}

impl ProcessStatus {
    /// Logical key identifying the unit of work this record tracks.
    /// Duplicate deliveries of the same bag share this key.
    pub fn logical_key(&self) -> (&str, &str, DateTime<Utc>) {
        (&self.name, &self.etag, self.bag_date)
    }
}

// ============================================================================
// Files and Objects
// ============================================================================

/// A file freshly extracted from an incoming package, candidate for
/// registration as a generic file
///
/// `needs_save` starts true and is the reconciler's only output besides
/// `existing_file`: false means the registry already holds identical
/// content and both transfer and new provenance events are skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestFile {
    /// Relative path inside the bag; must begin with the data root
    pub path: String,
    pub size: i64,
    /// Freshly computed digests, one per recognized algorithm, each with
    /// its own computed-at timestamp
    pub checksums: Vec<ChecksumAttribute>,
    /// Assigned identifier, `{institution}/{bag}/{path}` once known
    pub identifier: String,
    /// Storage location once transferred
    pub storage_url: Option<String>,
    /// Set by reconciliation when the registry already knows this path
    pub existing_file: bool,
    pub needs_save: bool,
}

impl IngestFile {
    pub fn new(path: impl Into<String>, size: i64) -> Self {
        Self {
            path: path.into(),
            size,
            checksums: Vec::new(),
            identifier: String::new(),
            storage_url: None,
            existing_file: false,
            needs_save: true,
        }
    }

    /// The freshly computed digest for one algorithm, if present
    pub fn checksum(&self, algorithm: ChecksumAlgorithm) -> Option<&ChecksumAttribute> {
        self.checksums.iter().find(|c| c.algorithm == algorithm)
    }

    /// Whether the path sits under the bag's data root. Anything outside
    /// it (manifests, tag files) is not a candidate generic file.
    pub fn is_under_data_root(&self) -> bool {
        self.path.starts_with("data/")
    }
}

/// Registry-side representation of one content file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericFile {
    /// Server-assigned; absent until the file has been created remotely
    #[serde(default)]
    pub id: Option<i64>,
    pub identifier: String,
    pub uri: String,
    pub size: i64,
    /// Full digest history, unordered
    #[serde(default)]
    pub checksums: Vec<ChecksumAttribute>,
}

impl GenericFile {
    /// Most recent registered digest for `algorithm`, by computed-at
    /// timestamp. History order is not trusted.
    pub fn latest_checksum(&self, algorithm: ChecksumAlgorithm) -> Option<&ChecksumAttribute> {
        self.checksums
            .iter()
            .filter(|c| c.algorithm == algorithm)
            .max_by_key(|c| c.date_time)
    }
}

/// Registry-side aggregate of an ingested bag: metadata, owned files and
/// the provenance event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntellectualObject {
    #[serde(default)]
    pub id: Option<i64>,
    pub identifier: String,
    pub title: String,
    pub description: String,
    pub access: String,
    /// Owning institution domain, e.g. "uc.edu"
    pub institution: String,
    #[serde(default)]
    pub files: Vec<GenericFile>,
    #[serde(default)]
    pub events: Vec<PremisEvent>,
}

// ============================================================================
// Provenance
// ============================================================================

/// Immutable preservation-provenance record attached to an object or file
///
/// The identifier is client-generated (never server-assigned) so that a
/// re-delivered work item records the same event rather than a duplicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PremisEvent {
    pub identifier: Uuid,
    pub event_type: String,
    pub date_time: DateTime<Utc>,
    pub detail: String,
    pub outcome: String,
    pub outcome_detail: String,
    /// What produced the outcome, e.g. a hashing library
    pub object: String,
    pub agent: String,
}

impl PremisEvent {
    /// Build a new event with a fresh RFC-4122 identifier and the current
    /// timestamp
    pub fn new(
        event_type: impl Into<String>,
        detail: impl Into<String>,
        outcome: impl Into<String>,
        outcome_detail: impl Into<String>,
        object: impl Into<String>,
        agent: impl Into<String>,
    ) -> Self {
        Self {
            identifier: Uuid::new_v4(),
            event_type: event_type.into(),
            date_time: Utc::now(),
            detail: detail.into(),
            outcome: outcome.into(),
            outcome_detail: outcome_detail.into(),
            object: object.into(),
            agent: agent.into(),
        }
    }
}

// ============================================================================
// Institutions and Paging
// ============================================================================

/// A partner institution known to the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Institution {
    pub id: i64,
    /// Domain-style identifier, e.g. "uc.edu"
    pub identifier: String,
    pub name: String,
}

/// List envelope returned by registry collection endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paged<T> {
    pub results: Vec<T>,
    pub total: i64,
    pub page: i32,
    pub page_size: i32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_status() -> ProcessStatus {
        ProcessStatus {
            id: None,
            action: Action::Ingest,
            bag_date: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            bucket: "receiving.uc.edu".to_string(),
            date: Utc.with_ymd_and_hms(2024, 3, 1, 12, 5, 0).unwrap(),
            etag: "abc123".to_string(),
            generic_file_identifier: String::new(),
            institution: "uc.edu".to_string(),
            name: "cin.675812.tar".to_string(),
            note: "Bag received".to_string(),
            object_identifier: "uc.edu/cin.675812".to_string(),
            outcome: "Success".to_string(),
            retry: true,
            reviewed: false,
            stage: Stage::Receive,
            state: None,
            status: Status::Pending,
            node: "worker-01".to_string(),
            pid: 4711,
            needs_admin_review: false,
        }
    }

    #[test]
    fn test_status_wire_round_trip() {
        let status = sample_status();
        let json = serde_json::to_string(&status).unwrap();
        let decoded: ProcessStatus = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded.action, status.action);
        assert_eq!(decoded.stage, status.stage);
        assert_eq!(decoded.status, status.status);
        assert_eq!(decoded.retry, status.retry);
        assert_eq!(decoded.reviewed, status.reviewed);
        assert_eq!(decoded.note, status.note);
        assert_eq!(decoded.bag_date, status.bag_date);
        assert_eq!(decoded.date, status.date);
    }

    #[test]
    fn test_status_id_never_serialized() {
        let mut status = sample_status();
        status.id = Some(42);

        let json = serde_json::to_string(&status).unwrap();
        assert!(!json.contains("\"id\""));

        // but a server-returned id is picked up on read
        let with_id = format!("{{\"id\":42,{}", &json[1..]);
        let decoded: ProcessStatus = serde_json::from_str(&with_id).unwrap();
        assert_eq!(decoded.id, Some(42));
    }

    #[test]
    fn test_enum_wire_spelling() {
        assert_eq!(serde_json::to_string(&Action::Ingest).unwrap(), "\"Ingest\"");
        assert_eq!(serde_json::to_string(&Stage::Requested).unwrap(), "\"Requested\"");
        assert_eq!(serde_json::to_string(&Status::Cancelled).unwrap(), "\"Cancelled\"");
        assert_eq!(
            serde_json::to_string(&ChecksumAlgorithm::Sha256).unwrap(),
            "\"sha256\""
        );
    }

    #[test]
    fn test_algorithm_from_str() {
        assert_eq!("md5".parse::<ChecksumAlgorithm>().unwrap(), ChecksumAlgorithm::Md5);
        assert_eq!("SHA256".parse::<ChecksumAlgorithm>().unwrap(), ChecksumAlgorithm::Sha256);
        assert!("sha512".parse::<ChecksumAlgorithm>().is_err());
    }

    #[test]
    fn test_data_root_check() {
        assert!(IngestFile::new("data/object.properties", 1).is_under_data_root());
        assert!(!IngestFile::new("manifest-md5.txt", 1).is_under_data_root());
    }

    #[test]
    fn test_latest_checksum_is_max_by_timestamp() {
        let mut file = GenericFile {
            id: Some(1),
            identifier: "uc.edu/cin.675812/data/object.properties".to_string(),
            uri: "https://storage.example.org/obj1".to_string(),
            size: 128,
            checksums: vec![],
        };

        // deliberately out of chronological order
        let mut newest = ChecksumAttribute::new(ChecksumAlgorithm::Md5, "dddd");
        newest.date_time = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let mut oldest = ChecksumAttribute::new(ChecksumAlgorithm::Md5, "aaaa");
        oldest.date_time = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
        let mut middle = ChecksumAttribute::new(ChecksumAlgorithm::Md5, "bbbb");
        middle.date_time = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        file.checksums = vec![middle, newest, oldest];

        let latest = file.latest_checksum(ChecksumAlgorithm::Md5).unwrap();
        assert_eq!(latest.digest, "dddd");
        assert!(file.latest_checksum(ChecksumAlgorithm::Sha256).is_none());
    }

    #[test]
    fn test_event_identifier_is_client_generated() {
        let event = PremisEvent::new("ingest", "copied to storage", "Success", "", "bagflow", "bagflow ingest worker");
        assert!(!event.identifier.is_nil());
        let json = serde_json::to_string(&event).unwrap();
        let decoded: PremisEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.identifier, event.identifier);
    }
}
