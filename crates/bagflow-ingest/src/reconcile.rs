//! Checksum reconciliation against the registry
//!
//! For every file freshly extracted from an incoming bag, decide whether its
//! content actually changed relative to what the registry already holds.
//! Unchanged files skip both the storage transfer and the new provenance
//! events a save would generate; under at-least-once delivery most of a
//! re-delivered bag reconciles to "unchanged".

use bagflow_common::error::{BagflowError, Result};
use bagflow_common::identifier::FileIdentifier;
use bagflow_common::types::{ChecksumAlgorithm, GenericFile, IngestFile};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Counts reported by one reconciliation pass, for logging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Local files examined
    pub examined: usize,
    /// Local files the registry already knows by path
    pub matched: usize,
    /// Matched files whose latest registered digest equals the fresh one
    pub unchanged: usize,
}

/// Diffs fresh local digests against a remote file's checksum history
#[derive(Debug, Clone, Copy)]
pub struct Reconciler {
    /// Algorithm whose digests decide changed-vs-unchanged
    algorithm: ChecksumAlgorithm,
}

impl Reconciler {
    pub fn new(algorithm: ChecksumAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Reconcile one object's local file list against the registry's view.
    ///
    /// Local files are matched to remote files by original path, derived by
    /// stripping the leading `{institution}/{bag-name}/` from the remote
    /// identifier. A match marks the local file `existing_file`; if the
    /// most recent registered digest for the primary algorithm equals the
    /// freshly computed one, `needs_save` is cleared. Unmatched files are
    /// new and keep `needs_save`.
    ///
    /// A remote identifier that does not decompose, or a local path outside
    /// the `data/` payload root, aborts the pass with a
    /// `MalformedIdentifier` error. Treating malformed input as "new file"
    /// or "unchanged" would corrupt the diff.
    pub fn reconcile(
        &self,
        local: &mut [IngestFile],
        remote: &[GenericFile],
    ) -> Result<ReconcileSummary> {
        // only payload files are reconcilable; tag and manifest files never
        // reach the registry as generic files
        for file in local.iter() {
            if !file.is_under_data_root() {
                return Err(BagflowError::MalformedIdentifier(file.path.clone()));
            }
        }

        let mut by_path: HashMap<String, &GenericFile> = HashMap::with_capacity(remote.len());
        for remote_file in remote {
            let parsed = FileIdentifier::parse(&remote_file.identifier)?;
            by_path.insert(parsed.original_path(), remote_file);
        }

        let mut summary = ReconcileSummary {
            examined: local.len(),
            ..Default::default()
        };

        for file in local.iter_mut() {
            let Some(remote_file) = by_path.get(&file.path) else {
                debug!(path = %file.path, "file not registered, will save");
                continue;
            };

            file.existing_file = true;
            summary.matched += 1;

            let registered = remote_file.latest_checksum(self.algorithm);
            let fresh = file.checksum(self.algorithm);

            match (registered, fresh) {
                (Some(registered), Some(fresh)) if registered.digest == fresh.digest => {
                    file.needs_save = false;
                    summary.unchanged += 1;
                    debug!(path = %file.path, "digest unchanged, skipping save");
                }
                (Some(_), Some(_)) => {
                    debug!(path = %file.path, "digest changed, will save");
                }
                (_, None) => {
                    warn!(
                        path = %file.path,
                        algorithm = %self.algorithm,
                        "local file has no fresh digest, will save"
                    );
                }
                (None, _) => {
                    debug!(
                        path = %file.path,
                        algorithm = %self.algorithm,
                        "no registered digest for algorithm, will save"
                    );
                }
            }
        }

        debug!(
            examined = summary.examined,
            matched = summary.matched,
            unchanged = summary.unchanged,
            "reconciliation complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use bagflow_common::error::BagflowError;
    use bagflow_common::types::ChecksumAttribute;
    use chrono::{TimeZone, Utc};

    fn local_file(path: &str, md5: &str) -> IngestFile {
        let mut file = IngestFile::new(path, 1024);
        file.checksums
            .push(ChecksumAttribute::new(ChecksumAlgorithm::Md5, md5));
        file
    }

    fn remote_file(identifier: &str, digests: &[(&str, i32)]) -> GenericFile {
        let checksums = digests
            .iter()
            .map(|(digest, year)| {
                let mut attr = ChecksumAttribute::new(ChecksumAlgorithm::Md5, *digest);
                attr.date_time = Utc.with_ymd_and_hms(*year, 1, 1, 0, 0, 0).unwrap();
                attr
            })
            .collect();
        GenericFile {
            id: Some(7),
            identifier: identifier.to_string(),
            uri: "https://storage.example.org/blob".to_string(),
            size: 1024,
            checksums,
        }
    }

    #[test]
    fn test_unchanged_file_skips_save() {
        let mut local = vec![local_file("data/object.properties", "ffff")];
        // older differing digests must not matter; the 2024 entry wins
        let remote = vec![remote_file(
            "uc.edu/cin.675812/data/object.properties",
            &[("aaaa", 2021), ("ffff", 2024), ("bbbb", 2022)],
        )];

        let summary = Reconciler::new(ChecksumAlgorithm::Md5)
            .reconcile(&mut local, &remote)
            .unwrap();

        assert!(local[0].existing_file);
        assert!(!local[0].needs_save);
        assert_eq!(summary, ReconcileSummary { examined: 1, matched: 1, unchanged: 1 });
    }

    #[test]
    fn test_latest_digest_differs_forces_save() {
        // the newest entry differs even though an older one matches
        let mut local = vec![local_file("data/object.properties", "aaaa")];
        let remote = vec![remote_file(
            "uc.edu/cin.675812/data/object.properties",
            &[("aaaa", 2021), ("ffff", 2024)],
        )];

        Reconciler::new(ChecksumAlgorithm::Md5)
            .reconcile(&mut local, &remote)
            .unwrap();

        assert!(local[0].existing_file);
        assert!(local[0].needs_save);
    }

    #[test]
    fn test_new_file_keeps_needs_save() {
        let mut local = vec![local_file("data/new_file.xml", "cccc")];
        let remote = vec![remote_file(
            "uc.edu/cin.675812/data/object.properties",
            &[("ffff", 2024)],
        )];

        let summary = Reconciler::new(ChecksumAlgorithm::Md5)
            .reconcile(&mut local, &remote)
            .unwrap();

        assert!(!local[0].existing_file);
        assert!(local[0].needs_save);
        assert_eq!(summary.matched, 0);
    }

    #[test]
    fn test_malformed_remote_identifier_is_an_error() {
        let mut local = vec![local_file("data/object.properties", "ffff")];
        let remote = vec![remote_file("not-an-identifier", &[("ffff", 2024)])];

        let err = Reconciler::new(ChecksumAlgorithm::Md5)
            .reconcile(&mut local, &remote)
            .unwrap_err();

        match err {
            BagflowError::MalformedIdentifier(id) => assert_eq!(id, "not-an-identifier"),
            other => panic!("unexpected error: {other}"),
        }
        // the pass aborted without touching local flags
        assert!(!local[0].existing_file);
        assert!(local[0].needs_save);
    }

    #[test]
    fn test_local_path_outside_data_root_is_an_error() {
        let mut local = vec![
            local_file("data/object.properties", "ffff"),
            local_file("manifest-md5.txt", "dddd"),
        ];
        let remote = vec![remote_file(
            "uc.edu/cin.675812/data/object.properties",
            &[("ffff", 2024)],
        )];

        let err = Reconciler::new(ChecksumAlgorithm::Md5)
            .reconcile(&mut local, &remote)
            .unwrap_err();

        match err {
            BagflowError::MalformedIdentifier(path) => assert_eq!(path, "manifest-md5.txt"),
            other => panic!("unexpected error: {other}"),
        }
        // the pass aborted without touching local flags
        assert!(!local[0].existing_file);
        assert!(local[0].needs_save);
    }

    #[test]
    fn test_missing_registered_algorithm_forces_save() {
        let mut local = vec![local_file("data/object.properties", "ffff")];
        // remote history has no md5 entries at all
        let remote = vec![GenericFile {
            id: Some(7),
            identifier: "uc.edu/cin.675812/data/object.properties".to_string(),
            uri: "https://storage.example.org/blob".to_string(),
            size: 1024,
            checksums: vec![ChecksumAttribute::new(ChecksumAlgorithm::Sha256, "9999")],
        }];

        Reconciler::new(ChecksumAlgorithm::Md5)
            .reconcile(&mut local, &remote)
            .unwrap();

        assert!(local[0].existing_file);
        assert!(local[0].needs_save);
    }
}
