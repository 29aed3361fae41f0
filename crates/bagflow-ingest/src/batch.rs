//! Fixed-size batching over files that need saving
//!
//! The store worker drives one of these per object, pulling chunks of
//! `needs_save` files for bulk transfer. The iterator is single-owner;
//! exactly one worker advances it.

use bagflow_common::error::{BagflowError, Result};
use bagflow_common::types::IngestFile;

/// Streams the `needs_save` subset of an ordered file list in chunks
///
/// The cursor only moves forward; entries already visited are never
/// rescanned. Once the end of the list is reached, every further call
/// fails with [`BagflowError::ExhaustedIteration`].
#[derive(Debug)]
pub struct BatchIterator {
    files: Vec<IngestFile>,
    batch_size: usize,
    cursor: usize,
}

impl BatchIterator {
    /// Build an iterator over the full ordered file list.
    /// `batch_size` must be at least 1.
    pub fn new(files: Vec<IngestFile>, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(BagflowError::config("batch size must be at least 1"));
        }
        Ok(Self {
            files,
            batch_size,
            cursor: 0,
        })
    }

    /// Collect the next chunk of files needing work.
    ///
    /// Returns up to `batch_size` entries with `needs_save` set, fewer if
    /// the list runs out first. A non-empty short batch is a success; an
    /// empty one is the sticky end-of-data condition.
    pub fn next_batch(&mut self) -> Result<Vec<IngestFile>> {
        let mut batch = Vec::with_capacity(self.batch_size);

        while self.cursor < self.files.len() && batch.len() < self.batch_size {
            let file = &self.files[self.cursor];
            self.cursor += 1;
            if file.needs_save {
                batch.push(file.clone());
            }
        }

        if batch.is_empty() {
            return Err(BagflowError::ExhaustedIteration);
        }
        Ok(batch)
    }

    /// Entries not yet visited by the cursor
    pub fn remaining(&self) -> usize {
        self.files.len() - self.cursor
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn files_with_flags(flags: &[bool]) -> Vec<IngestFile> {
        flags
            .iter()
            .enumerate()
            .map(|(i, needs_save)| {
                let mut file = IngestFile::new(format!("data/file_{i:03}.txt"), 10);
                file.needs_save = *needs_save;
                file
            })
            .collect()
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        assert!(BatchIterator::new(Vec::new(), 0).is_err());
    }

    #[test]
    fn test_partitions_matching_entries() {
        // 7 matching entries, batch size 3: chunks of 3, 3, 1
        let flags = [true, false, true, true, true, false, true, true, true];
        let mut iter = BatchIterator::new(files_with_flags(&flags), 3).unwrap();

        assert_eq!(iter.next_batch().unwrap().len(), 3);
        assert_eq!(iter.next_batch().unwrap().len(), 3);
        assert_eq!(iter.next_batch().unwrap().len(), 1);
        assert!(matches!(
            iter.next_batch(),
            Err(BagflowError::ExhaustedIteration)
        ));
    }

    #[test]
    fn test_exhaustion_is_sticky() {
        let mut iter = BatchIterator::new(files_with_flags(&[true]), 5).unwrap();
        assert_eq!(iter.next_batch().unwrap().len(), 1);
        for _ in 0..3 {
            assert!(matches!(
                iter.next_batch(),
                Err(BagflowError::ExhaustedIteration)
            ));
        }
    }

    #[test]
    fn test_no_matching_entries_fails_immediately() {
        let mut iter = BatchIterator::new(files_with_flags(&[false, false, false]), 2).unwrap();
        assert!(matches!(
            iter.next_batch(),
            Err(BagflowError::ExhaustedIteration)
        ));
    }

    #[test]
    fn test_empty_list_fails_immediately() {
        let mut iter = BatchIterator::new(Vec::new(), 2).unwrap();
        assert!(iter.next_batch().is_err());
    }

    #[test]
    fn test_cursor_never_rewinds() {
        let flags = [true, true, true, true];
        let mut iter = BatchIterator::new(files_with_flags(&flags), 2).unwrap();

        let first = iter.next_batch().unwrap();
        let second = iter.next_batch().unwrap();
        assert_eq!(first[0].path, "data/file_000.txt");
        assert_eq!(first[1].path, "data/file_001.txt");
        assert_eq!(second[0].path, "data/file_002.txt");
        assert_eq!(second[1].path, "data/file_003.txt");
        assert_eq!(iter.remaining(), 0);
    }

    #[test]
    fn test_101_files_every_fifth_skipped() {
        // 101 files, every 5th (0-based 4, 9, ..., 99) does not need saving:
        // 81 matching entries, batch size 10 -> eight batches of 10, one of 1
        let flags: Vec<bool> = (0..101).map(|i| i % 5 != 4).collect();
        let mut iter = BatchIterator::new(files_with_flags(&flags), 10).unwrap();

        for _ in 0..8 {
            let batch = iter.next_batch().unwrap();
            assert_eq!(batch.len(), 10);
            assert!(batch.iter().all(|f| f.needs_save));
        }
        assert_eq!(iter.next_batch().unwrap().len(), 1);
        assert!(matches!(
            iter.next_batch(),
            Err(BagflowError::ExhaustedIteration)
        ));
    }
}
