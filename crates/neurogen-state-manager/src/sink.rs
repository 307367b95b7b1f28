// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Destinations for change batches
//!
//! Snapshot files are a sequence of frames, each a little-endian `u64` byte
//! length followed by one bincode-encoded [`ChangeBatch`].

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::change_tracker::ChangeBatch;
use crate::{Result, StateError};

/// Largest frame [`read_snapshot_file`] will accept
pub const MAX_FRAME_BYTES: u64 = 256 * 1024 * 1024;

/// Anything that can durably accept batches.
///
/// Called from the persistence worker thread only.
pub trait PersistenceSink: Send {
    fn write_batch(&mut self, batch: &ChangeBatch) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Keeps every batch in memory. Clones share storage.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    batches: Arc<Mutex<Vec<ChangeBatch>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> Vec<ChangeBatch> {
        self.batches.lock().clone()
    }

    pub fn record_count(&self) -> usize {
        self.batches.lock().iter().map(ChangeBatch::len).sum()
    }
}

impl PersistenceSink for MemorySink {
    fn write_batch(&mut self, batch: &ChangeBatch) -> Result<()> {
        self.batches.lock().push(batch.clone());
        Ok(())
    }
}

/// Appends length-prefixed bincode frames to a file
pub struct SnapshotFileSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl SnapshotFileSink {
    /// Create or truncate `path`
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| {
            StateError::PersistenceError(format!("Create {} failed: {}", path.display(), e))
        })?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    /// Open `path` for appending, creating it if needed
    pub fn append(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                StateError::PersistenceError(format!("Open {} failed: {}", path.display(), e))
            })?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PersistenceSink for SnapshotFileSink {
    fn write_batch(&mut self, batch: &ChangeBatch) -> Result<()> {
        let encoded = bincode::serialize(batch)
            .map_err(|e| StateError::SerializationError(format!("Serialize failed: {}", e)))?;
        self.writer.write_all(&(encoded.len() as u64).to_le_bytes())?;
        self.writer.write_all(&encoded)?;
        debug!(
            target: "neurogen-state",
            "Wrote batch {} ({} records, {} bytes) to {}",
            batch.sequence,
            batch.len(),
            encoded.len(),
            self.path.display()
        );
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

impl Drop for SnapshotFileSink {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

/// Read back every batch written by a [`SnapshotFileSink`].
///
/// A truncated trailing frame is reported as an error rather than skipped.
pub fn read_snapshot_file(path: impl AsRef<Path>) -> Result<Vec<ChangeBatch>> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| StateError::PersistenceError(format!("Read {} failed: {}", path.display(), e)))?;
    let mut remaining = file.metadata()?.len();
    let mut reader = BufReader::new(file);
    let mut batches = Vec::new();

    loop {
        let mut len_buf = [0u8; 8];
        match reader.read_exact(&mut len_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
        remaining = remaining.saturating_sub(len_buf.len() as u64);
        let len = u64::from_le_bytes(len_buf);
        if len > MAX_FRAME_BYTES {
            return Err(StateError::SerializationError(format!(
                "Frame of {} bytes in {} exceeds the {} byte limit",
                len,
                path.display(),
                MAX_FRAME_BYTES
            )));
        }
        if len > remaining {
            return Err(StateError::PersistenceError(format!(
                "Truncated frame in {}: {} bytes declared, {} left",
                path.display(),
                len,
                remaining
            )));
        }
        remaining -= len;
        let mut frame = vec![0u8; len as usize];
        reader.read_exact(&mut frame).map_err(|e| {
            StateError::PersistenceError(format!("Truncated frame in {}: {}", path.display(), e))
        })?;
        let batch = bincode::deserialize(&frame)
            .map_err(|e| StateError::SerializationError(format!("Deserialize failed: {}", e)))?;
        batches.push(batch);
    }

    Ok(batches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use neurogen_components::{ChangeRecord, ComponentKind, Position};

    fn batch(sequence: u64, ids: &[usize]) -> ChangeBatch {
        ChangeBatch {
            sequence,
            records: ids
                .iter()
                .map(|&id| ChangeRecord {
                    kind: ComponentKind::Axon,
                    id,
                    position: Position::uniform(id as f64),
                    propagation_rate: 0.5,
                    energy_level: 99.0,
                })
                .collect(),
        }
    }

    #[test]
    fn test_memory_sink_shares_storage() {
        let sink = MemorySink::new();
        let mut writer = sink.clone();
        writer.write_batch(&batch(0, &[1, 2])).unwrap();
        writer.write_batch(&batch(1, &[3])).unwrap();
        assert_eq!(sink.batches().len(), 2);
        assert_eq!(sink.record_count(), 3);
    }

    #[test]
    fn test_snapshot_file_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("changes.bin");

        {
            let mut sink = SnapshotFileSink::create(&path).unwrap();
            sink.write_batch(&batch(0, &[1, 2])).unwrap();
            sink.write_batch(&batch(1, &[7])).unwrap();
            sink.flush().unwrap();
        }
        {
            let mut sink = SnapshotFileSink::append(&path).unwrap();
            sink.write_batch(&batch(2, &[])).unwrap();
        }

        let loaded = read_snapshot_file(&path).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[1], batch(1, &[7]));
        assert!(loaded[2].is_empty());
    }

    #[test]
    fn test_truncated_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("changes.bin");
        {
            let mut sink = SnapshotFileSink::create(&path).unwrap();
            sink.write_batch(&batch(0, &[1])).unwrap();
        }
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();

        assert!(matches!(
            read_snapshot_file(&path),
            Err(StateError::PersistenceError(_))
        ));
    }

    #[test]
    fn test_corrupt_length_prefix_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("changes.bin");
        let mut bytes = u64::MAX.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0u8; 16]);
        std::fs::write(&path, &bytes).unwrap();

        assert!(matches!(
            read_snapshot_file(&path),
            Err(StateError::SerializationError(_))
        ));

        // within the limit but longer than the file
        let mut bytes = 4096u64.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0u8; 16]);
        std::fs::write(&path, &bytes).unwrap();

        assert!(matches!(
            read_snapshot_file(&path),
            Err(StateError::PersistenceError(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_snapshot_file(dir.path().join("absent.bin")).is_err());
    }
}
