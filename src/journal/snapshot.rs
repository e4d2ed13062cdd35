//! Snapshot Manager
//!
//! A snapshot is a JSONL file: one `SnapshotMeta` line followed by one
//! `Change` per stored row (users, then events, then swaps).

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use crate::types::{Change, Event, SnapshotMeta, SwapRequest, User};
use crate::utils::{atomic_write_with, replace_backup};

use super::log::{JournalConfig, JournalError, JournalResult};

/// Borrowed view of every row to persist
#[derive(Debug, Clone, Copy)]
pub struct SnapshotRows<'a> {
    pub users: &'a [User],
    pub events: &'a [Event],
    pub swaps: &'a [SwapRequest],
}

/// Snapshot Manager handles creating and loading snapshots
pub struct SnapshotManager {
    config: JournalConfig,
}

impl SnapshotManager {
    pub fn new(config: JournalConfig) -> Self {
        Self { config }
    }

    /// Write a new snapshot, keeping the current one as `previous.jsonl`
    pub fn create_with_backup(
        &self,
        last_seq: u64,
        rows: SnapshotRows<'_>,
    ) -> JournalResult<SnapshotMeta> {
        let latest_path = self.config.latest_snapshot_path();
        let staged_path = latest_path.with_extension("next");
        fs::create_dir_all(self.config.snapshots_dir())?;

        let meta = SnapshotMeta::new(
            last_seq,
            rows.users.len(),
            rows.events.len(),
            rows.swaps.len(),
        );

        atomic_write_with(&staged_path, |file| write_rows(file, &meta, rows))?;
        replace_backup(&latest_path, self.config.previous_snapshot_path())?;
        fs::rename(&staged_path, &latest_path)?;

        tracing::info!(
            last_seq,
            users = meta.user_count,
            events = meta.event_count,
            swaps = meta.swap_count,
            "snapshot written"
        );

        Ok(meta)
    }

    /// Load the latest snapshot, `Ok(None)` if none was ever written
    pub fn load_latest(&self) -> JournalResult<Option<(SnapshotMeta, Vec<Change>)>> {
        load_file(&self.config.latest_snapshot_path())
    }

    /// Load the backup snapshot
    pub fn load_previous(&self) -> JournalResult<Option<(SnapshotMeta, Vec<Change>)>> {
        let loaded = load_file(&self.config.previous_snapshot_path())?;
        if let Some((meta, _)) = &loaded {
            tracing::warn!(last_seq = meta.last_seq, "recovered from backup snapshot");
        }
        Ok(loaded)
    }
}

fn to_io(e: serde_json::Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, e)
}

fn write_rows(file: &mut File, meta: &SnapshotMeta, rows: SnapshotRows<'_>) -> io::Result<()> {
    writeln!(file, "{}", meta.to_json_line().map_err(to_io)?)?;

    let changes = rows
        .users
        .iter()
        .cloned()
        .map(Change::UserSaved)
        .chain(rows.events.iter().cloned().map(Change::EventSaved))
        .chain(rows.swaps.iter().cloned().map(Change::SwapSaved));

    for change in changes {
        writeln!(file, "{}", serde_json::to_string(&change).map_err(to_io)?)?;
    }
    Ok(())
}

fn load_file(path: &Path) -> JournalResult<Option<(SnapshotMeta, Vec<Change>)>> {
    if !path.exists() {
        return Ok(None);
    }

    let reader = BufReader::new(File::open(path)?);
    let mut lines = reader.lines();

    let meta_line = lines
        .next()
        .ok_or_else(|| JournalError::SnapshotCorrupted("Empty snapshot".to_string()))??;
    let meta = SnapshotMeta::from_json_line(&meta_line)
        .map_err(|e| JournalError::SnapshotCorrupted(format!("Metadata: {}", e)))?;

    let mut rows = Vec::with_capacity(meta.row_count());
    for (line_num, line) in lines.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let change: Change = serde_json::from_str(&line).map_err(|e| {
            JournalError::SnapshotCorrupted(format!("Line {}: {}", line_num + 2, e))
        })?;
        rows.push(change);
    }

    if rows.len() != meta.row_count() {
        return Err(JournalError::SnapshotCorrupted(format!(
            "Expected {} rows, found {}",
            meta.row_count(),
            rows.len()
        )));
    }

    Ok(Some((meta, rows)))
}
