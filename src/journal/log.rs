//! Append-only transaction log and startup recovery

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::types::{Change, JournalRecord, SnapshotMeta, UserId};

use super::rotation::LogRotation;
use super::snapshot::{SnapshotManager, SnapshotRows};

/// Configuration for the journal
#[derive(Debug, Clone)]
pub struct JournalConfig {
    /// Path to the data directory
    pub data_dir: PathBuf,
    /// Records appended before a snapshot is due
    pub snapshot_threshold: usize,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            snapshot_threshold: 1000,
        }
    }
}

impl JournalConfig {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    pub fn with_snapshot_threshold(mut self, threshold: usize) -> Self {
        self.snapshot_threshold = threshold.max(1);
        self
    }

    pub fn journal_path(&self) -> PathBuf {
        self.data_dir.join("journal.jsonl")
    }

    pub fn snapshots_dir(&self) -> PathBuf {
        self.data_dir.join("snapshots")
    }

    pub fn latest_snapshot_path(&self) -> PathBuf {
        self.snapshots_dir().join("latest.jsonl")
    }

    pub fn previous_snapshot_path(&self) -> PathBuf {
        self.snapshots_dir().join("previous.jsonl")
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.data_dir.join("archive")
    }
}

/// Result type for journal operations
pub type JournalResult<T> = Result<T, JournalError>;

/// Errors that can occur in journal operations
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Snapshot corrupted: {0}")]
    SnapshotCorrupted(String),

    #[error("Journal is read-only: a failed append could not be rolled back")]
    Poisoned,
}

/// State rebuilt from disk at startup
#[derive(Debug, Default)]
pub struct Recovery {
    /// Rows to apply in order: snapshot rows first, then replayed changes
    pub changes: Vec<Change>,
    /// Snapshot the recovery started from, if any
    pub snapshot: Option<SnapshotMeta>,
    /// Number of journal records replayed on top of the snapshot
    pub replayed: usize,
    /// Highest sequence number seen
    pub last_seq: u64,
}

/// Append-only journal of committed store transactions
pub struct Journal {
    config: JournalConfig,
    /// Next sequence number to assign
    next_seq: u64,
    /// Records appended since the last snapshot
    records_since_snapshot: usize,
    /// Set when a failed append left bytes on disk that could not be removed
    poisoned: bool,
}

impl Journal {
    pub fn new(config: JournalConfig) -> Self {
        Self {
            config,
            next_seq: 1,
            records_since_snapshot: 0,
            poisoned: false,
        }
    }

    pub fn config(&self) -> &JournalConfig {
        &self.config
    }

    /// Sequence number of the most recently appended record
    pub fn last_seq(&self) -> u64 {
        self.next_seq - 1
    }

    pub fn should_snapshot(&self) -> bool {
        self.records_since_snapshot >= self.config.snapshot_threshold
    }

    /// Load snapshot + journal tail and position the sequence counter
    pub fn initialize(&mut self) -> JournalResult<Recovery> {
        crate::utils::cleanup_temp_files(&self.config.data_dir)?;
        crate::utils::cleanup_temp_files(self.config.snapshots_dir())?;

        let snapshots = SnapshotManager::new(self.config.clone());
        // A crash between backing up and promoting a snapshot leaves only
        // previous.jsonl; the journal has not been rotated past it yet.
        let (loaded, from_latest) = match snapshots.load_latest() {
            Ok(Some(loaded)) => (Some(loaded), true),
            Ok(None) => (snapshots.load_previous()?, false),
            Err(e) => {
                tracing::warn!(error = %e, "latest snapshot unreadable, trying backup");
                (snapshots.load_previous()?, false)
            }
        };

        let mut recovery = Recovery::default();
        let mut after_seq = 0;
        if let Some((meta, rows)) = loaded {
            after_seq = meta.last_seq;
            recovery.last_seq = meta.last_seq;
            recovery.changes = rows;
            recovery.snapshot = Some(meta);
        }

        let mut records = Vec::new();
        if !from_latest {
            // Records between the fallback snapshot and the lost one were
            // already rotated out of the active journal.
            for path in LogRotation::new(self.config.clone()).list_archives()? {
                records.extend(read_records(&path)?);
            }
        }
        records.extend(self.load_records()?);
        records.retain(|record| record.seq > after_seq);
        records.sort_by_key(|record| record.seq);
        records.dedup_by_key(|record| record.seq);

        for record in records {
            recovery.last_seq = recovery.last_seq.max(record.seq);
            recovery.replayed += 1;
            recovery.changes.extend(record.changes);
        }

        self.truncate_torn_tail()?;
        self.next_seq = recovery.last_seq + 1;
        self.records_since_snapshot = recovery.replayed;

        tracing::info!(
            snapshot_seq = after_seq,
            replayed = recovery.replayed,
            last_seq = recovery.last_seq,
            "journal recovered"
        );

        Ok(recovery)
    }

    /// Load every parseable record in the active journal file
    ///
    /// A torn trailing line from a crash mid-append is skipped.
    pub fn load_records(&self) -> JournalResult<Vec<JournalRecord>> {
        read_records(&self.config.journal_path())
    }

    /// Cut an unterminated final line so the next append starts clean
    fn truncate_torn_tail(&self) -> JournalResult<()> {
        let path = self.config.journal_path();
        if !path.exists() {
            return Ok(());
        }

        let bytes = std::fs::read(&path)?;
        let keep = bytes
            .iter()
            .rposition(|b| *b == b'\n')
            .map_or(0, |pos| pos + 1);
        if keep < bytes.len() {
            tracing::warn!(dropped_bytes = bytes.len() - keep, "truncating torn journal tail");
            let file = OpenOptions::new().write(true).open(&path)?;
            file.set_len(keep as u64)?;
            file.sync_all()?;
        }
        Ok(())
    }

    /// Append one transaction and sync it to disk
    ///
    /// The sequence counter only advances once the line is durable. A write
    /// or sync failure truncates the file back to its previous length; if
    /// that fails too, the journal refuses further appends.
    pub fn append(
        &mut self,
        actor: Option<UserId>,
        changes: Vec<Change>,
    ) -> JournalResult<JournalRecord> {
        self.append_with(actor, changes, |file, line| writeln!(file, "{}", line))
    }

    fn append_with<W>(
        &mut self,
        actor: Option<UserId>,
        changes: Vec<Change>,
        write: W,
    ) -> JournalResult<JournalRecord>
    where
        W: FnOnce(&mut File, &str) -> io::Result<()>,
    {
        if self.poisoned {
            return Err(JournalError::Poisoned);
        }

        let path = self.config.journal_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let record = JournalRecord::new(self.next_seq, actor, changes);
        let line = record.to_json_line()?;

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        let len = file.metadata()?.len();
        if let Err(e) = write(&mut file, &line).and_then(|_| file.sync_all()) {
            self.roll_back(&file, len);
            return Err(e.into());
        }

        self.next_seq += 1;
        self.records_since_snapshot += 1;

        Ok(record)
    }

    fn roll_back(&mut self, file: &File, len: u64) {
        match file.set_len(len).and_then(|_| file.sync_all()) {
            Ok(()) => tracing::warn!(len, "journal append failed, partial record discarded"),
            Err(e) => {
                self.poisoned = true;
                tracing::error!(
                    error = %e,
                    "journal append failed and could not be rolled back, refusing further appends"
                );
            }
        }
    }

    /// Snapshot the given rows at the current sequence and rotate the log
    pub fn write_snapshot(&mut self, rows: SnapshotRows<'_>) -> JournalResult<SnapshotMeta> {
        let last_seq = self.last_seq();
        let meta = SnapshotManager::new(self.config.clone()).create_with_backup(last_seq, rows)?;

        let rotation = LogRotation::new(self.config.clone());
        rotation.rotate_after_snapshot(last_seq)?;

        self.records_since_snapshot = 0;
        Ok(meta)
    }
}

fn read_records(path: &Path) -> JournalResult<Vec<JournalRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match JournalRecord::from_json_line(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    line = line_num + 1,
                    error = %e,
                    "skipping unparseable journal line"
                );
            }
        }
    }

    Ok(records)
}
