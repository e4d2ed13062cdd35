//! Log rotation
//!
//! After a snapshot, records already folded into it are moved out of the
//! active journal so startup only replays the tail.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use crate::utils::atomic_write_with;

use super::log::{JournalConfig, JournalResult};

/// Log rotation manager for journal archives
pub struct LogRotation {
    config: JournalConfig,
}

impl LogRotation {
    pub fn new(config: JournalConfig) -> Self {
        Self { config }
    }

    /// Split the journal at `snapshot_seq`
    ///
    /// Records with `seq <= snapshot_seq` go to
    /// `archive/journal_<first>_to_<snapshot_seq>.jsonl`; later records stay
    /// in the active journal. Recovery from the backup snapshot reads the
    /// archive, so folded records are never dropped.
    pub fn rotate_after_snapshot(&self, snapshot_seq: u64) -> JournalResult<Option<PathBuf>> {
        let journal_path = self.config.journal_path();
        if !journal_path.exists() {
            return Ok(None);
        }

        let reader = BufReader::new(File::open(&journal_path)?);
        let mut folded = Vec::new();
        let mut keep = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match extract_seq(&line) {
                Some(seq) if seq <= snapshot_seq => folded.push((seq, line)),
                // Unparseable lines stay where recovery will warn about them
                _ => keep.push(line),
            }
        }

        if folded.is_empty() {
            return Ok(None);
        }

        let first_seq = folded.iter().map(|(seq, _)| *seq).min().unwrap_or(0);
        let archive_path = self
            .config
            .archive_dir()
            .join(format!("journal_{}_to_{}.jsonl", first_seq, snapshot_seq));
        atomic_write_with(&archive_path, |file| {
            for (_, line) in &folded {
                writeln!(file, "{}", line)?;
            }
            Ok(())
        })?;

        atomic_write_with(&journal_path, |file| {
            for line in &keep {
                writeln!(file, "{}", line)?;
            }
            Ok(())
        })?;

        tracing::debug!(
            rotated = folded.len(),
            kept = keep.len(),
            archive = %archive_path.display(),
            "journal rotated"
        );

        Ok(Some(archive_path))
    }

    /// Archive files, oldest first
    pub fn list_archives(&self) -> JournalResult<Vec<PathBuf>> {
        let archive_dir = self.config.archive_dir();
        if !archive_dir.exists() {
            return Ok(Vec::new());
        }

        let mut archives = Vec::new();
        for entry in fs::read_dir(&archive_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) == Some("jsonl") {
                archives.push(path);
            }
        }
        archives.sort_by_key(|path| archive_start(path));
        Ok(archives)
    }
}

fn extract_seq(line: &str) -> Option<u64> {
    let value: serde_json::Value = serde_json::from_str(line).ok()?;
    value.get("seq")?.as_u64()
}

/// First sequence number encoded in an archive filename
fn archive_start(path: &std::path::Path) -> u64 {
    path.file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.strip_prefix("journal_"))
        .and_then(|s| s.split('_').next())
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}
