//! Atomic file operations
//!
//! Snapshots and rotated journals are written to a `.tmp` sibling, synced,
//! then renamed over the destination, so readers only ever see the old
//! file or the complete new one.

use std::fs::{self, File};
use std::io;
use std::path::Path;

/// Atomically write a file using a writer function
///
/// ```ignore
/// atomic_write_with("data/snapshots/latest.jsonl", |file| {
///     writeln!(file, "line1")?;
///     Ok(())
/// })?;
/// ```
pub fn atomic_write_with<P, F>(path: P, write_fn: F) -> io::Result<()>
where
    P: AsRef<Path>,
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let path = path.as_ref();
    let temp_path = path.with_extension("tmp");

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = File::create(&temp_path)?;
    if let Err(e) = write_fn(&mut file).and_then(|_| file.sync_all()) {
        drop(file);
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    fs::rename(&temp_path, path)
}

/// Move `path` to `backup`, replacing any older backup
///
/// Returns `Ok(false)` when there was nothing to back up.
pub fn replace_backup<P1, P2>(path: P1, backup: P2) -> io::Result<bool>
where
    P1: AsRef<Path>,
    P2: AsRef<Path>,
{
    let path = path.as_ref();
    let backup = backup.as_ref();

    if !path.exists() {
        return Ok(false);
    }
    if backup.exists() {
        fs::remove_file(backup)?;
    }
    fs::rename(path, backup)?;
    Ok(true)
}

/// Remove `.tmp` leftovers from an interrupted write
pub fn cleanup_temp_files<P: AsRef<Path>>(dir: P) -> io::Result<usize> {
    let dir = dir.as_ref();
    let mut cleaned = 0;

    if !dir.exists() {
        return Ok(0);
    }

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().map(|e| e == "tmp").unwrap_or(false) {
            fs::remove_file(&path)?;
            cleaned += 1;
        }
    }

    Ok(cleaned)
}
