//! Atomic I/O operations with file locking

use std::fs::{self, OpenOptions};
use std::io::Write;

use fs2::FileExt;

use crate::{Error, NormalizedPath, Result};

/// Write content atomically to a file.
///
/// Writes a sibling temp file under an advisory lock, syncs it, then renames
/// it over the target so readers never observe a partial file.
pub fn write_atomic(path: &NormalizedPath, content: &[u8]) -> Result<()> {
    let native_path = path.to_native();

    if let Some(parent) = native_path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let temp_name = format!(
        ".{}.{}.tmp",
        native_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = native_path.with_file_name(&temp_name);

    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file.lock_exclusive().map_err(|_| Error::LockFailed {
        path: native_path.clone(),
    })?;
    temp_file
        .write_all(content)
        .map_err(|e| Error::io(&temp_path, e))?;
    temp_file.sync_all().map_err(|e| Error::io(&temp_path, e))?;
    temp_file.unlock().map_err(|_| Error::LockFailed {
        path: native_path.clone(),
    })?;

    fs::rename(&temp_path, &native_path).map_err(|e| Error::io(&native_path, e))?;
    Ok(())
}

pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Read a file, treating a missing file as `None`.
pub fn read_text_opt(path: &NormalizedPath) -> Result<Option<String>> {
    let native_path = path.to_native();
    match fs::read_to_string(&native_path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(&native_path, e)),
    }
}

pub fn write_text(path: &NormalizedPath, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes())
}

/// Read a newline-delimited list, dropping blank lines.
pub fn read_lines(path: &NormalizedPath) -> Result<Option<Vec<String>>> {
    Ok(read_text_opt(path)?.map(|text| {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }))
}

/// Write a list sorted and de-duplicated, one entry per line.
pub fn write_sorted_lines<I, S>(path: &NormalizedPath, lines: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut entries: Vec<String> = lines
        .into_iter()
        .map(|line| line.as_ref().trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();
    entries.sort();
    entries.dedup();

    let mut content = entries.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    write_text(path, &content)
}

/// Delete a file, returning whether it existed.
pub fn remove_file_if_exists(path: &NormalizedPath) -> Result<bool> {
    let native_path = path.to_native();
    match fs::remove_file(&native_path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io(&native_path, e)),
    }
}

/// Whether `dir` exists and has no entries at all.
pub fn is_empty_dir(dir: &NormalizedPath) -> Result<bool> {
    if !dir.is_dir() {
        return Ok(false);
    }
    let native = dir.to_native();
    let mut entries = fs::read_dir(&native).map_err(|e| Error::io(&native, e))?;
    Ok(entries.next().is_none())
}

/// Remove empty directories from `start` upward.
///
/// Stops at the first non-empty directory or when reaching any of `stop_at`.
/// Returns the directories removed, deepest first.
pub fn prune_empty_dirs(
    start: &NormalizedPath,
    stop_at: &[NormalizedPath],
) -> Result<Vec<NormalizedPath>> {
    let mut removed = Vec::new();
    let mut current = Some(start.clone());

    while let Some(dir) = current {
        let here = dir.as_str().trim_end_matches('/');
        if stop_at
            .iter()
            .any(|stop| stop.as_str().trim_end_matches('/') == here)
        {
            break;
        }
        if !is_empty_dir(&dir)? {
            break;
        }
        let native = dir.to_native();
        fs::remove_dir(&native).map_err(|e| Error::io(&native, e))?;
        tracing::debug!(dir = %dir, "Removed empty directory");
        current = dir.parent();
        removed.push(dir);
    }

    Ok(removed)
}
