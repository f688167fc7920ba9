// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Small filesystem helpers shared by the store, lock and transaction files.

use serde::de::DeserializeOwned;
use serde::Serialize;
use spool_core::Clock;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};

/// Temporary sibling path, unique per call so concurrent writers never share one.
fn tmp_path(path: &Path) -> PathBuf {
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    path.with_file_name(format!(".{}.{}.tmp", name, spool_core::id::random_suffix(8)))
}

fn write_tmp<T: Serialize>(path: &Path, value: &T) -> io::Result<PathBuf> {
    let tmp = tmp_path(path);
    let json = serde_json::to_vec_pretty(value).map_err(io::Error::other)?;
    let mut file = std::fs::File::create(&tmp)?;
    file.write_all(&json)?;
    file.sync_all()?;
    Ok(tmp)
}

/// Replace `path` with the JSON encoding of `value` (write temp, then rename).
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    let tmp = write_tmp(path, value)?;
    std::fs::rename(&tmp, path).inspect_err(|_| {
        let _ = std::fs::remove_file(&tmp);
    })
}

/// Create `path` with the JSON encoding of `value`, failing with
/// `AlreadyExists` if it is already present.
///
/// The file appears fully written or not at all: the content goes to a temp
/// file which is then hard-linked into place, and linking never replaces an
/// existing file.
pub(crate) fn write_json_new<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    let tmp = write_tmp(path, value)?;
    let linked = std::fs::hard_link(&tmp, path);
    let _ = std::fs::remove_file(&tmp);
    linked
}

/// Read and decode a JSON file. `Ok(None)` if it does not exist.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> io::Result<Option<Result<T, serde_json::Error>>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Remove a file, reporting whether it existed.
pub(crate) fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Age of a file by modification time, measured against `clock`.
///
/// `Ok(None)` if the file does not exist.
pub(crate) fn mtime_age(path: &Path, clock: &impl Clock) -> io::Result<Option<Duration>> {
    let meta = match std::fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    let modified_ms = meta
        .modified()?
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;
    Ok(Some(clock.since(modified_ms)))
}

/// Files directly inside `dir` whose name ends with `suffix`.
///
/// A missing directory yields an empty list.
pub(crate) fn files_with_suffix(dir: &Path, suffix: &str) -> io::Result<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let keep = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(suffix) && !n.starts_with('.'));
        if keep {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// File name of `path` with `suffix` removed.
pub(crate) fn stem_before<'a>(path: &'a Path, suffix: &str) -> Option<&'a str> {
    path.file_name()?.to_str()?.strip_suffix(suffix)
}

#[cfg(test)]
#[path = "fsio_tests.rs"]
mod tests;
