//! Tree snapshots and small filesystem probes shared by the flattener and the batcher.

use crate::error::{FlatmoveError, FlatmoveResult};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use walkdir::{DirEntry, WalkDir};

/// Kind of an entry captured in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Anything that is not a directory: regular files and symlinks alike.
    File,
    Dir,
}

/// One entry of a tree snapshot.
#[derive(Debug, Clone)]
pub struct TreeEntry {
    pub path: PathBuf,
    pub kind: EntryKind,
}

/// Captures every entry below `root` (the root itself excluded) in bottom-up order.
///
/// A directory is listed right after its own contents, so children always come
/// before their parent. Numbered siblings come first by value, the rest by name.
/// Symlinks are not followed. The snapshot is taken before anything is moved, which keeps
/// directories created during a run out of the walk.
pub fn snapshot(root: &Path) -> FlatmoveResult<Vec<TreeEntry>> {
    ensure_dir(root)?;

    WalkDir::new(root)
        .min_depth(1)
        .contents_first(true)
        .sort_by(sibling_order)
        .into_iter()
        .map(|entry| {
            let entry = entry.map_err(|e| FlatmoveError::TraversalFailed {
                path: e.path().unwrap_or(root).to_path_buf(),
                source: e,
            })?;
            let kind = if entry.file_type().is_dir() {
                EntryKind::Dir
            } else {
                EntryKind::File
            };
            Ok(TreeEntry {
                path: entry.into_path(),
                kind,
            })
        })
        .collect()
}

/// All-digit names (batch folders) come first in numeric order, so `2` sorts
/// before `10`. Everything else follows, by file name.
fn sibling_order(a: &DirEntry, b: &DirEntry) -> Ordering {
    sort_key(a.file_name()).cmp(&sort_key(b.file_name()))
}

fn sort_key(name: &OsStr) -> (bool, u64, &OsStr) {
    let number = name
        .to_str()
        .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|s| s.parse::<u64>().ok());
    (number.is_none(), number.unwrap_or(0), name)
}

/// Fails with `InvalidRoot` unless `root` is an existing directory.
pub fn ensure_dir(root: &Path) -> FlatmoveResult<()> {
    let metadata = fs::metadata(root).map_err(|e| FlatmoveError::InvalidRoot {
        path: root.to_path_buf(),
        source: e,
    })?;

    if metadata.is_dir() {
        Ok(())
    } else {
        Err(FlatmoveError::InvalidRoot {
            path: root.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
        })
    }
}

/// Reads the modification time of `path` in UTC.
pub fn modified_utc(path: &Path) -> FlatmoveResult<DateTime<Utc>> {
    let modified = fs::metadata(path)
        .and_then(|metadata| metadata.modified())
        .map_err(|e| metadata_failed(path, e))?;

    to_utc(modified).ok_or_else(|| {
        metadata_failed(
            path,
            io::Error::new(
                io::ErrorKind::InvalidData,
                "modification time out of representable range",
            ),
        )
    })
}

/// `None` when chrono cannot represent `time`.
fn to_utc(time: SystemTime) -> Option<DateTime<Utc>> {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => {
            DateTime::from_timestamp(i64::try_from(after.as_secs()).ok()?, after.subsec_nanos())
        }
        Err(before) => {
            let before = before.duration();
            let secs = i64::try_from(before.as_secs()).ok()?;
            match before.subsec_nanos() {
                0 => DateTime::from_timestamp(-secs, 0),
                nanos => DateTime::from_timestamp(-secs - 1, 1_000_000_000 - nanos),
            }
        }
    }
}

fn metadata_failed(path: &Path, source: io::Error) -> FlatmoveError {
    FlatmoveError::MetadataFailed {
        path: path.to_path_buf(),
        source,
    }
}

/// Returns true if the directory has zero entries right now.
pub fn is_empty_dir(path: &Path) -> FlatmoveResult<bool> {
    let mut entries = fs::read_dir(path).map_err(|e| metadata_failed(path, e))?;
    Ok(entries.next().is_none())
}

/// Removes `path` if it is an empty directory. Returns whether it was removed.
pub fn remove_if_empty(path: &Path) -> FlatmoveResult<bool> {
    if !path.is_dir() || !is_empty_dir(path)? {
        return Ok(false);
    }

    fs::remove_dir(path).map_err(|e| FlatmoveError::DirectoryRemovalFailed {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(true)
}

/// Creates `path` and any missing parents. Succeeds if it already exists.
pub fn create_dir_all(path: &Path) -> FlatmoveResult<()> {
    fs::create_dir_all(path).map_err(|e| FlatmoveError::DirectoryCreationFailed {
        path: path.to_path_buf(),
        source: e,
    })
}
