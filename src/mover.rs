//! Collision-safe file moves.
//!
//! A move never overwrites an existing entry. When the destination is taken,
//! an underscore is inserted before the extension (`a.jpg` -> `a_.jpg` ->
//! `a__.jpg` ...) until a free name is found. Candidates always stay in the
//! directory of the requested destination.

use crate::error::{FlatmoveError, FlatmoveResult};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Outcome of a completed move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMove {
    /// Where the file was before the move.
    pub source: PathBuf,
    /// Where the file actually landed.
    pub destination: PathBuf,
    /// True when the requested name was taken and an alternate one was used.
    pub renamed: bool,
}

/// Moves `source` to `destination`, picking an alternate name on collision.
///
/// # Errors
///
/// Returns `FileMoveFailure` if the source is missing, the destination
/// directory does not exist, or the rename is denied. Those failures are not
/// retried.
///
/// # Examples
///
/// ```no_run
/// use flatmove::mover::move_file;
/// use std::path::Path;
///
/// let done = move_file(Path::new("/photos/a/img.jpg"), Path::new("/photos/img.jpg"))?;
/// println!("landed at {}", done.destination.display());
/// # Ok::<(), flatmove::FlatmoveError>(())
/// ```
pub fn move_file(source: &Path, destination: &Path) -> FlatmoveResult<FileMove> {
    let target = free_destination(destination, occupied)
        .map_err(|e| move_failure(source, destination, e))?;

    fs::rename(source, &target).map_err(|e| move_failure(source, &target, e))?;

    let renamed = target != destination;
    debug!(
        from = %source.display(),
        to = %target.display(),
        renamed,
        "moved file"
    );

    Ok(FileMove {
        source: source.to_path_buf(),
        destination: target,
        renamed,
    })
}

/// Walks the chain of alternate names starting at `destination` and returns the
/// first one for which `is_taken` reports false.
pub fn free_destination<F>(destination: &Path, mut is_taken: F) -> io::Result<PathBuf>
where
    F: FnMut(&Path) -> io::Result<bool>,
{
    let mut candidate = destination.to_path_buf();
    while is_taken(&candidate)? {
        candidate = alternate_path(&candidate);
    }
    Ok(candidate)
}

/// Inserts one underscore before the extension of `path`, keeping its parent.
///
/// `dir/photo.jpg` becomes `dir/photo_.jpg`; `dir/archive.tar.gz` becomes
/// `dir/archive.tar_.gz`; `dir/README` becomes `dir/README_`.
pub fn alternate_path(path: &Path) -> PathBuf {
    let mut name: OsString = path
        .file_stem()
        .map(|stem| stem.to_os_string())
        .unwrap_or_default();
    name.push("_");
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }

    match path.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

/// An entry occupies `path` if anything is there, including a dangling symlink.
pub fn occupied(path: &Path) -> io::Result<bool> {
    match fs::symlink_metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

fn move_failure(source: &Path, destination: &Path, e: io::Error) -> FlatmoveError {
    FlatmoveError::FileMoveFailure {
        source: source.to_path_buf(),
        destination: destination.to_path_buf(),
        source_error: e,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::TempDir;

    #[test]
    fn test_alternate_path_stays_in_parent() {
        assert_eq!(
            alternate_path(Path::new("/a/b/photo.jpg")),
            PathBuf::from("/a/b/photo_.jpg")
        );
        assert_eq!(
            alternate_path(Path::new("/a/archive.tar.gz")),
            PathBuf::from("/a/archive.tar_.gz")
        );
        assert_eq!(
            alternate_path(Path::new("/a/README")),
            PathBuf::from("/a/README_")
        );
        assert_eq!(
            alternate_path(Path::new("/a/.bashrc")),
            PathBuf::from("/a/.bashrc_")
        );
    }

    #[test]
    fn test_free_destination_skips_every_taken_name() {
        let taken: HashSet<PathBuf> = ["/d/x.txt", "/d/x_.txt", "/d/x__.txt"]
            .iter()
            .map(PathBuf::from)
            .collect();

        let free = free_destination(Path::new("/d/x.txt"), |p| Ok(taken.contains(p))).unwrap();
        assert_eq!(free, PathBuf::from("/d/x___.txt"));
    }

    #[test]
    fn test_move_into_free_destination() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("a.txt");
        let destination = temp_dir.path().join("b.txt");
        fs::write(&source, "content").unwrap();

        let done = move_file(&source, &destination).expect("move failed");

        assert_eq!(done.destination, destination);
        assert!(!done.renamed);
        assert!(!source.exists());
        assert_eq!(fs::read_to_string(&destination).unwrap(), "content");
    }

    #[test]
    fn test_move_never_overwrites() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path().join("out");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("img.jpg"), "first").unwrap();
        fs::write(dir.join("img_.jpg"), "second").unwrap();
        let source = temp_dir.path().join("img.jpg");
        fs::write(&source, "third").unwrap();

        let done = move_file(&source, &dir.join("img.jpg")).expect("move failed");

        assert!(done.renamed);
        assert_eq!(done.destination, dir.join("img__.jpg"));
        assert_eq!(fs::read_to_string(dir.join("img.jpg")).unwrap(), "first");
        assert_eq!(fs::read_to_string(dir.join("img_.jpg")).unwrap(), "second");
        assert_eq!(fs::read_to_string(dir.join("img__.jpg")).unwrap(), "third");
    }

    #[test]
    fn test_missing_source_propagates() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let result = move_file(
            &temp_dir.path().join("missing.txt"),
            &temp_dir.path().join("dest.txt"),
        );
        assert!(matches!(result, Err(FlatmoveError::FileMoveFailure { .. })));
    }

    #[test]
    fn test_missing_destination_dir_propagates() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("a.txt");
        fs::write(&source, "content").unwrap();

        let result = move_file(&source, &temp_dir.path().join("nope").join("a.txt"));

        assert!(result.is_err());
        assert!(source.exists());
    }
}
