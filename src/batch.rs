//! Splitting a directory's files into numbered batch folders.
//!
//! Every file in the subtree of the source directory is collected in walk order,
//! cut into consecutive groups of `size` files, and group `i` (1-based) is moved
//! into `destination/i`. A run that stops half-way can simply be repeated.

use crate::config::CompiledFilters;
use crate::error::FlatmoveResult;
use crate::mover::{self, FileMove};
use crate::walk::{self, EntryKind};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Options for a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Maximum number of files per numbered folder. Zero disables batching.
    pub size: usize,
    /// Remove directories of the source tree left empty once all files are placed.
    pub remove_empty_dirs: bool,
}

impl BatchOptions {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            remove_empty_dirs: true,
        }
    }

    /// Maps a user-supplied batch size onto a usable one; anything below 1 means "off".
    pub fn size_from(requested: i64) -> usize {
        usize::try_from(requested).unwrap_or(0)
    }
}

/// One numbered folder produced by a batch run.
#[derive(Debug, Clone)]
pub struct BatchGroup {
    /// 1-based ordinal, also the folder name.
    pub ordinal: usize,
    pub dir: PathBuf,
    /// Final location of every member, in walk order.
    pub files: Vec<PathBuf>,
}

/// Describes what a batch run did.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub root: PathBuf,
    pub groups: Vec<BatchGroup>,
    pub moves: Vec<FileMove>,
    pub removed_dirs: Vec<PathBuf>,
}

impl BatchReport {
    /// Number of files placed into groups, moved or not.
    pub fn total_files(&self) -> usize {
        self.groups.iter().map(|group| group.files.len()).sum()
    }
}

/// Distributes files into numbered folders.
pub struct Batcher {
    options: BatchOptions,
    filters: CompiledFilters,
}

impl Batcher {
    pub fn new(options: BatchOptions) -> Self {
        Self {
            options,
            filters: CompiledFilters::allow_all(),
        }
    }

    /// Files rejected by `filters` are neither counted nor moved.
    pub fn with_filters(mut self, filters: CompiledFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Moves every file under `source_root` into `destination_root/1`,
    /// `destination_root/2`, ... holding at most `size` files each.
    ///
    /// A size of zero returns an empty report without touching anything.
    ///
    /// # Errors
    ///
    /// Stops at the first failed move; files already placed stay where they are.
    pub fn batchify(
        &self,
        source_root: &Path,
        destination_root: &Path,
    ) -> FlatmoveResult<BatchReport> {
        let mut report = BatchReport {
            root: destination_root.to_path_buf(),
            ..Default::default()
        };

        if self.options.size < 1 {
            return Ok(report);
        }

        let mut files = Vec::new();
        let mut dirs = Vec::new();
        for entry in walk::snapshot(source_root)? {
            match entry.kind {
                EntryKind::File if self.filters.should_include_under(source_root, &entry.path) => {
                    files.push(entry.path)
                }
                EntryKind::File => {}
                EntryKind::Dir => dirs.push(entry.path),
            }
        }

        for (index, chunk) in files.chunks(self.options.size).enumerate() {
            let ordinal = index + 1;
            let group_dir = destination_root.join(ordinal.to_string());
            walk::create_dir_all(&group_dir)?;

            let mut members = Vec::with_capacity(chunk.len());
            for file_path in chunk {
                let Some(file_name) = file_path.file_name() else {
                    continue;
                };
                let target = group_dir.join(file_name);
                if &target == file_path {
                    debug!(path = %file_path.display(), "already in its batch");
                    members.push(target);
                    continue;
                }

                let done = mover::move_file(file_path, &target)?;
                members.push(done.destination.clone());
                report.moves.push(done);
            }

            info!(
                batch = ordinal,
                files = members.len(),
                dir = %group_dir.display(),
                "filled batch"
            );
            report.groups.push(BatchGroup {
                ordinal,
                dir: group_dir,
                files: members,
            });
        }

        if self.options.remove_empty_dirs {
            // Children precede parents in the snapshot, so nested empties collapse in one pass.
            for dir in &dirs {
                if walk::remove_if_empty(dir)? {
                    debug!(path = %dir.display(), "removed empty directory");
                    report.removed_dirs.push(dir.clone());
                }
            }
        }

        Ok(report)
    }
}

/// Convenience wrapper around [`Batcher`] without filters.
pub fn batchify(
    source_root: &Path,
    destination_root: &Path,
    options: BatchOptions,
) -> FlatmoveResult<BatchReport> {
    Batcher::new(options).batchify(source_root, destination_root)
}
