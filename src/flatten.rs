//! Moving every file of a tree into date buckets.
//!
//! The source tree is walked bottom-up: a directory is visited only after all
//! of its contents, so by the time it is checked for emptiness its files and
//! subdirectories have already been drained. Each file goes to
//! `destination_root/<bucket>/<file name>`, where the bucket comes from the
//! file's modification time in UTC.
//!
//! Placing the destination strictly inside the source (but not equal to it) is
//! not supported: bucket directories created there are not walked, yet
//! pre-existing ones are treated as ordinary source directories.

use crate::batch::{BatchOptions, BatchReport, Batcher};
use crate::bucket::DateParts;
use crate::config::CompiledFilters;
use crate::error::{FlatmoveError, FlatmoveResult};
use crate::mover::{self, FileMove};
use crate::walk::{self, EntryKind, TreeEntry};
use indicatif::ProgressBar;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Options for a flatten run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlattenOptions {
    pub parts: DateParts,
    /// Batch size for the post-pass over touched buckets. Zero disables it.
    pub batch_size: usize,
    /// Remove source directories left empty by the run. The source root itself is kept.
    pub remove_empty_dirs: bool,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            parts: DateParts::default(),
            batch_size: 0,
            remove_empty_dirs: true,
        }
    }
}

/// Describes what a flatten run did.
#[derive(Debug, Clone, Default)]
pub struct FlattenReport {
    pub destination_root: PathBuf,
    /// Files that were moved into a bucket, in walk order.
    pub moves: Vec<FileMove>,
    /// Files already sitting at their computed destination.
    pub already_placed: usize,
    /// Files rejected by the filters and left where they were.
    pub excluded: usize,
    pub removed_dirs: Vec<PathBuf>,
    /// One report per touched bucket when batching was requested.
    pub batches: Vec<BatchReport>,
}

impl FlattenReport {
    /// Number of moved files per bucket, keyed by the bucket name ("." for the root).
    pub fn bucket_counts(&self) -> BTreeMap<String, usize> {
        bucket_counts(
            &self.destination_root,
            self.moves.iter().map(|m| m.destination.as_path()),
        )
    }

    /// Number of moves that had to pick an alternate name.
    pub fn renamed(&self) -> usize {
        self.moves.iter().filter(|m| m.renamed).count()
    }
}

/// A move that a real run would perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// The full set of moves a run would perform.
#[derive(Debug, Clone, Default)]
pub struct FlattenPlan {
    pub destination_root: PathBuf,
    pub moves: Vec<PlannedMove>,
    pub already_placed: usize,
    pub excluded: usize,
}

impl FlattenPlan {
    /// Number of planned moves per bucket, keyed by the bucket name ("." for the root).
    pub fn bucket_counts(&self) -> BTreeMap<String, usize> {
        bucket_counts(
            &self.destination_root,
            self.moves.iter().map(|m| m.destination.as_path()),
        )
    }
}

/// Flattens a directory tree into date buckets.
pub struct Flattener {
    options: FlattenOptions,
    filters: CompiledFilters,
    progress: ProgressBar,
}

impl Flattener {
    pub fn new(options: FlattenOptions) -> Self {
        Self {
            options,
            filters: CompiledFilters::allow_all(),
            progress: ProgressBar::hidden(),
        }
    }

    /// Files rejected by `filters` stay where they are, in both passes.
    pub fn with_filters(mut self, filters: CompiledFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Advance `progress` once per file visited.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn options(&self) -> &FlattenOptions {
        &self.options
    }

    /// Moves every file under `source_root` into its bucket under `destination_root`.
    ///
    /// Files already at their computed destination are left alone, so a second
    /// run over an unchanged tree moves nothing (without batching). When
    /// `batch_size > 0`, every bucket that received a file is then split into
    /// numbered folders, without further directory pruning.
    ///
    /// # Errors
    ///
    /// Stops at the first filesystem failure. Everything done up to that point
    /// is left in place and a re-run picks up from there.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use flatmove::bucket::DateParts;
    /// use flatmove::flatten::{FlattenOptions, Flattener};
    /// use std::path::Path;
    ///
    /// let options = FlattenOptions {
    ///     parts: DateParts { year: true, month: true, day: false },
    ///     ..Default::default()
    /// };
    /// let root = Path::new("/photos");
    /// let report = Flattener::new(options).flatten(root, root)?;
    /// println!("moved {} files", report.moves.len());
    /// # Ok::<(), flatmove::FlatmoveError>(())
    /// ```
    pub fn flatten(
        &self,
        source_root: &Path,
        destination_root: &Path,
    ) -> FlatmoveResult<FlattenReport> {
        let entries = walk::snapshot(source_root)?;
        self.progress.set_length(count_files(&entries));

        let mut report = FlattenReport {
            destination_root: destination_root.to_path_buf(),
            ..Default::default()
        };
        let mut touched: BTreeSet<PathBuf> = BTreeSet::new();

        for entry in &entries {
            match entry.kind {
                EntryKind::File => {
                    self.place_file(
                        source_root,
                        destination_root,
                        &entry.path,
                        &mut report,
                        &mut touched,
                    )?;
                    self.progress.inc(1);
                }
                EntryKind::Dir => {
                    if self.options.remove_empty_dirs && walk::remove_if_empty(&entry.path)? {
                        debug!(path = %entry.path.display(), "removed empty directory");
                        report.removed_dirs.push(entry.path.clone());
                    }
                }
            }
        }

        if self.options.batch_size > 0 {
            let batcher = Batcher::new(BatchOptions {
                size: self.options.batch_size,
                remove_empty_dirs: false,
            })
            .with_filters(self.filters.clone());

            for bucket in &touched {
                report.batches.push(batcher.batchify(bucket, bucket)?);
            }
        }

        info!(
            moved = report.moves.len(),
            already_placed = report.already_placed,
            excluded = report.excluded,
            removed_dirs = report.removed_dirs.len(),
            "flatten finished"
        );
        Ok(report)
    }

    fn place_file(
        &self,
        source_root: &Path,
        destination_root: &Path,
        file_path: &Path,
        report: &mut FlattenReport,
        touched: &mut BTreeSet<PathBuf>,
    ) -> FlatmoveResult<()> {
        let Some(target) =
            self.destination_for(source_root, destination_root, file_path, &mut report.excluded)?
        else {
            return Ok(());
        };

        let bucket_dir = target.parent().unwrap_or(destination_root).to_path_buf();
        walk::create_dir_all(&bucket_dir)?;

        if target == file_path {
            debug!(path = %file_path.display(), "already in its bucket");
            report.already_placed += 1;
            return Ok(());
        }

        report.moves.push(mover::move_file(file_path, &target)?);
        touched.insert(bucket_dir);
        Ok(())
    }

    /// Computes where `file_path` belongs, or `None` if the filters reject it.
    fn destination_for(
        &self,
        source_root: &Path,
        destination_root: &Path,
        file_path: &Path,
        excluded: &mut usize,
    ) -> FlatmoveResult<Option<PathBuf>> {
        if !self.filters.should_include_under(source_root, file_path) {
            debug!(path = %file_path.display(), "excluded by filters");
            *excluded += 1;
            return Ok(None);
        }

        let Some(file_name) = file_path.file_name() else {
            return Ok(None);
        };

        let modified = walk::modified_utc(file_path)?;
        let bucket_dir = self.options.parts.bucket_dir(destination_root, modified);
        Ok(Some(bucket_dir.join(file_name)))
    }

    /// Computes the moves a real run would make, without touching the filesystem.
    ///
    /// Collisions are resolved against both what already exists on disk and
    /// what earlier planned moves would occupy. Batching is not simulated.
    pub fn plan(&self, source_root: &Path, destination_root: &Path) -> FlatmoveResult<FlattenPlan> {
        let entries = walk::snapshot(source_root)?;

        let mut plan = FlattenPlan {
            destination_root: destination_root.to_path_buf(),
            ..Default::default()
        };
        let mut claimed: HashSet<PathBuf> = HashSet::new();
        let mut vacated: HashSet<PathBuf> = HashSet::new();

        for entry in entries.iter().filter(|e| e.kind == EntryKind::File) {
            let Some(target) = self.destination_for(
                source_root,
                destination_root,
                &entry.path,
                &mut plan.excluded,
            )?
            else {
                continue;
            };

            if target == entry.path {
                plan.already_placed += 1;
                claimed.insert(target);
                continue;
            }

            let destination = mover::free_destination(&target, |candidate| {
                if claimed.contains(candidate) {
                    return Ok(true);
                }
                if vacated.contains(candidate) {
                    return Ok(false);
                }
                mover::occupied(candidate)
            })
            .map_err(|e| FlatmoveError::MetadataFailed {
                path: target.clone(),
                source: e,
            })?;

            vacated.insert(entry.path.clone());
            claimed.insert(destination.clone());
            plan.moves.push(PlannedMove {
                source: entry.path.clone(),
                destination,
            });
        }

        Ok(plan)
    }
}

/// Convenience wrapper around [`Flattener`] without filters or progress.
pub fn flatten(
    source_root: &Path,
    destination_root: &Path,
    options: FlattenOptions,
) -> FlatmoveResult<FlattenReport> {
    Flattener::new(options).flatten(source_root, destination_root)
}

fn count_files(entries: &[TreeEntry]) -> u64 {
    entries.iter().filter(|e| e.kind == EntryKind::File).count() as u64
}

fn bucket_counts<'a>(
    destination_root: &Path,
    destinations: impl Iterator<Item = &'a Path>,
) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for destination in destinations {
        let bucket = destination
            .parent()
            .and_then(|dir| dir.strip_prefix(destination_root).ok())
            .map(|rel| rel.to_string_lossy().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| ".".to_string());
        *counts.entry(bucket).or_insert(0) += 1;
    }
    counts
}
