//! Command-line interface module for flatmove.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Merging command-line switches with the configuration file
//! - Resolving the source and destination roots
//! - Running (or simulating) the flatten and reporting the outcome

use crate::batch::BatchOptions;
use crate::config::{Defaults, FlatmoveConfig};
use crate::flatten::{FlattenOptions, Flattener};
use crate::output::OutputFormatter;
use clap::{ArgAction, Parser};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Moves all files (including files in subfolders) from a path to another,
/// without the subfolders, optionally grouped by modification date.
#[derive(Parser, Debug, Clone)]
#[command(name = "flatmove", version, about, long_about = None)]
pub struct Cli {
    /// All files under this path will be moved
    pub source: PathBuf,

    /// Files will be moved here if specified (else the source is used)
    pub destiny: Option<PathBuf>,

    /// Use the modified year of the file as subfolder
    #[arg(short, long)]
    pub year: bool,

    /// Use the modified month of the file as subfolder
    #[arg(short, long)]
    pub month: bool,

    /// Use the modified day of the file as subfolder
    #[arg(short, long)]
    pub day: bool,

    /// Subdivide files in quantities of N inside enumerated subfolders
    #[arg(short, long, value_name = "N", allow_negative_numbers = true)]
    pub batch: Option<i64>,

    /// Leave directories emptied by the move in place
    #[arg(long)]
    pub keep_empty_dirs: bool,

    /// Show what would be moved without touching anything
    #[arg(long)]
    pub dry_run: bool,

    /// Configuration file (defaults to ./.flatmoverc.toml, then ~/.config/flatmove/config.toml)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Merges the switches given on the command line over the file defaults.
    ///
    /// A date switch can only turn a component on; `--batch` replaces the
    /// configured batch size; `--keep-empty-dirs` turns cleanup off.
    pub fn flatten_options(&self, defaults: &Defaults) -> FlattenOptions {
        let mut options = defaults.flatten_options();
        options.parts.year |= self.year;
        options.parts.month |= self.month;
        options.parts.day |= self.day;
        if let Some(batch) = self.batch {
            options.batch_size = BatchOptions::size_from(batch);
        }
        if self.keep_empty_dirs {
            options.remove_empty_dirs = false;
        }
        options
    }
}

/// Runs the CLI application with parsed arguments.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use flatmove::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from(["flatmove", "-ym", "/photos"]);
/// if let Err(e) = run_cli(&cli) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(cli: &Cli) -> Result<(), String> {
    let config = FlatmoveConfig::load(cli.config.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    let filters = config
        .compile_filters()
        .map_err(|e| format!("Error compiling filters: {}", e))?;
    let options = cli.flatten_options(&config.defaults);

    let source = resolve_source(&cli.source)?;
    let destination = match cli.destiny.as_deref() {
        Some(destiny) => resolve_destination(destiny, cli.dry_run)?,
        None => source.clone(),
    };

    if destination != source && destination.starts_with(&source) {
        warn!(
            source = %source.display(),
            destination = %destination.display(),
            "destination nested inside source"
        );
        OutputFormatter::warning(
            "The destination is inside the source; this layout is not supported and may move files twice.",
        );
    }

    let flattener = Flattener::new(options).with_filters(filters);
    if cli.dry_run {
        flatten_dry_run(&flattener, &source, &destination)
    } else {
        flatten_directory(flattener, &source, &destination)
    }
}

/// Moves the files and prints a summary of what happened.
fn flatten_directory(
    flattener: Flattener,
    source: &Path,
    destination: &Path,
) -> Result<(), String> {
    OutputFormatter::info(&format!(
        "Flattening {} into {}",
        source.display(),
        destination.display()
    ));

    let progress = OutputFormatter::create_progress_bar(0);
    let report = flattener
        .with_progress(progress.clone())
        .flatten(source, destination)
        .map_err(|e| {
            progress.abandon();
            e.to_string()
        })?;
    progress.finish_and_clear();

    if report.moves.is_empty() {
        OutputFormatter::success("Nothing to move, every file is already in place.");
    } else {
        OutputFormatter::summary_table(&report.bucket_counts(), report.moves.len());
        OutputFormatter::success(&format!("Moved {} files.", report.moves.len()));
    }

    if report.renamed() > 0 {
        OutputFormatter::warning(&format!(
            "{} files were renamed to avoid overwriting existing ones.",
            report.renamed()
        ));
    }
    if report.already_placed > 0 {
        OutputFormatter::plain(&format!("  Already in place: {}", report.already_placed));
    }
    if report.excluded > 0 {
        OutputFormatter::plain(&format!("  Excluded by filters: {}", report.excluded));
    }
    if !report.removed_dirs.is_empty() {
        OutputFormatter::plain(&format!(
            "  Removed empty directories: {}",
            report.removed_dirs.len()
        ));
    }

    for batch in &report.batches {
        OutputFormatter::plain(&format!(
            "  {}: {} files in {} batches",
            batch.root.display(),
            batch.total_files(),
            batch.groups.len()
        ));
    }

    Ok(())
}

/// Prints the moves a real run would make.
fn flatten_dry_run(flattener: &Flattener, source: &Path, destination: &Path) -> Result<(), String> {
    OutputFormatter::dry_run_notice(&format!(
        "Analyzing {} (destination {})",
        source.display(),
        destination.display()
    ));

    let plan = flattener
        .plan(source, destination)
        .map_err(|e| e.to_string())?;

    if plan.moves.is_empty() {
        OutputFormatter::dry_run_notice("No files would be moved.");
        return Ok(());
    }

    for planned in &plan.moves {
        OutputFormatter::plain(&format!(
            " - {}\n   → {}",
            planned.source.display(),
            planned.destination.display()
        ));
    }

    OutputFormatter::summary_table(&plan.bucket_counts(), plan.moves.len());

    let options = flattener.options();
    if options.batch_size > 0 {
        OutputFormatter::dry_run_notice(&format!(
            "Each bucket would then be split into folders of {} files.",
            options.batch_size
        ));
    }
    OutputFormatter::dry_run_notice("Dry run complete. No files were modified.");
    Ok(())
}

fn resolve_source(source: &Path) -> Result<PathBuf, String> {
    let resolved = source
        .canonicalize()
        .map_err(|e| format!("Error reading source {}: {}", source.display(), e))?;
    if !resolved.is_dir() {
        return Err(format!("Source {} is not a directory", source.display()));
    }
    Ok(resolved)
}

/// Creates the destination if needed, except in a dry run.
fn resolve_destination(destiny: &Path, dry_run: bool) -> Result<PathBuf, String> {
    if dry_run && !destiny.exists() {
        return std::path::absolute(destiny)
            .map_err(|e| format!("Error resolving destination {}: {}", destiny.display(), e));
    }

    fs::create_dir_all(destiny)
        .map_err(|e| format!("Error creating destination {}: {}", destiny.display(), e))?;
    destiny
        .canonicalize()
        .map_err(|e| format!("Error resolving destination {}: {}", destiny.display(), e))
}
