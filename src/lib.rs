//! flatmove - flatten directory trees into date buckets
//!
//! This library moves every file below a source directory into a shallow
//! layout under a destination: one folder per modification date (any mix of
//! year, month and day, or none at all), optionally split further into
//! numbered batch folders. Name collisions never overwrite anything, and
//! directories emptied by the move are pruned.

pub mod batch;
pub mod bucket;
pub mod cli;
pub mod config;
pub mod error;
pub mod flatten;
pub mod logging;
pub mod mover;
pub mod output;
pub mod walk;

pub use batch::{BatchOptions, BatchReport, Batcher, batchify};
pub use bucket::DateParts;
pub use config::{CompiledFilters, ConfigError, FlatmoveConfig};
pub use error::{FlatmoveError, FlatmoveResult};
pub use flatten::{FlattenOptions, FlattenReport, Flattener, flatten};
pub use mover::{FileMove, move_file};

pub use cli::{Cli, run_cli};
