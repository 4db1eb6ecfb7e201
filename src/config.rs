//! Configuration file support: default flags and file filtering rules.
//!
//! Settings are stored in TOML. Every section is optional:
//!
//! ```toml
//! [defaults]
//! year = true
//! month = true
//! day = false
//! batch = 0
//! remove_empty_dirs = true
//!
//! [filters]
//! skip_hidden_files = false
//!
//! [filters.exclude]
//! filenames = [".DS_Store", "Thumbs.db"]
//! patterns = ["*.tmp", "node_modules/**"]
//! extensions = ["bak", "tmp"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//! ```
//!
//! Glob patterns are matched against the path of a file relative to the
//! directory being walked; regexes are matched against the file name only.

use crate::batch::BatchOptions;
use crate::bucket::DateParts;
use crate::flatten::FlattenOptions;
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".flatmoverc.toml";

/// Why a configuration file or its filter rules were rejected.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// `--config` points at a file that does not exist.
    Missing(PathBuf),
    /// The file exists but reading it failed.
    Unreadable { path: PathBuf, reason: String },
    /// The TOML does not parse, or a key has the wrong type.
    Malformed(String),
    /// An entry of `patterns` is not a glob.
    BadGlob { pattern: String, reason: String },
    /// An entry of `regex` does not compile.
    BadRegex { pattern: String, reason: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(path) => write!(f, "no config file at {}", path.display()),
            ConfigError::Unreadable { path, reason } => {
                write!(f, "cannot read {}: {}", path.display(), reason)
            }
            ConfigError::Malformed(msg) => write!(f, "malformed config: {}", msg),
            ConfigError::BadGlob { pattern, reason } => {
                write!(f, "filter glob `{}` rejected: {}", pattern, reason)
            }
            ConfigError::BadRegex { pattern, reason } => {
                write!(f, "filter regex `{}` rejected: {}", pattern, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Top-level configuration file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlatmoveConfig {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub filters: FilterRules,
}

/// Default values for the command-line switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(flatten)]
    pub parts: DateParts,

    /// Batch size for the post-pass; zero or negative disables batching.
    #[serde(default)]
    pub batch: i64,

    #[serde(default = "default_remove_empty_dirs")]
    pub remove_empty_dirs: bool,
}

fn default_remove_empty_dirs() -> bool {
    true
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            parts: DateParts::default(),
            batch: 0,
            remove_empty_dirs: default_remove_empty_dirs(),
        }
    }
}

impl Defaults {
    /// Converts the defaults into flatten options.
    pub fn flatten_options(&self) -> FlattenOptions {
        FlattenOptions {
            parts: self.parts,
            batch_size: BatchOptions::size_from(self.batch),
            remove_empty_dirs: self.remove_empty_dirs,
        }
    }
}

/// `[filters]`: which files a run is allowed to move.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterRules {
    /// Leave files whose name starts with "." where they are. Defaults to false.
    #[serde(default)]
    pub skip_hidden_files: bool,

    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Checked first; a match is moved even if an exclude rule also matches.
    #[serde(default)]
    pub include: IncludeRules,
}

/// `[filters.exclude]`: files matching any entry stay where they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Whole file names, compared exactly.
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Globs over the path relative to the walked directory.
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Case-insensitive, with or without the leading dot.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Matched against the file name only.
    #[serde(default)]
    pub regex: Vec<String>,
}

/// `[filters.include]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl FlatmoveConfig {
    /// Finds and reads the config for this run.
    ///
    /// The first hit wins: `config_path`, then `./.flatmoverc.toml`, then
    /// `$HOME/.config/flatmove/config.toml`. With none of them present every
    /// setting keeps its default.
    ///
    /// # Errors
    ///
    /// A missing `config_path` is an error; missing fallbacks are not. Any file
    /// that is found must parse.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("flatmove")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Reads one config file, without any fallback.
    ///
    /// # Errors
    ///
    /// - `Missing`: nothing at `path`
    /// - `Unreadable`: the read itself failed
    /// - `Malformed`: the contents are not a config
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::Missing(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Malformed(e.to_string()))
    }

    /// Turns `[filters]` into matchers. Fails on the first bad glob or regex.
    pub fn compile_filters(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(&self.filters)
    }
}

/// `[filters]` with every glob and regex already parsed.
#[derive(Debug, Clone, Default)]
pub struct CompiledFilters {
    skip_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl CompiledFilters {
    /// Filters that let every file through.
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = compile_globs(&rules.exclude.patterns)?;
        let include_patterns = compile_globs(&rules.include.patterns)?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::BadRegex {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            skip_hidden_files: rules.skip_hidden_files,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns,
            exclude_regexes,
            include_patterns,
        })
    }

    /// Whether a run may move this file.
    ///
    /// `relative_path` is the file's path relative to the walked root.
    /// Include patterns win over everything; otherwise the file is rejected by
    /// the hidden-file switch, an exact name, an extension, a glob or a regex,
    /// in that order.
    pub fn should_include(&self, relative_path: &Path) -> bool {
        let file_name = relative_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self
            .include_patterns
            .iter()
            .any(|pattern| pattern.matches_path(relative_path))
        {
            return true;
        }

        if self.skip_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = relative_path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext_lower) {
                return false;
            }
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches_path(relative_path))
        {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
    }

    /// Like [`should_include`](Self::should_include) for a path under `root`.
    ///
    /// Paths outside `root` are checked as given.
    pub fn should_include_under(&self, root: &Path, path: &Path) -> bool {
        self.should_include(path.strip_prefix(root).unwrap_or(path))
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|e| ConfigError::BadGlob {
                pattern: pattern.clone(),
                reason: e.msg.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(rules: FilterRules) -> CompiledFilters {
        CompiledFilters::new(&rules).expect("Failed to compile filters")
    }

    #[test]
    fn test_default_config_moves_everything() {
        let config = FlatmoveConfig::default();
        let compiled = config.compile_filters().unwrap();

        assert!(compiled.should_include(Path::new(".DS_Store")));
        assert!(compiled.should_include(Path::new("a/b/photo.jpg")));
        assert!(config.defaults.remove_empty_dirs);
        assert!(config.defaults.parts.is_empty());
    }

    #[test]
    fn test_defaults_section_parses() {
        let config = FlatmoveConfig::from_toml(
            r#"
[defaults]
year = true
month = true
batch = 25
"#,
        )
        .unwrap();

        let options = config.defaults.flatten_options();
        assert!(options.parts.year);
        assert!(options.parts.month);
        assert!(!options.parts.day);
        assert_eq!(options.batch_size, 25);
        assert!(options.remove_empty_dirs);
    }

    #[test]
    fn test_negative_default_batch_disables_batching() {
        let config = FlatmoveConfig::from_toml("[defaults]\nbatch = -4\n").unwrap();
        assert_eq!(config.defaults.flatten_options().batch_size, 0);
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let result = FlatmoveConfig::from_toml("[defaults\nyear = true");
        assert!(matches!(result, Err(ConfigError::Malformed(_))));
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let result = FlatmoveConfig::load(Some(Path::new("/non/existent/config.toml")));
        assert!(matches!(result, Err(ConfigError::Missing(_))));
    }

    #[test]
    fn test_skip_hidden_files() {
        let compiled = compile(FilterRules {
            skip_hidden_files: true,
            ..Default::default()
        });

        assert!(!compiled.should_include(Path::new(".DS_Store")));
        assert!(!compiled.should_include(Path::new("sub/.hidden")));
        assert!(compiled.should_include(Path::new("photo.jpg")));
    }

    #[test]
    fn test_exclude_exact_filename() {
        let compiled = compile(FilterRules {
            exclude: ExcludeRules {
                filenames: vec!["Thumbs.db".to_string(), ".DS_Store".to_string()],
                ..Default::default()
            },
            ..Default::default()
        });

        assert!(!compiled.should_include(Path::new("Thumbs.db")));
        assert!(!compiled.should_include(Path::new("deep/dir/Thumbs.db")));
        assert!(compiled.should_include(Path::new("image.jpg")));
    }

    #[test]
    fn test_exclude_extensions_case_insensitive() {
        let compiled = compile(FilterRules {
            exclude: ExcludeRules {
                extensions: vec!["bak".to_string(), ".tmp".to_string()],
                ..Default::default()
            },
            ..Default::default()
        });

        assert!(!compiled.should_include(Path::new("file.bak")));
        assert!(!compiled.should_include(Path::new("file.BAK")));
        assert!(!compiled.should_include(Path::new("file.tmp")));
        assert!(compiled.should_include(Path::new("file.txt")));
    }

    #[test]
    fn test_exclude_glob_matches_relative_path() {
        let compiled = compile(FilterRules {
            exclude: ExcludeRules {
                patterns: vec!["**/raw/**".to_string(), "*.xmp".to_string()],
                ..Default::default()
            },
            ..Default::default()
        });

        assert!(!compiled.should_include(Path::new("raw/img.cr2")));
        assert!(!compiled.should_include(Path::new("2020/raw/img.cr2")));
        assert!(!compiled.should_include(Path::new("img.xmp")));
        assert!(compiled.should_include(Path::new("my_raw/img.cr2")));
        assert!(compiled.should_include(Path::new("img.jpg")));
    }

    #[test]
    fn test_exclude_regex_on_file_name() {
        let compiled = compile(FilterRules {
            exclude: ExcludeRules {
                regex: vec![r"^IMG_\d+\.tmp$".to_string()],
                ..Default::default()
            },
            ..Default::default()
        });

        assert!(!compiled.should_include(Path::new("a/IMG_0001.tmp")));
        assert!(compiled.should_include(Path::new("a/IMG_0001.jpg")));
    }

    #[test]
    fn test_include_overrides_exclude() {
        let compiled = compile(FilterRules {
            skip_hidden_files: true,
            exclude: ExcludeRules {
                extensions: vec!["log".to_string()],
                ..Default::default()
            },
            include: IncludeRules {
                patterns: vec![".keep".to_string(), "important.log".to_string()],
            },
        });

        assert!(compiled.should_include(Path::new(".keep")));
        assert!(compiled.should_include(Path::new("important.log")));
        assert!(!compiled.should_include(Path::new(".other")));
        assert!(!compiled.should_include(Path::new("debug.log")));
    }

    #[test]
    fn test_should_include_under_strips_root() {
        let compiled = compile(FilterRules {
            exclude: ExcludeRules {
                patterns: vec!["keep/*".to_string()],
                ..Default::default()
            },
            ..Default::default()
        });

        let root = Path::new("/photos");
        assert!(!compiled.should_include_under(root, Path::new("/photos/keep/a.jpg")));
        assert!(compiled.should_include_under(root, Path::new("/photos/move/a.jpg")));
    }

    #[test]
    fn test_invalid_patterns_return_errors() {
        let bad_regex = CompiledFilters::new(&FilterRules {
            exclude: ExcludeRules {
                regex: vec!["[invalid(".to_string()],
                ..Default::default()
            },
            ..Default::default()
        });
        assert!(matches!(bad_regex, Err(ConfigError::BadRegex { .. })));

        let bad_glob = CompiledFilters::new(&FilterRules {
            exclude: ExcludeRules {
                patterns: vec!["[invalid".to_string()],
                ..Default::default()
            },
            ..Default::default()
        });
        assert!(matches!(bad_glob, Err(ConfigError::BadGlob { .. })));
    }

    #[test]
    fn test_bad_glob_message_names_the_pattern() {
        let err = CompiledFilters::new(&FilterRules {
            include: IncludeRules {
                patterns: vec!["raw/[".to_string()],
            },
            ..Default::default()
        })
        .unwrap_err();

        let message = err.to_string();
        assert!(message.starts_with("filter glob `raw/[` rejected: "));
    }
}
