//! Run configuration, settings files and candidate filters.
//!
//! A run is driven by a single [`RunConfig`], validated once before
//! any file is touched. Defaults and exclusion filters can be supplied by an
//! optional TOML settings file; command-line values take precedence.
//!
//! # Settings File Format
//!
//! ```toml
//! [defaults]
//! mode = "copy"
//! recursive = true
//! verbose = false
//!
//! [filters]
//! include_hidden = true
//!
//! [filters.exclude]
//! filenames = ["Thumbs.db"]
//! patterns = ["*.part", "node_modules/**"]
//! extensions = ["tmp"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//! ```

use crate::placer::normalize_path;
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Name of the per-directory settings file.
pub const LOCAL_SETTINGS_FILE: &str = ".sortdirrc.toml";

/// Errors detected while building the run configuration.
///
/// All of these are fatal and are reported before the run starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required flag: --src")]
    MissingSource,
    #[error("invalid mode '{0}' (use 'move' or 'copy')")]
    InvalidMode(String),
    #[error("cannot resolve path {}: {source}", .path.display())]
    InvalidPath {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("source {} is not readable: {source}", .path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("source {} must be a directory", .0.display())]
    SourceNotDirectory(PathBuf),
    #[error("cannot create destination {}: {source}", .path.display())]
    DestinationUncreatable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("settings file not found: {}", .0.display())]
    SettingsNotFound(PathBuf),
    #[error("cannot read settings file {}: {source}", .path.display())]
    SettingsUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid settings file {}: {reason}", .path.display())]
    SettingsInvalid { path: PathBuf, reason: String },
    #[error("invalid glob pattern '{pattern}': {reason}")]
    InvalidGlobPattern { pattern: String, reason: String },
    #[error("invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },
}

/// Transfer behavior for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Relocate files, removing the source.
    #[default]
    Move,
    /// Duplicate files, leaving the source in place.
    Copy,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Move => "move",
            Mode::Copy => "copy",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    /// Parses `move` or `copy`, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "move" => Ok(Mode::Move),
            "copy" => Ok(Mode::Copy),
            _ => Err(ConfigError::InvalidMode(s.to_string())),
        }
    }
}

/// Unvalidated run inputs, merged from the command line and settings file.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub source: PathBuf,
    /// Defaults to `source` when absent.
    pub dest: Option<PathBuf>,
    pub mode: Mode,
    pub recursive: bool,
    pub dry_run: bool,
    pub verbose: bool,
    pub filters: FilterRules,
}

/// Validated configuration for one run. Build it with [`RunConfig::new`];
/// the coordinator only reads it.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Absolute, normalized, existing directory.
    pub source_root: PathBuf,
    /// Absolute and normalized; exists after validation unless dry run.
    pub dest_root: PathBuf,
    pub mode: Mode,
    pub recursive: bool,
    pub dry_run: bool,
    pub verbose: bool,
    pub filters: CompiledFilters,
}

impl RunConfig {
    /// Validates `options` and builds the run configuration.
    ///
    /// The destination root is created if absent, except under dry run where
    /// it is only checked not to be a non-directory.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the source is missing, unreadable or not
    /// a directory, if the destination cannot be created, or if a filter
    /// pattern does not compile.
    pub fn new(options: RunOptions) -> Result<Self, ConfigError> {
        if options.source.as_os_str().is_empty() {
            return Err(ConfigError::MissingSource);
        }

        let source_root = resolve(&options.source)?;
        let metadata =
            fs::metadata(&source_root).map_err(|source| ConfigError::SourceUnreadable {
                path: source_root.clone(),
                source,
            })?;
        if !metadata.is_dir() {
            return Err(ConfigError::SourceNotDirectory(source_root));
        }

        let dest_root = match options.dest.as_deref() {
            Some(dest) if !dest.as_os_str().is_empty() => resolve(dest)?,
            _ => source_root.clone(),
        };
        // Everything that can fail without side effects runs before this.
        let filters = options.filters.compile()?;
        prepare_destination(&dest_root, options.dry_run)?;

        Ok(Self {
            source_root,
            dest_root,
            mode: options.mode,
            recursive: options.recursive,
            dry_run: options.dry_run,
            verbose: options.verbose,
            filters,
        })
    }
}

fn resolve(path: &Path) -> Result<PathBuf, ConfigError> {
    std::path::absolute(path)
        .map(|abs| normalize_path(&abs))
        .map_err(|source| ConfigError::InvalidPath {
            path: path.to_path_buf(),
            source,
        })
}

fn prepare_destination(dest_root: &Path, dry_run: bool) -> Result<(), ConfigError> {
    let uncreatable = |source: io::Error| ConfigError::DestinationUncreatable {
        path: dest_root.to_path_buf(),
        source,
    };

    if dry_run {
        if dest_root.exists() && !dest_root.is_dir() {
            return Err(uncreatable(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "exists and is not a directory",
            )));
        }
        return Ok(());
    }

    fs::create_dir_all(dest_root).map_err(uncreatable)
}

/// Contents of a TOML settings file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub filters: FilterRules,
}

/// Default flag values; the command line overrides each one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Defaults {
    pub mode: Option<String>,
    #[serde(default)]
    pub recursive: bool,
    #[serde(default)]
    pub verbose: bool,
}

impl Settings {
    /// Load settings, with fallback to defaults.
    ///
    /// Lookup order:
    /// 1. `settings_path`, if provided (must exist)
    /// 2. `.sortdirrc.toml` in the current directory
    /// 3. `~/.config/sortdir/config.toml`
    /// 4. Built-in defaults
    pub fn load(settings_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = settings_path {
            return Self::load_from_file(path);
        }

        let local = PathBuf::from(LOCAL_SETTINGS_FILE);
        if local.exists() {
            return Self::load_from_file(&local);
        }

        if let Some(home) = std::env::var_os("HOME") {
            let home_settings = PathBuf::from(home)
                .join(".config")
                .join("sortdir")
                .join("config.toml");
            if home_settings.exists() {
                return Self::load_from_file(&home_settings);
            }
        }

        Ok(Self::default())
    }

    /// Load settings from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::SettingsNotFound(path.to_path_buf()));
        }

        let content =
            fs::read_to_string(path).map_err(|source| ConfigError::SettingsUnreadable {
                path: path.to_path_buf(),
                source,
            })?;

        toml::from_str(&content).map_err(|e| ConfigError::SettingsInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// The default mode, if the file names one.
    pub fn mode(&self) -> Result<Option<Mode>, ConfigError> {
        self.defaults.mode.as_deref().map(str::parse::<Mode>).transpose()
    }
}

/// Candidate filter rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether files whose name starts with "." are candidates.
    #[serde(default = "default_include_hidden")]
    pub include_hidden: bool,

    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Whitelist, overrides every exclude rule.
    #[serde(default)]
    pub include: IncludeRules,
}

fn default_include_hidden() -> bool {
    true
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            include_hidden: default_include_hidden(),
            exclude: ExcludeRules::default(),
            include: IncludeRules::default(),
        }
    }
}

/// Rules for excluding files from a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames (e.g., "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns matched against the path relative to the source root.
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Extensions without the dot, case-insensitive.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regexes matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

/// Rules for including files regardless of exclusions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl FilterRules {
    /// Compile the rules into matchers.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob pattern is invalid.
    pub fn compile(self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(self)
    }
}

/// Pre-compiled filter rules.
#[derive(Debug, Clone)]
pub struct CompiledFilters {
    include_hidden: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|e| ConfigError::InvalidGlobPattern {
                pattern: pattern.clone(),
                reason: e.msg.to_string(),
            })
        })
        .collect()
}

impl CompiledFilters {
    fn new(rules: FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = compile_globs(&rules.exclude.patterns)?;
        let include_patterns = compile_globs(&rules.include.patterns)?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            include_hidden: rules.include_hidden,
            exclude_filenames: rules.exclude.filenames.into_iter().collect(),
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

    /// True when no rule can exclude anything.
    pub fn is_permissive(&self) -> bool {
        self.include_hidden
            && self.exclude_filenames.is_empty()
            && self.exclude_extensions.is_empty()
            && self.exclude_patterns.is_empty()
            && self.exclude_regexes.is_empty()
    }

    /// Check whether a candidate, given relative to the source root, is kept.
    ///
    /// Order, first decisive rule wins:
    /// 1. Include patterns keep the file
    /// 2. Hidden files are dropped unless enabled
    /// 3. Exact filename, extension, glob and regex rules drop the file
    /// 4. Otherwise the file is kept
    pub fn should_include(&self, relative: &Path) -> bool {
        let file_name = relative
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self.include_patterns.iter().any(|p| p.matches_path(relative)) {
            return true;
        }

        if !self.include_hidden && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = relative.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext_lower) {
                return false;
            }
        }

        if self.exclude_patterns.iter().any(|p| p.matches_path(relative)) {
            return false;
        }

        !self.exclude_regexes.iter().any(|r| r.is_match(&file_name))
    }
}
