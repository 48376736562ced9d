//! Layered run configuration.
//!
//! Values are resolved in this order, later layers winning:
//!
//! 1. built-in defaults ([`Config::default`])
//! 2. the TOML config file (platform config dir, or `--config PATH`)
//! 3. the `[profile.NAME]` table of that file, when `--profile NAME` is given
//! 4. `DUPELINK_*` environment variables (e.g. `DUPELINK_MIN_SIZE=0`)
//! 5. command-line flags ([`Config::merge_cli`])
//!
//! ```toml
//! min_size = 1
//! hash = "blake3"
//! ignore = '/\.git/'
//!
//! [profile.photos]
//! paths = ["/srv/photos"]
//! link = true
//! ```
//!
//! Once merged and validated the configuration is immutable for the run;
//! [`Config::walker_config`] and [`Config::resolve_config`] compile the
//! pattern strings into the filters used by the scanner and resolver.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::actions::{ResolveConfig, DEFAULT_PROMPT_RETRIES};
use crate::cli::Cli;
use crate::duplicates::finder::{default_worker_count, DEFAULT_QUEUE_CAPACITY};
use crate::scanner::{CandidateSource, HashAlgorithm, WalkerConfig};

/// Default minimum candidate size (inclusive).
pub const DEFAULT_MIN_SIZE: u64 = 4 * 1024;

/// Default maximum candidate size (exclusive).
pub const DEFAULT_MAX_SIZE: u64 = 650 * 1024 * 1024;

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "DUPELINK_";

/// Errors from loading or interpreting configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// A pattern failed to compile.
    #[error("Invalid {name} pattern '{pattern}': {source}")]
    InvalidPattern {
        /// Which option held the pattern
        name: &'static str,
        /// The pattern as given
        pattern: String,
        /// Compilation error
        #[source]
        source: regex::Error,
    },

    /// Both walk roots and an input list were configured.
    #[error("Scan roots and an input list cannot be used together")]
    ConflictingSources,

    /// A report file was combined with a policy that modifies files.
    #[error("--output cannot be combined with --link, --rm or --interactive")]
    ReportWithActions,

    /// The size bounds admit no file at all.
    #[error("Minimum size {min} is not below maximum size {max}")]
    EmptySizeRange {
        /// Inclusive lower bound
        min: u64,
        /// Exclusive upper bound
        max: u64,
    },
}

/// Every option of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Roots to walk (empty means the current directory)
    pub paths: Vec<PathBuf>,
    /// Newline-delimited list of candidate paths, used instead of walking
    pub input_list: Option<PathBuf>,
    /// Smallest candidate size in bytes, inclusive
    pub min_size: u64,
    /// Candidate size limit in bytes, exclusive; 0 disables the limit
    pub max_size: u64,
    /// Paths matching this regex are never candidates
    pub ignore: Option<String>,
    /// Selection regex for automatic deletion
    pub select: Option<String>,
    /// Digest algorithm
    pub hash: HashAlgorithm,
    /// Hashing threads; 0 picks CPU count - 1
    pub workers: usize,
    /// Bounded queue size between the walk and the workers
    pub queue_capacity: usize,
    /// Attempts at the interactive prompt before skipping
    pub prompt_retries: u32,
    /// Skip dot-files and dot-directories while walking
    pub skip_hidden: bool,
    /// Replace duplicates with hardlinks
    pub link: bool,
    /// Act on already-hardlinked duplicates
    pub force_link: bool,
    /// Ask before deleting
    pub interactive: bool,
    /// No console output
    pub silent: bool,
    /// Report file path
    pub output: Option<PathBuf>,
    /// Named profiles; only consulted while loading
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub profile: BTreeMap<String, toml::Table>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            input_list: None,
            min_size: DEFAULT_MIN_SIZE,
            max_size: DEFAULT_MAX_SIZE,
            ignore: None,
            select: None,
            hash: HashAlgorithm::default(),
            workers: 0,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            prompt_retries: DEFAULT_PROMPT_RETRIES,
            skip_hidden: false,
            link: false,
            force_link: false,
            interactive: false,
            silent: false,
            output: None,
            profile: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Default config file location for this platform.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dupelink").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load using `explicit` or the default path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if `explicit` names a missing file.
    pub fn load(explicit: Option<&Path>, profile: Option<&str>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) if !path.is_file() => Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Ok(Self::load_from_path(path, profile)),
            None => match Self::default_path() {
                Some(path) => Ok(Self::load_from_path(path, profile)),
                None => Ok(Self::load_layers(None, profile)),
            },
        }
    }

    /// Load defaults, `path` (if it exists), the profile and the environment.
    ///
    /// A file that cannot be parsed is reported with `warn!` and ignored.
    pub fn load_from_path(path: impl AsRef<Path>, profile: Option<&str>) -> Self {
        let path = path.as_ref();
        Self::load_layers(path.is_file().then_some(path), profile)
    }

    fn load_layers(file: Option<&Path>, profile: Option<&str>) -> Self {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = file {
            log::debug!("Loading config from {}", path.display());
            figment = figment.merge(Toml::file(path));
        }

        if let Some(name) = profile {
            let key = format!("profile.{name}");
            if figment.contains(&key) {
                let table = figment.focus(&key);
                figment = figment.merge(table);
            } else {
                log::warn!("Profile '{name}' not found in config, using base settings");
            }
        }

        let with_env = figment.clone().merge(Env::prefixed(ENV_PREFIX));
        match with_env.extract::<Self>() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Ignoring invalid configuration: {e}");
                Figment::from(Serialized::defaults(Self::default()))
                    .merge(Env::prefixed(ENV_PREFIX))
                    .extract()
                    .unwrap_or_default()
            }
        }
    }

    /// Apply command-line flags on top of the loaded values.
    ///
    /// Options given on the command line replace configured ones; boolean
    /// switches can only be turned on from the command line.
    pub fn merge_cli(&mut self, cli: &Cli) {
        let roots = cli.roots();
        if !roots.is_empty() {
            self.paths = roots;
            self.input_list = None;
        }
        if let Some(list) = &cli.input_list {
            self.input_list = Some(list.clone());
            self.paths.clear();
        }

        if let Some(min) = cli.min_size {
            self.min_size = min;
        }
        if let Some(max) = cli.max_size {
            self.max_size = max;
        }
        if let Some(pattern) = &cli.ignore {
            self.ignore = Some(pattern.clone());
        }
        if let Some(pattern) = &cli.select {
            self.select = Some(pattern.clone());
        }
        if let Some(hash) = cli.hash_algorithm() {
            self.hash = hash;
        }
        if let Some(workers) = cli.workers {
            self.workers = workers;
        }
        if let Some(capacity) = cli.queue_capacity {
            self.queue_capacity = capacity;
        }
        if let Some(output) = &cli.output {
            self.output = Some(output.clone());
        }

        self.skip_hidden |= cli.skip_hidden;
        self.link |= cli.link;
        self.force_link |= cli.force_link;
        self.interactive |= cli.interactive;
        self.silent |= cli.silent;
    }

    /// Reject combinations that cannot run.
    ///
    /// # Errors
    ///
    /// See the [`ConfigError`] variants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input_list.is_some() && !self.paths.is_empty() {
            return Err(ConfigError::ConflictingSources);
        }
        if self.max_size != 0 && self.min_size >= self.max_size {
            return Err(ConfigError::EmptySizeRange {
                min: self.min_size,
                max: self.max_size,
            });
        }
        if self.output.is_some() && self.resolve_config()?.is_destructive() {
            return Err(ConfigError::ReportWithActions);
        }
        Ok(())
    }

    /// Where candidates come from.
    #[must_use]
    pub fn candidate_source(&self) -> CandidateSource {
        match &self.input_list {
            Some(list) => CandidateSource::PathList(list.clone()),
            None if self.paths.is_empty() => CandidateSource::Roots(vec![PathBuf::from(".")]),
            None => CandidateSource::Roots(self.paths.clone()),
        }
    }

    /// Number of hashing workers to start.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        if self.workers == 0 {
            default_worker_count()
        } else {
            self.workers
        }
    }

    /// Candidate filters.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPattern`] for a malformed ignore regex.
    pub fn walker_config(&self) -> Result<WalkerConfig, ConfigError> {
        let max = (self.max_size != 0).then_some(self.max_size);
        let mut config = WalkerConfig::default().with_size_bounds(Some(self.min_size), max);
        if let Some(pattern) = &self.ignore {
            config = config.with_ignore(compile("ignore", pattern)?);
        }
        config.skip_hidden = self.skip_hidden;
        Ok(config)
    }

    /// Resolution policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPattern`] for a malformed selection regex.
    pub fn resolve_config(&self) -> Result<ResolveConfig, ConfigError> {
        let select = self
            .select
            .as_deref()
            .map(|pattern| compile("rm", pattern))
            .transpose()?;
        Ok(ResolveConfig {
            link: self.link,
            force_link: self.force_link,
            interactive: self.interactive,
            silent: self.silent,
            select,
        })
    }
}

fn compile(name: &'static str, pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
        name,
        pattern: pattern.to_string(),
        source,
    })
}
