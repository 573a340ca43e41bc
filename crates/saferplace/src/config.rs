// Rust guideline compliant 2026-10-15

//! Binary configuration.
//!
//! Read from an optional TOML file, then overridden by `SAFERPLACE_*`
//! environment variables. Every key has a default, so an absent file or an
//! empty one yields a runnable demo setup.

use std::path::{Path, PathBuf};

use moderation::FailurePolicy;
use serde::Deserialize;

/// File read when neither the command line nor the environment names one.
pub const DEFAULT_CONFIG_PATH: &str = "saferplace.toml";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unable to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("unable to parse {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

// ---------------------------------------------------------------------------
// Providers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueProvider {
    #[default]
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseProvider {
    #[default]
    Memory,
    Sqlite,
}

impl std::str::FromStr for DatabaseProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(ConfigError::Invalid {
                key: "database.provider",
                reason: format!("unknown provider {other:?}"),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierProvider {
    #[default]
    Log,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueueSection {
    pub provider: QueueProvider,
    /// Fresh messages held before producers wait.
    pub capacity: usize,
}

impl Default for QueueSection {
    fn default() -> Self {
        Self { provider: QueueProvider::Memory, capacity: 64 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseSection {
    pub provider: DatabaseProvider,
    /// `sqlx` connection URL; read only by the sqlite provider.
    pub url: String,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self { provider: DatabaseProvider::Memory, url: "sqlite:saferplace.db".to_owned() }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotifierSection {
    pub provider: NotifierProvider,
    pub review_url: String,
}

impl Default for NotifierSection {
    fn default() -> Self {
        Self {
            provider: NotifierProvider::Log,
            review_url: "https://review.safer.place".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModerationSection {
    pub workers: usize,
    /// `"stop"` or `"continue"`.
    pub failure_policy: String,
}

impl Default for ModerationSection {
    fn default() -> Self {
        Self { workers: 2, failure_policy: "stop".to_owned() }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoreSection {
    pub nearest: usize,
    pub years: u32,
    pub reference_year: i32,
    /// Stations below this severity are left out of the calibration.
    pub noise_floor: f64,
}

impl Default for ScoreSection {
    fn default() -> Self {
        Self { nearest: 3, years: 5, reference_year: 2016, noise_floor: 0.01 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StationsSection {
    pub locations: PathBuf,
    pub crimes: PathBuf,
    /// Address prefixes (`prefix,names,lat,lon`) used by address search.
    pub prefixes: PathBuf,
}

impl Default for StationsSection {
    fn default() -> Self {
        Self {
            locations: PathBuf::from("data/stations.csv"),
            crimes: PathBuf::from("data/crimes.csv"),
            prefixes: PathBuf::from("data/prefixes.csv"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionSection {
    pub ttl_secs: u64,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self { ttl_secs: 3600 }
    }
}

/// Built-in traffic: a report generator and a reviewer working the backlog.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoSection {
    pub enabled: bool,
    /// Delay between generated reports.
    pub interval_ms: u64,
    /// Reports to generate before stopping; unset runs until CTRL+C.
    pub iterations: Option<u64>,
    /// Delay between reviewer passes over the backlog.
    pub review_interval_ms: u64,
    pub centre_lat: f64,
    pub centre_lon: f64,
    /// Addresses scored once at startup.
    pub searches: Vec<String>,
}

impl Default for DemoSection {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 500,
            iterations: None,
            review_interval_ms: 2000,
            // Dublin city centre.
            centre_lat: 53.345,
            centre_lon: -6.267,
            searches: vec!["D02 X285".to_owned(), "Dublin 13".to_owned(), "Galway".to_owned()],
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

/// Full binary configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Filter used when `RUST_LOG` is unset.
    pub log_level: String,
    pub queue: QueueSection,
    pub database: DatabaseSection,
    pub notifier: NotifierSection,
    pub moderation: ModerationSection,
    pub score: ScoreSection,
    pub stations: StationsSection,
    pub session: SessionSection,
    pub demo: DemoSection,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            queue: QueueSection::default(),
            database: DatabaseSection::default(),
            notifier: NotifierSection::default(),
            moderation: ModerationSection::default(),
            score: ScoreSection::default(),
            stations: StationsSection::default(),
            session: SessionSection::default(),
            demo: DemoSection::default(),
        }
    }
}

impl AppConfig {
    /// Parse a TOML document. `origin` names it in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML, unknown keys, or
    /// unknown providers.
    pub fn from_toml(text: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(text)
            .map_err(|source| ConfigError::Parse { path: origin.to_owned(), source })
    }

    /// Read `path`, or fall back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] for any other I/O failure and
    /// [`ConfigError::Parse`] for bad content.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let origin = path.display().to_string();
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text, &origin),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read { path: origin, source }),
        }
    }

    /// Apply `SAFERPLACE_*` overrides looked up through `var`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when an override does not parse.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(level) = var("SAFERPLACE_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(provider) = var("SAFERPLACE_DATABASE_PROVIDER") {
            self.database.provider = provider.parse()?;
        }
        if let Some(url) = var("SAFERPLACE_DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(workers) = var("SAFERPLACE_WORKERS") {
            self.moderation.workers = workers.trim().parse().map_err(|e| ConfigError::Invalid {
                key: "SAFERPLACE_WORKERS",
                reason: format!("{workers:?}: {e}"),
            })?;
        }
        Ok(())
    }

    /// Cross-field checks that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.moderation.workers == 0 {
            return Err(ConfigError::Invalid {
                key: "moderation.workers",
                reason: "must be at least 1".to_owned(),
            });
        }
        if self.queue.capacity == 0 {
            return Err(ConfigError::Invalid {
                key: "queue.capacity",
                reason: "must be at least 1".to_owned(),
            });
        }
        if self.session.ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "session.ttl_secs",
                reason: "must be at least 1".to_owned(),
            });
        }
        self.failure_policy()?;
        Ok(())
    }

    /// The configured worker failure policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for anything but `stop` or `continue`.
    pub fn failure_policy(&self) -> Result<FailurePolicy, ConfigError> {
        self.moderation.failure_policy.parse().map_err(|e: moderation::WorkerError| {
            ConfigError::Invalid { key: "moderation.failure_policy", reason: e.to_string() }
        })
    }
}

/// Config file location: first CLI argument, then `SAFERPLACE_CONFIG`, then
/// [`DEFAULT_CONFIG_PATH`].
#[must_use]
pub fn config_path(arg: Option<String>, env: Option<String>) -> PathBuf {
    PathBuf::from(arg.or(env).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_owned()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
