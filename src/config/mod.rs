use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{AppError, AppResult};

pub mod defaults;

use defaults::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub updates: UpdateConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub guide: GuideConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Remote channel catalog settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Channel catalog endpoint; the query window is appended as `start`/`stop`
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Per-request timeout for the catalog GET
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// Minutes between scheduled updates; also the cache TTL
    #[serde(default = "default_update_interval_minutes")]
    pub interval_minutes: u64,
    /// Guide look-ahead window in hours
    #[serde(default = "default_epg_hours")]
    pub epg_hours: u64,
    /// Upper bound for a whole update sequence before it is treated as failed
    #[serde(default = "default_update_timeout_secs")]
    pub timeout_secs: u64,
    /// Run an update as soon as the scheduler starts
    #[serde(default = "default_run_on_startup")]
    pub run_on_startup: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_cache_file")]
    pub cache_file: PathBuf,
    /// Directory receiving `playlist.m3u8` and `epg.xml` after each update
    #[serde(default = "default_backup_dir")]
    pub backup_dir: Option<PathBuf>,
    #[serde(default = "default_favorites_path")]
    pub favorites_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuideConfig {
    /// Value of the `generator-info-name` attribute on the XMLTV root
    #[serde(default = "default_generator_name")]
    pub generator_name: String,
    /// `lang` attribute on title, description and category nodes
    #[serde(default = "default_guide_language")]
    pub language: String,
    /// Title used for programmes that have none, in `language`
    #[serde(default = "default_fallback_title")]
    pub fallback_title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human readable output
    #[serde(default = "default_log_json")]
    pub json: bool,
}

// Web defaults
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

// Source defaults
fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_fetch_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

// Update defaults
fn default_update_interval_minutes() -> u64 {
    DEFAULT_UPDATE_INTERVAL_MINUTES
}

fn default_epg_hours() -> u64 {
    DEFAULT_EPG_HOURS
}

fn default_update_timeout_secs() -> u64 {
    DEFAULT_UPDATE_TIMEOUT_SECS
}

fn default_run_on_startup() -> bool {
    DEFAULT_RUN_ON_STARTUP
}

// Storage defaults
fn default_cache_file() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_FILE)
}

fn default_backup_dir() -> Option<PathBuf> {
    Some(PathBuf::from(DEFAULT_BACKUP_DIR))
}

fn default_favorites_path() -> PathBuf {
    PathBuf::from(DEFAULT_FAVORITES_PATH)
}

// Guide defaults
fn default_generator_name() -> String {
    DEFAULT_GENERATOR_NAME.to_string()
}

fn default_guide_language() -> String {
    DEFAULT_GUIDE_LANGUAGE.to_string()
}

fn default_fallback_title() -> String {
    DEFAULT_FALLBACK_TITLE.to_string()
}

// Logging defaults
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_log_json() -> bool {
    DEFAULT_LOG_JSON
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_update_interval_minutes(),
            epg_hours: default_epg_hours(),
            timeout_secs: default_update_timeout_secs(),
            run_on_startup: default_run_on_startup(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            cache_file: default_cache_file(),
            backup_dir: default_backup_dir(),
            favorites_path: default_favorites_path(),
        }
    }
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            generator_name: default_generator_name(),
            language: default_guide_language(),
            fallback_title: default_fallback_title(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_log_json(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            web: WebConfig::default(),
            source: SourceConfig::default(),
            updates: UpdateConfig::default(),
            storage: StorageConfig::default(),
            guide: GuideConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl UpdateConfig {
    /// Scheduler period and cache time-to-live
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.saturating_mul(60))
    }

    /// Scheduler period as a chrono duration, saturating for out-of-range values
    pub fn interval_delta(&self) -> chrono::Duration {
        i64::try_from(self.interval_minutes)
            .ok()
            .and_then(chrono::Duration::try_minutes)
            .unwrap_or(chrono::Duration::MAX)
    }

    /// Guide look-ahead as a signed chrono duration for timestamp arithmetic
    ///
    /// Saturates instead of panicking; `Config::validate` keeps real values in range.
    pub fn epg_window(&self) -> chrono::Duration {
        i64::try_from(self.epg_hours)
            .ok()
            .and_then(chrono::Duration::try_hours)
            .unwrap_or(chrono::Duration::MAX)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl SourceConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl Config {
    /// Layer defaults, an optional TOML file and environment overrides
    ///
    /// Precedence, lowest first: built-in defaults, the TOML file,
    /// `PLUTO_PROXY_*` variables (`__` separates nested keys), then the bare
    /// `PORT`, `UPDATE_INTERVAL` and `EPG_HOURS` variables.
    pub fn load_from_file(config_file: impl AsRef<Path>) -> AppResult<Self> {
        let config_file = config_file.as_ref();
        if config_file.exists() {
            info!("Loading configuration from {}", config_file.display());
        } else {
            debug!(
                "Configuration file {} not found, using defaults and environment",
                config_file.display()
            );
        }

        let config: Config = Self::figment(config_file)
            .extract()
            .map_err(|e| AppError::configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn figment(config_file: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(
                Env::raw()
                    .only(&["PORT", "UPDATE_INTERVAL", "EPG_HOURS"])
                    .map(|key| match key.as_str().to_ascii_uppercase().as_str() {
                        "PORT" => "web.port".into(),
                        "UPDATE_INTERVAL" => "updates.interval_minutes".into(),
                        "EPG_HOURS" => "updates.epg_hours".into(),
                        _ => key.into(),
                    }),
            )
    }

    /// Reject values that would make the update cycle meaningless
    pub fn validate(&self) -> AppResult<()> {
        check_range(
            "updates.interval_minutes",
            self.updates.interval_minutes,
            MAX_UPDATE_INTERVAL_MINUTES,
        )?;
        check_range("updates.epg_hours", self.updates.epg_hours, MAX_EPG_HOURS)?;
        check_range(
            "updates.timeout_secs",
            self.updates.timeout_secs,
            MAX_UPDATE_TIMEOUT_SECS,
        )?;
        check_range(
            "source.fetch_timeout_secs",
            self.source.fetch_timeout_secs,
            MAX_FETCH_TIMEOUT_SECS,
        )?;
        url::Url::parse(&self.source.api_url).map_err(|e| {
            AppError::configuration(format!(
                "source.api_url '{}' is not a valid URL: {e}",
                self.source.api_url
            ))
        })?;
        Ok(())
    }
}

fn check_range(key: &str, value: u64, max: u64) -> AppResult<()> {
    if value == 0 || value > max {
        return Err(AppError::configuration(format!(
            "{key} must be between 1 and {max}, got {value}"
        )));
    }
    Ok(())
}
