/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// Web server defaults
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;

// Remote catalog defaults
pub const DEFAULT_API_URL: &str = "http://api.pluto.tv/v2/channels";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
pub const MAX_FETCH_TIMEOUT_SECS: u64 = 60 * 60;

// Update cycle defaults
pub const DEFAULT_UPDATE_INTERVAL_MINUTES: u64 = 30;
pub const DEFAULT_EPG_HOURS: u64 = 24;
pub const DEFAULT_UPDATE_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_RUN_ON_STARTUP: bool = true;
pub const MAX_UPDATE_INTERVAL_MINUTES: u64 = 7 * 24 * 60;
pub const MAX_EPG_HOURS: u64 = 14 * 24;
pub const MAX_UPDATE_TIMEOUT_SECS: u64 = 24 * 60 * 60;

// Storage defaults
pub const DEFAULT_CACHE_FILE: &str = "cache.json";
pub const DEFAULT_BACKUP_DIR: &str = ".";
pub const DEFAULT_FAVORITES_PATH: &str = "./pluto-favorites";

// Guide defaults
pub const DEFAULT_GENERATOR_NAME: &str = "pluto-iptv-proxy";
pub const DEFAULT_GUIDE_LANGUAGE: &str = "en";
pub const DEFAULT_FALLBACK_TITLE: &str = "No title";

// Logging defaults
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_JSON: bool = false;

// Environment
pub const ENV_PREFIX: &str = "PLUTO_PROXY_";
