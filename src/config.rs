//! Configuration types for zip-collector
//!
//! The core only ever sees a finished [`Config`]. Loading it from the process
//! environment ([`Config::from_env`]) is a convenience for the binary.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::ToSchema;

/// Task and archive limits
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TaskConfig {
    /// Maximum number of tasks alive at the same time (default: 3)
    #[serde(default = "default_max_tasks")]
    pub max_tasks: usize,

    /// Number of files an archive holds; reaching it makes the task full (default: 3)
    #[serde(default = "default_max_files_per_archive")]
    pub max_files_per_archive: usize,

    /// Permitted file extensions, lower-case without leading dot (default: ["jpeg", "pdf"])
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            max_tasks: default_max_tasks(),
            max_files_per_archive: default_max_files_per_archive(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

/// Outbound fetch settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FetchConfig {
    /// Timeout for a single remote fetch, in seconds (default: 30)
    #[serde(default = "default_fetch_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub timeout: Duration,

    /// Fetches in flight at once while assembling one archive (default: 4)
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: default_fetch_timeout(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Host to bind to (default: "localhost")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to (default: 8080)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

impl ApiConfig {
    /// `host:port` string suitable for binding a listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Main configuration for ZipCollector
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Task and archive limits
    #[serde(default)]
    pub tasks: TaskConfig,

    /// Outbound fetch settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// REST API settings
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Build a config from the process environment over the defaults
    ///
    /// Recognised variables: `HOST`, `PORT`, `ALLOWED_EXTENSIONS` (comma
    /// separated), `MAX_TASKS`, `MAX_FILES_IN_ZIP`, `FETCH_TIMEOUT_SECS`,
    /// `MAX_CONCURRENT_FETCHES`. Empty values are ignored.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup over the defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Config::default();

        if let Some(host) = get("HOST") {
            config.api.host = host.trim().to_string();
        }
        if let Some(port) = get("PORT") {
            config.api.port = parse_number("PORT", &port)?;
        }
        if let Some(extensions) = get("ALLOWED_EXTENSIONS") {
            config.tasks.allowed_extensions = extensions
                .split(',')
                .map(str::to_string)
                .collect();
        }
        if let Some(max_tasks) = get("MAX_TASKS") {
            config.tasks.max_tasks = parse_number("MAX_TASKS", &max_tasks)?;
        }
        if let Some(max_files) = get("MAX_FILES_IN_ZIP") {
            config.tasks.max_files_per_archive = parse_number("MAX_FILES_IN_ZIP", &max_files)?;
        }
        if let Some(secs) = get("FETCH_TIMEOUT_SECS") {
            config.fetch.timeout = Duration::from_secs(parse_number("FETCH_TIMEOUT_SECS", &secs)?);
        }
        if let Some(n) = get("MAX_CONCURRENT_FETCHES") {
            config.fetch.max_concurrent_fetches = parse_number("MAX_CONCURRENT_FETCHES", &n)?;
        }

        config.validate()
    }

    /// Check limits and normalise the extension whitelist
    ///
    /// Whitelist entries are trimmed and lower-cased; an entry that is empty,
    /// starts with `.` or contains a path separator is rejected.
    pub fn validate(mut self) -> Result<Self> {
        if self.tasks.max_tasks == 0 {
            return Err(config_error("max_tasks must be at least 1", "MAX_TASKS"));
        }
        if self.tasks.max_files_per_archive == 0 {
            return Err(config_error(
                "max_files_per_archive must be at least 1",
                "MAX_FILES_IN_ZIP",
            ));
        }
        if self.fetch.max_concurrent_fetches == 0 {
            return Err(config_error(
                "max_concurrent_fetches must be at least 1",
                "MAX_CONCURRENT_FETCHES",
            ));
        }

        let mut extensions = Vec::with_capacity(self.tasks.allowed_extensions.len());
        for raw in &self.tasks.allowed_extensions {
            let ext = raw.trim().to_lowercase();
            if ext.is_empty() || ext.starts_with('.') || ext.contains(['/', '\\']) {
                return Err(config_error(
                    format!("invalid extension in whitelist: {raw:?}"),
                    "ALLOWED_EXTENSIONS",
                ));
            }
            if !extensions.contains(&ext) {
                extensions.push(ext);
            }
        }
        if extensions.is_empty() {
            return Err(config_error(
                "allowed_extensions must not be empty",
                "ALLOWED_EXTENSIONS",
            ));
        }
        self.tasks.allowed_extensions = extensions;

        Ok(self)
    }
}

fn config_error(message: impl Into<String>, key: &str) -> Error {
    Error::Config {
        message: message.into(),
        key: Some(key.to_string()),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| config_error(format!("{key} must be a non-negative integer, got {value:?}"), key))
}

fn default_max_tasks() -> usize {
    3
}

fn default_max_files_per_archive() -> usize {
    3
}

fn default_allowed_extensions() -> Vec<String> {
    vec!["jpeg".into(), "pdf".into()]
}

fn default_fetch_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_concurrent_fetches() -> usize {
    4
}

fn default_host() -> String {
    "localhost".into()
}

fn default_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
