//! Configuration module for listsync.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default AniList GraphQL endpoint
pub const DEFAULT_API_URL: &str = "https://graphql.anilist.co";

/// Environment variable consulted for the access token
pub const TOKEN_ENV_VAR: &str = "LISTSYNC_TOKEN";

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for listsync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sync: SyncConfig,
    pub rate_limiting: RateLimitingConfig,
    pub anilist: AniListConfig,
    pub logging: LoggingConfig,
}

/// Synchronization behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Submit large progress jumps as several smaller mutations.
    pub incremental: bool,
    /// Never touch entries that are already `COMPLETED` remotely.
    pub preserve_completed_status: bool,
}

/// Request budget and backoff settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitingConfig {
    /// Maximum outbound mutations per minute.
    pub requests_per_minute: u32,
    /// Wait applied after a rate-limit signal that carries no Retry-After.
    pub default_retry_after_secs: u64,
    /// Retries for 5xx / network failures of a single step.
    pub server_error_max_retries: u32,
    /// First backoff delay; doubles on every retry.
    pub server_error_base_delay_ms: u64,
}

/// Remote service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AniListConfig {
    /// GraphQL endpoint.
    pub api_url: String,
    /// Per-request transport timeout in seconds.
    pub request_timeout_secs: u64,
    /// Access token. Usually supplied via `LISTSYNC_TOKEN` or `--token`.
    pub access_token: Option<String>,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/listsync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("listsync")
            .join("config.yaml")
    }

    /// Resolve the access token: explicit value, then the environment, then the file.
    ///
    /// A blank source is skipped, so the next one still applies.
    pub fn resolve_token(&self, explicit: Option<&str>) -> Option<String> {
        let usable = |t: &String| !t.trim().is_empty();
        explicit
            .map(str::to_string)
            .filter(usable)
            .or_else(|| std::env::var(TOKEN_ENV_VAR).ok().filter(usable))
            .or_else(|| self.anilist.access_token.clone().filter(usable))
    }
}

impl RateLimitingConfig {
    /// Minimum spacing between two requests: `60s / requests_per_minute`.
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(60_000 / u64::from(self.requests_per_minute.max(1)))
    }

    pub fn default_retry_after(&self) -> Duration {
        Duration::from_secs(self.default_retry_after_secs)
    }

    pub fn server_error_base_delay(&self) -> Duration {
        Duration::from_millis(self.server_error_base_delay_ms)
    }
}

impl AniListConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            incremental: false,
            preserve_completed_status: true,
        }
    }
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 28,
            default_retry_after_secs: 60,
            server_error_max_retries: 3,
            server_error_base_delay_ms: 1000,
        }
    }
}

impl Default for AniListConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: 30,
            access_token: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"rate_limiting.requests_per_minute"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// AniList documents a hard ceiling of 90 requests per minute.
const MAX_REQUESTS_PER_MINUTE: u32 = 90;

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- rate_limiting ---
        if self.rate_limiting.requests_per_minute == 0
            || self.rate_limiting.requests_per_minute > MAX_REQUESTS_PER_MINUTE
        {
            errors.push(ValidationError {
                field: "rate_limiting.requests_per_minute".into(),
                message: format!("must be in range 1..={MAX_REQUESTS_PER_MINUTE}"),
            });
        }
        if self.rate_limiting.default_retry_after_secs == 0 {
            errors.push(ValidationError {
                field: "rate_limiting.default_retry_after_secs".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.rate_limiting.server_error_max_retries > 10 {
            errors.push(ValidationError {
                field: "rate_limiting.server_error_max_retries".into(),
                message: "must be at most 10".into(),
            });
        }
        if self.rate_limiting.server_error_base_delay_ms == 0 {
            errors.push(ValidationError {
                field: "rate_limiting.server_error_base_delay_ms".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- anilist ---
        if !self.anilist.api_url.starts_with("http://")
            && !self.anilist.api_url.starts_with("https://")
        {
            errors.push(ValidationError {
                field: "anilist.api_url".into(),
                message: format!("must be an http(s) URL, got '{}'", self.anilist.api_url),
            });
        }
        if self.anilist.request_timeout_secs == 0 {
            errors.push(ValidationError {
                field: "anilist.request_timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}', expected one of: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use listsync_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .sync_incremental(true)
///     .rate_limiting_requests_per_minute(60)
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- sync ---

    pub fn sync_incremental(mut self, enabled: bool) -> Self {
        self.config.sync.incremental = enabled;
        self
    }

    pub fn sync_preserve_completed_status(mut self, enabled: bool) -> Self {
        self.config.sync.preserve_completed_status = enabled;
        self
    }

    // --- rate_limiting ---

    pub fn rate_limiting_requests_per_minute(mut self, n: u32) -> Self {
        self.config.rate_limiting.requests_per_minute = n;
        self
    }

    pub fn rate_limiting_default_retry_after_secs(mut self, secs: u64) -> Self {
        self.config.rate_limiting.default_retry_after_secs = secs;
        self
    }

    pub fn rate_limiting_server_error_max_retries(mut self, n: u32) -> Self {
        self.config.rate_limiting.server_error_max_retries = n;
        self
    }

    pub fn rate_limiting_server_error_base_delay_ms(mut self, ms: u64) -> Self {
        self.config.rate_limiting.server_error_base_delay_ms = ms;
        self
    }

    // --- anilist ---

    pub fn anilist_api_url(mut self, url: impl Into<String>) -> Self {
        self.config.anilist.api_url = url.into();
        self
    }

    pub fn anilist_request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.anilist.request_timeout_secs = secs;
        self
    }

    pub fn anilist_access_token(mut self, token: impl Into<String>) -> Self {
        self.config.anilist.access_token = Some(token.into());
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    // -- Defaults --

    #[test]
    fn default_config_has_sensible_values() {
        let cfg = Config::default();
        assert!(!cfg.sync.incremental);
        assert!(cfg.sync.preserve_completed_status);
        assert_eq!(cfg.rate_limiting.requests_per_minute, 28);
        assert_eq!(cfg.rate_limiting.default_retry_after_secs, 60);
        assert_eq!(cfg.rate_limiting.server_error_max_retries, 3);
        assert_eq!(cfg.rate_limiting.server_error_base_delay_ms, 1000);
        assert_eq!(cfg.anilist.api_url, DEFAULT_API_URL);
        assert_eq!(cfg.anilist.request_timeout_secs, 30);
        assert!(cfg.anilist.access_token.is_none());
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn default_config_passes_validation() {
        let errors = Config::default().validate();
        assert!(errors.is_empty(), "unexpected validation errors: {errors:?}");
    }

    #[test]
    fn min_interval_is_derived_from_budget() {
        let mut cfg = RateLimitingConfig::default();
        cfg.requests_per_minute = 60;
        assert_eq!(cfg.min_interval(), Duration::from_secs(1));
        cfg.requests_per_minute = 28;
        assert_eq!(cfg.min_interval(), Duration::from_millis(2142));
    }

    // -- Loading --

    #[test]
    fn load_from_yaml_file() {
        let yaml = r#"
sync:
  incremental: true
  preserve_completed_status: false
rate_limiting:
  requests_per_minute: 85
  default_retry_after_secs: 30
  server_error_max_retries: 2
  server_error_base_delay_ms: 500
anilist:
  api_url: http://localhost:9999
  request_timeout_secs: 10
  access_token: "file-token"
logging:
  level: debug
"#;
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(yaml.as_bytes()).unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).expect("load config");
        assert!(cfg.sync.incremental);
        assert!(!cfg.sync.preserve_completed_status);
        assert_eq!(cfg.rate_limiting.requests_per_minute, 85);
        assert_eq!(cfg.rate_limiting.default_retry_after(), Duration::from_secs(30));
        assert_eq!(cfg.rate_limiting.server_error_max_retries, 2);
        assert_eq!(
            cfg.rate_limiting.server_error_base_delay(),
            Duration::from_millis(500)
        );
        assert_eq!(cfg.anilist.api_url, "http://localhost:9999");
        assert_eq!(cfg.anilist.request_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.anilist.access_token.as_deref(), Some("file-token"));
        assert_eq!(cfg.logging.level, "debug");
    }

    #[test]
    fn load_partial_yaml_fills_defaults() {
        let yaml = "sync:\n  incremental: true\n";
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(yaml.as_bytes()).unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).expect("load config");
        assert!(cfg.sync.incremental);
        assert!(cfg.sync.preserve_completed_status);
        assert_eq!(cfg.rate_limiting.requests_per_minute, 28);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn load_or_default_returns_default_on_missing_file() {
        let cfg = Config::load_or_default(Path::new("/nonexistent/listsync/config.yaml"));
        assert_eq!(cfg.rate_limiting.requests_per_minute, 28);
    }

    #[test]
    fn load_returns_error_on_invalid_yaml() {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(b"sync: [not, a, map").unwrap();
        tmp.flush().unwrap();

        assert!(Config::load(tmp.path()).is_err());
    }

    #[test]
    fn default_path_ends_with_listsync_config() {
        let path = Config::default_path();
        assert!(path.ends_with("listsync/config.yaml"));
    }

    #[test]
    fn resolve_token_prefers_explicit_value() {
        let cfg = ConfigBuilder::new().anilist_access_token("from-file").build();
        assert_eq!(
            cfg.resolve_token(Some("explicit")).as_deref(),
            Some("explicit")
        );
    }

    #[test]
    fn resolve_token_blank_explicit_falls_back_to_file() {
        let cfg = ConfigBuilder::new().anilist_access_token("from-file").build();
        if std::env::var(TOKEN_ENV_VAR).is_err() {
            assert_eq!(cfg.resolve_token(Some("")).as_deref(), Some("from-file"));
            assert_eq!(cfg.resolve_token(Some("  ")).as_deref(), Some("from-file"));
        }
    }

    #[test]
    fn resolve_token_ignores_blank_values() {
        let cfg = ConfigBuilder::new().anilist_access_token("   ").build();
        if std::env::var(TOKEN_ENV_VAR).is_err() {
            assert!(cfg.resolve_token(None).is_none());
        }
    }

    // -- Validation --

    #[test]
    fn validate_catches_request_budget_out_of_range() {
        let zero = ConfigBuilder::new()
            .rate_limiting_requests_per_minute(0)
            .build();
        assert!(zero
            .validate()
            .iter()
            .any(|e| e.field == "rate_limiting.requests_per_minute"));

        let too_many = ConfigBuilder::new()
            .rate_limiting_requests_per_minute(120)
            .build();
        assert!(too_many
            .validate()
            .iter()
            .any(|e| e.field == "rate_limiting.requests_per_minute"));
    }

    #[test]
    fn validate_catches_zero_backoff_values() {
        let cfg = ConfigBuilder::new()
            .rate_limiting_default_retry_after_secs(0)
            .rate_limiting_server_error_base_delay_ms(0)
            .build();
        let fields: Vec<_> = cfg.validate().into_iter().map(|e| e.field).collect();
        assert!(fields.contains(&"rate_limiting.default_retry_after_secs".to_string()));
        assert!(fields.contains(&"rate_limiting.server_error_base_delay_ms".to_string()));
    }

    #[test]
    fn validate_catches_bad_api_url() {
        let cfg = ConfigBuilder::new().anilist_api_url("graphql.anilist.co").build();
        assert!(cfg.validate().iter().any(|e| e.field == "anilist.api_url"));
    }

    #[test]
    fn validate_catches_invalid_log_level() {
        let cfg = ConfigBuilder::new().logging_level("verbose").build();
        let errors = cfg.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "logging.level");
        assert!(errors[0].to_string().starts_with("logging.level: invalid level"));
    }

    #[test]
    fn validate_accepts_all_valid_log_levels() {
        for level in VALID_LOG_LEVELS {
            let cfg = ConfigBuilder::new().logging_level(*level).build();
            assert!(cfg.validate().is_empty(), "level {level} should be valid");
        }
    }

    // -- Builder --

    #[test]
    fn builder_starts_from_defaults() {
        let cfg = ConfigBuilder::new().build();
        assert_eq!(cfg.rate_limiting.requests_per_minute, 28);
        assert!(cfg.sync.preserve_completed_status);
    }

    #[test]
    fn builder_overrides_fields() {
        let cfg = ConfigBuilder::new()
            .sync_incremental(true)
            .sync_preserve_completed_status(false)
            .rate_limiting_requests_per_minute(60)
            .rate_limiting_server_error_max_retries(5)
            .anilist_api_url("http://127.0.0.1:8080")
            .anilist_request_timeout_secs(5)
            .logging_level("trace")
            .build();

        assert!(cfg.sync.incremental);
        assert!(!cfg.sync.preserve_completed_status);
        assert_eq!(cfg.rate_limiting.requests_per_minute, 60);
        assert_eq!(cfg.rate_limiting.server_error_max_retries, 5);
        assert_eq!(cfg.anilist.api_url, "http://127.0.0.1:8080");
        assert_eq!(cfg.anilist.request_timeout_secs, 5);
        assert_eq!(cfg.logging.level, "trace");
    }

    #[test]
    fn builder_build_validated_reports_errors() {
        let result = ConfigBuilder::new()
            .rate_limiting_requests_per_minute(0)
            .build_validated();
        assert!(result.is_err());

        let result = ConfigBuilder::new().build_validated();
        assert!(result.is_ok());
    }
}
