//! Application configuration
//!
//! This module provides centralized configuration management using the `config` crate.
//! Configuration can be loaded from config files and environment variables.
//! Each component receives the section it needs at construction.

use crate::models::RecordFormat;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub pabx: PabxConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub files: FilesConfig,
    pub server: ServerConfig,
    pub listing: ListingConfig,
    pub retry: RetryConfig,
    pub logging: LoggingConfig,
}

/// PABX connection configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PabxConfig {
    /// `host:port` of the PABX CDR output
    pub address: String,

    /// Largest record accepted before the framer gives up
    #[serde(default = "default_max_record_bytes")]
    pub max_record_bytes: usize,
}

fn default_max_record_bytes() -> usize {
    64 * 1024
}

/// Database configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection acquire timeout in seconds
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,

    /// Idle connection timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Create and join the code -> name directory table
    #[serde(default = "default_true")]
    pub lookup_table: bool,
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout() -> u64 {
    30
}

fn default_idle_timeout() -> u64 {
    600
}

fn default_true() -> bool {
    true
}

/// Side files written by the ingestion pipeline
#[derive(Debug, Deserialize, Clone, Default)]
pub struct FilesConfig {
    /// Byte-exact mirror of everything framed from the PABX
    #[serde(default)]
    pub dump_file: Option<PathBuf>,

    /// Diagnostic dump of records that failed validation
    #[serde(default)]
    pub error_file: Option<PathBuf>,
}

/// HTTP server configuration for the read path
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Serve the call listing at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of worker threads
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Comma separated origins allowed to call the API
    #[serde(default)]
    pub cors_origins: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_workers() -> usize {
    num_cpus::get()
}

/// How `page` turns into a row offset
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PageOffsetMode {
    /// `page * limit` for `page > 1`, as existing clients expect
    #[default]
    Legacy,
    /// `(page - 1) * limit`
    Standard,
}

/// Call listing configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ListingConfig {
    /// Rows per page when the request does not say
    #[serde(default = "default_limit")]
    pub default_limit: i64,

    /// Number of distinct bands before the group counter wraps
    #[serde(default = "default_group_cycle")]
    pub group_cycle: u32,

    #[serde(default)]
    pub page_offset: PageOffsetMode,
}

fn default_limit() -> i64 {
    200
}

fn default_group_cycle() -> u32 {
    2
}

/// Retry policy for failed appends
#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    /// Total attempts including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_backoff() -> u64 {
    200
}

fn default_max_backoff() -> u64 {
    5_000
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from environment and optional config files
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let mut builder = Self::with_defaults(Config::builder())?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false));

        // pbxlog.{yaml,toml,json} in the usual places, most specific last
        if let Ok(home) = env::var("HOME") {
            builder = builder
                .add_source(File::with_name(&format!("{}/.pbxlog/pbxlog", home)).required(false))
                .add_source(File::with_name(&format!("{}/pbxlog", home)).required(false));
        }

        let config = builder
            .add_source(File::with_name("pbxlog").required(false))
            // Load from environment variables with PBXLOG_ prefix
            .add_source(
                Environment::with_prefix("PBXLOG")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Self::with_defaults(Config::builder())?
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("PBXLOG")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    fn with_defaults(
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        builder
            .set_default("pabx.max_record_bytes", default_max_record_bytes() as i64)?
            .set_default("database.max_connections", 5)?
            .set_default("database.lookup_table", true)?
            .set_default("server.enabled", true)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.workers", num_cpus::get() as i64)?
            .set_default("server.cors_origins", "")?
            .set_default("listing.default_limit", 200)?
            .set_default("listing.group_cycle", 2)?
            .set_default("listing.page_offset", "legacy")?
            .set_default("retry.max_attempts", 5)?
            .set_default("retry.initial_backoff_ms", 200)?
            .set_default("retry.max_backoff_ms", 5_000)?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pabx.address.trim().is_empty() {
            return Err(ConfigError::Message("pabx.address is required".to_string()));
        }
        if self.pabx.max_record_bytes < RecordFormat::LONG_LEN {
            return Err(ConfigError::Message(format!(
                "pabx.max_record_bytes must be at least {}",
                RecordFormat::LONG_LEN
            )));
        }
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Message("database.url is required".to_string()));
        }
        if self.listing.group_cycle == 0 {
            return Err(ConfigError::Message(
                "listing.group_cycle must be at least 1".to_string(),
            ));
        }
        if self.listing.default_limit < 1 {
            return Err(ConfigError::Message(
                "listing.default_limit must be at least 1".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Message(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the server bind address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (1 = first retry).
    ///
    /// Doubles from `initial_backoff_ms`, capped at `max_backoff_ms`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(32);
        let millis = self
            .initial_backoff_ms
            .saturating_mul(1u64 << shift)
            .min(self.max_backoff_ms);
        Duration::from_millis(millis)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
        }
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            group_cycle: default_group_cycle(),
            page_offset: PageOffsetMode::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
