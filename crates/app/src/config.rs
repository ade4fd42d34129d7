//! Cart Config

use std::{path::PathBuf, time::Duration};

use clap::Args;
use reqwest::Url;

use crate::storage::DEFAULT_CART_KEY;

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Remote cart API settings.
#[derive(Debug, Args)]
pub struct RemoteConfig {
    /// Base URL of the storefront cart API
    #[arg(long, env = "CART_API_BASE_URL", default_value = "http://localhost:5000")]
    pub api_base_url: Url,

    /// Timeout for each cart API request, in seconds
    #[arg(long, env = "CART_REQUEST_TIMEOUT_SECONDS", default_value_t = 10u64)]
    pub request_timeout_seconds: u64,
}

impl RemoteConfig {
    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Local guest cart storage settings.
#[derive(Debug, Args)]
pub struct StorageConfig {
    /// Directory holding the local key-value files
    #[arg(long, env = "CART_STORAGE_DIR", default_value = ".buybin")]
    pub storage_dir: PathBuf,

    /// Key the guest cart is stored under
    #[arg(long, env = "CART_STORAGE_KEY", default_value = DEFAULT_CART_KEY)]
    pub storage_key: String,
}

/// Everything needed to run a cart session.
#[derive(Debug, Args)]
pub struct CartConfig {
    /// Remote cart API settings.
    #[command(flatten)]
    pub remote: RemoteConfig,

    /// Local storage settings.
    #[command(flatten)]
    pub storage: StorageConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,
}
