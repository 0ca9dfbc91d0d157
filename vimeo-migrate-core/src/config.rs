use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_API_BASE_URL: &str = "https://api.vimeo.com";
pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_DOWNLOAD_DIR: &str = "temp_vimeo_downloads";

/// Credential and folder for one side of the migration.
#[derive(Clone)]
pub struct AccountConfig {
    pub access_token: String,
    pub folder_id: String,
}

// Keeps the token out of logs and `{:?}` reports.
impl fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountConfig")
            .field("access_token", &format_args!("<{} chars>", self.access_token.len()))
            .field("folder_id", &self.folder_id)
            .finish()
    }
}

/// Everything a migration run needs, already merged from file and environment.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    pub source: AccountConfig,
    pub destination: AccountConfig,
    /// Temporary storage for downloads; created at startup if absent.
    pub download_dir: PathBuf,
    pub api_base_url: String,
    pub page_size: u32,
    pub request_timeout: Option<Duration>,
    pub insecure_skip_tls_verify: bool,
    pub retry: RetryConfig,
}

impl MigrationConfig {
    pub fn new(source: AccountConfig, destination: AccountConfig) -> Self {
        Self {
            source,
            destination,
            download_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout: None,
            insecure_skip_tls_verify: false,
            retry: RetryConfig::default(),
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            source_folder = %self.source.folder_id,
            destination_folder = %self.destination.folder_id,
            download_dir = %self.download_dir.display(),
            api_base_url = %self.api_base_url,
            page_size = self.page_size,
            "Loaded MigrationConfig"
        );
        if self.insecure_skip_tls_verify {
            warn!("TLS certificate verification is disabled for all API requests");
        }
        debug!(?self, "MigrationConfig loaded (full debug)");
    }
}

/// Exponential backoff applied to remote metadata calls.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt; 0 disables retrying.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl RetryConfig {
    /// A policy that never retries.
    pub fn disabled() -> Self {
        Self {
            max_attempts: 0,
            ..Self::default()
        }
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    10_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}
