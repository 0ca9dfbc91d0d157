/// `load_config` module: Loads a static YAML config and injects secrets from the environment
/// into the core `MigrationConfig`.
///
/// This module is the only place where the user-supplied YAML is parsed.
///
/// # Responsibilities
/// - Parse the config file into the intermediate YAML-side structs below
/// - Inject access tokens from `SOURCE_VIMEO_ACCESS_TOKEN` / `DESTINATION_VIMEO_ACCESS_TOKEN`
/// - Let `SOURCE_VIMEO_FOLDER_ID` / `DESTINATION_VIMEO_FOLDER_ID` override the folder ids
/// - Fill unset optional keys with the core defaults
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};
use vimeo_migrate_core::config::{
    AccountConfig, MigrationConfig, RetryConfig, DEFAULT_API_BASE_URL, DEFAULT_DOWNLOAD_DIR,
    DEFAULT_PAGE_SIZE,
};

pub const SOURCE_TOKEN_ENV: &str = "SOURCE_VIMEO_ACCESS_TOKEN";
pub const DESTINATION_TOKEN_ENV: &str = "DESTINATION_VIMEO_ACCESS_TOKEN";
pub const SOURCE_FOLDER_ENV: &str = "SOURCE_VIMEO_FOLDER_ID";
pub const DESTINATION_FOLDER_ENV: &str = "DESTINATION_VIMEO_FOLDER_ID";

#[derive(Debug, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub source: FolderSection,
    #[serde(default)]
    pub destination: FolderSection,
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub insecure_skip_tls_verify: bool,
    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct FolderSection {
    #[serde(default)]
    pub folder_id: Option<FolderId>,
}

/// Folder ids are numeric on Vimeo; accept them quoted or bare.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FolderId {
    Text(String),
    Number(u64),
}

impl FolderId {
    fn into_string(self) -> String {
        match self {
            FolderId::Text(text) => text,
            FolderId::Number(number) => number.to_string(),
        }
    }
}

/// Loads a static YAML config file (no secrets) and injects required env vars for secrets.
/// Returns a fully merged MigrationConfig or an error.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<MigrationConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let raw: CliConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    let source = AccountConfig {
        access_token: required_env(SOURCE_TOKEN_ENV)?,
        folder_id: folder_id(raw.source.folder_id, SOURCE_FOLDER_ENV, "source")?,
    };
    let destination = AccountConfig {
        access_token: required_env(DESTINATION_TOKEN_ENV)?,
        folder_id: folder_id(raw.destination.folder_id, DESTINATION_FOLDER_ENV, "destination")?,
    };

    let config = MigrationConfig {
        source,
        destination,
        download_dir: raw
            .download_dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOAD_DIR)),
        api_base_url: raw
            .api_base_url
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
        page_size: raw.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        request_timeout: raw.request_timeout_secs.map(Duration::from_secs),
        insecure_skip_tls_verify: raw.insecure_skip_tls_verify,
        retry: raw.retry,
    };

    if config.page_size == 0 {
        error!("page_size must be at least 1");
        anyhow::bail!("page_size must be at least 1");
    }

    let multiplier = config.retry.backoff_multiplier;
    if !multiplier.is_finite() || multiplier < 1.0 {
        error!(backoff_multiplier = multiplier, "retry.backoff_multiplier must be a finite number >= 1.0");
        anyhow::bail!("retry.backoff_multiplier must be a finite number >= 1.0, got {multiplier}");
    }

    info!(
        source_folder = %config.source.folder_id,
        destination_folder = %config.destination.folder_id,
        download_dir = %config.download_dir.display(),
        "Config loaded and merged successfully"
    );
    Ok(config)
}

fn required_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => {
            info!(var = name, len = value.len(), "Access token found in env");
            Ok(value)
        }
        Ok(_) => {
            error!(var = name, "Environment variable is empty");
            anyhow::bail!("{name} environment variable is empty")
        }
        Err(e) => {
            error!(error = ?e, var = name, "Environment variable not set");
            Err(e).with_context(|| format!("{name} environment variable not set"))
        }
    }
}

/// Environment override first, then the YAML value.
fn folder_id(from_file: Option<FolderId>, env_name: &str, side: &str) -> Result<String> {
    if let Ok(value) = std::env::var(env_name) {
        if !value.trim().is_empty() {
            info!(var = env_name, side, "Folder id overridden from env");
            return Ok(value.trim().to_string());
        }
    }
    match from_file.map(FolderId::into_string) {
        Some(id) if !id.trim().is_empty() => Ok(id),
        _ => {
            error!(side, "No folder id configured");
            anyhow::bail!("{side}.folder_id must be set in the config file or via {env_name}")
        }
    }
}
