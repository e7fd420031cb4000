use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_API_BASE_URL: &str = "https://legaldocs-backend.onrender.com";
pub const SETTINGS_FILE_NAME: &str = "legaldocs.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub progress_interval_ms: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            request_timeout_secs: 120,
            progress_interval_ms: 800,
        }
    }
}

impl ClientSettings {
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Command line value, when given, wins over every other layer.
    pub fn with_api_base_url(mut self, api_base_url: Option<String>) -> Self {
        if let Some(url) = api_base_url {
            self.api_base_url = url;
        }
        self
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    api_base_url: Option<String>,
    request_timeout_secs: Option<u64>,
    progress_interval_ms: Option<u64>,
}

/// Defaults, then the first settings file found, then environment overrides.
/// The resulting base URL is validated and normalized.
pub fn load_settings() -> Result<ClientSettings, ConfigError> {
    let mut settings = ClientSettings::default();

    if let Some(path) = settings_file_candidates()
        .into_iter()
        .find(|path| path.is_file())
    {
        tracing::info!(path = %path.display(), "loading client settings file");
        apply_settings_file(&mut settings, &path)?;
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;
    settings.api_base_url = normalize_base_url(&settings.api_base_url)?;
    Ok(settings)
}

fn settings_file_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(SETTINGS_FILE_NAME)];
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("legaldocs").join(SETTINGS_FILE_NAME));
    }
    candidates
}

fn apply_settings_file(settings: &mut ClientSettings, path: &Path) -> Result<(), ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let file_cfg: SettingsFile = toml::from_str(&raw).map_err(|err| ConfigError::ParseFile {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;

    if let Some(v) = file_cfg.api_base_url {
        settings.api_base_url = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = require_positive("request_timeout_secs", v)?;
    }
    if let Some(v) = file_cfg.progress_interval_ms {
        settings.progress_interval_ms = require_positive("progress_interval_ms", v)?;
    }
    Ok(())
}

fn apply_env_overrides(
    settings: &mut ClientSettings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(v) = lookup("LEGALDOCS_API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = lookup("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
        settings.request_timeout_secs = parse_positive("APP__REQUEST_TIMEOUT_SECS", &v)?;
    }
    if let Some(v) = lookup("APP__PROGRESS_INTERVAL_MS") {
        settings.progress_interval_ms = parse_positive("APP__PROGRESS_INTERVAL_MS", &v)?;
    }
    Ok(())
}

fn parse_positive(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    let parsed = value
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        })?;
    require_positive(key, parsed)
}

/// A zero timeout fails every request; a zero tick period cannot drive a timer.
fn require_positive(key: &'static str, value: u64) -> Result<u64, ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        });
    }
    Ok(value)
}

/// Trims whitespace and trailing slashes; requires an absolute http(s) URL.
pub fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let invalid = |reason: String| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };

    let parsed = Url::parse(trimmed).map_err(|err| invalid(err.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
    }
    if parsed.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(trimmed.to_string())
}
