//! Configuration system for Starprobe.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $STARPROBE_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/starprobe/config.toml
//!   3. ~/.config/starprobe/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const MIB: u64 = 1024 * 1024;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StarprobeConfig {
    pub api: ApiConfig,
    pub measurement: MeasurementConfig,
    pub provider: ProviderConfig,
    pub access: AccessConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Address the HTTP API binds to.
    pub bind: String,
    /// TCP port for the HTTP API. 0 = OS-assigned.
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasurementConfig {
    /// Size of the reusable random block backing each download.
    pub chunk_size_bytes: usize,
    /// Download size when the client does not ask for one.
    pub default_download_bytes: u64,
    /// Ceiling applied to every download request.
    pub max_download_bytes: u64,
    /// Read size when an upload is drained through a reader. Streamed HTTP
    /// bodies are counted per frame and ignore it.
    pub upload_read_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Lookup endpoint; the address is appended as a path segment.
    pub base_url: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// User ids treated as administrators.
    pub admin_users: Vec<u64>,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for StarprobeConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            measurement: MeasurementConfig::default(),
            provider: ProviderConfig::default(),
            access: AccessConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 9100,
        }
    }
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self {
            chunk_size_bytes: MIB as usize,
            default_download_bytes: 10 * MIB,
            max_download_bytes: 100 * MIB,
            upload_read_bytes: 64 * 1024,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://ip-api.com/json".to_string(),
            timeout_ms: 3000,
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("starprobe")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl StarprobeConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            StarprobeConfig::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject values no measurement can run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.measurement.chunk_size_bytes == 0 {
            return Err(ConfigError::Invalid(
                "measurement.chunk_size_bytes must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFailed(path.to_path_buf(), e))?;
        toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.to_path_buf(), e))
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("STARPROBE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&StarprobeConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Whether `user` is listed as an administrator.
    pub fn is_admin(&self, user: u64) -> bool {
        self.access.admin_users.contains(&user)
    }

    /// Apply STARPROBE_* env var overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(v) = get("STARPROBE_API__BIND") {
            self.api.bind = v;
        }
        if let Some(p) = get("STARPROBE_API__PORT").and_then(|v| v.parse().ok()) {
            self.api.port = p;
        }
        if let Some(n) = get("STARPROBE_MEASUREMENT__MAX_DOWNLOAD_BYTES")
            .and_then(|v| v.parse().ok())
        {
            self.measurement.max_download_bytes = n;
        }
        if let Some(v) = get("STARPROBE_PROVIDER__BASE_URL") {
            self.provider.base_url = v;
        }
        if let Some(ms) = get("STARPROBE_PROVIDER__TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.provider.timeout_ms = ms;
        }
    }
}
