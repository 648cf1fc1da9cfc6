//! Configuration management for media-shelf
//!
//! Settings are read once at startup from `config.toml` with environment
//! overrides, validated, and then handed to each component explicitly.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::PathBuf;

/// Complete server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    // ═══ NETWORK ═══
    /// IP address the HTTP listener binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port for the HTTP listener
    #[serde(default = "default_port")]
    pub port: u16,

    // ═══ STORAGE ═══
    /// Directory under which all managed files and folders live
    #[serde(default = "default_data_root")]
    pub data_root: String,

    /// Directory holding derived renditions (disposable)
    #[serde(default = "default_cache_root")]
    pub cache_root: String,

    /// Maximum accepted request body for uploads, in MB
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: u64,

    // ═══ RENDERING ═══
    /// Target sizes a client may ask a rendition for
    #[serde(default = "default_render_sizes")]
    pub render_sizes: Vec<u32>,

    /// JPEG quality used when encoding renditions
    #[serde(default = "default_render_quality")]
    pub render_quality: u8,

    /// Lifetime advertised to clients for rendered images
    #[serde(default = "default_render_max_age_secs")]
    pub render_max_age_secs: u64,

    // ═══ ACCOUNTS ═══
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

/// A configured account
#[derive(Debug, Deserialize, Clone)]
pub struct UserConfig {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub superuser: bool,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_data_root() -> String {
    "./data".to_string()
}

fn default_cache_root() -> String {
    "./cache".to_string()
}

fn default_max_upload_mb() -> u64 {
    100
}

fn default_render_sizes() -> Vec<u32> {
    vec![128, 256, 512, 1024]
}

fn default_render_quality() -> u8 {
    85
}

fn default_render_max_age_secs() -> u64 {
    86_400
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            data_root: default_data_root(),
            cache_root: default_cache_root(),
            max_upload_mb: default_max_upload_mb(),
            render_sizes: default_render_sizes(),
            render_quality: default_render_quality(),
            render_max_age_secs: default_render_max_age_secs(),
            users: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from config.toml with environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        // Packaged layout first, then the working directory
        let settings = Config::builder()
            .add_source(File::with_name("media-shelf/config").required(false))
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("MEDIA_SHELF").separator("__"))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.port == 0 {
            return Err(config::ConfigError::Message("port cannot be 0".into()));
        }

        if self.data_root.is_empty() {
            return Err(config::ConfigError::Message(
                "data_root cannot be empty".into(),
            ));
        }

        if self.cache_root.is_empty() {
            return Err(config::ConfigError::Message(
                "cache_root cannot be empty".into(),
            ));
        }

        if self.render_sizes.is_empty() {
            return Err(config::ConfigError::Message(
                "render_sizes must list at least one size".into(),
            ));
        }

        if self.render_sizes.contains(&0) {
            return Err(config::ConfigError::Message(
                "render_sizes must be positive".into(),
            ));
        }

        if !(1..=100).contains(&self.render_quality) {
            return Err(config::ConfigError::Message(
                "render_quality must be between 1 and 100".into(),
            ));
        }

        if self.max_upload_mb == 0 {
            return Err(config::ConfigError::Message(
                "max_upload_mb must be greater than 0".into(),
            ));
        }

        let mut seen = HashSet::new();
        for user in &self.users {
            if user.username.trim().is_empty() {
                return Err(config::ConfigError::Message(
                    "usernames cannot be empty".into(),
                ));
            }
            if !seen.insert(user.username.as_str()) {
                return Err(config::ConfigError::Message(format!(
                    "duplicate user: {}",
                    user.username
                )));
            }
        }

        Ok(())
    }

    /// Get bind address and port as socket address
    pub fn listen_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Get data root as PathBuf
    pub fn data_root_path(&self) -> PathBuf {
        PathBuf::from(&self.data_root)
    }

    /// Get cache root as PathBuf
    pub fn cache_root_path(&self) -> PathBuf {
        PathBuf::from(&self.cache_root)
    }

    /// Get maximum upload size in bytes
    pub fn max_upload_bytes(&self) -> usize {
        (self.max_upload_mb as usize).saturating_mul(1024 * 1024)
    }
}
