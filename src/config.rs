use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ContinuousConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
    pub identity: IdentityConfig,
    pub projects: ProjectsConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub transport: String,
    pub log_level: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// `"postgres"` or `"local"`.
    pub backend: String,
    pub database_url: String,
    pub local_path: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    pub cache_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    pub default_limit: usize,
    pub half_life_days: f64,
    pub link_threshold: f64,
    pub link_limit: usize,
    pub contradiction_threshold: f64,
    pub consolidate_threshold: f64,
    pub consolidate_min_age_days: i64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IdentityConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ProjectsConfig {
    /// Project names matched against the working directory path.
    pub known: Vec<String>,
    /// Forced current project. Empty means detect.
    pub current: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".into(),
            log_level: "info".into(),
            host: "127.0.0.1".into(),
            port: 8765,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let local_path = default_continuous_dir()
            .join("memories.json")
            .to_string_lossy()
            .into_owned();
        Self {
            backend: "postgres".into(),
            database_url: String::new(),
            local_path,
            max_connections: 5,
            connect_timeout_secs: 10,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let cache_dir = default_continuous_dir()
            .join("models")
            .to_string_lossy()
            .into_owned();
        Self {
            provider: "local".into(),
            model: "all-MiniLM-L6-v2".into(),
            cache_dir,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_limit: 5,
            half_life_days: crate::memory::decay::DEFAULT_HALF_LIFE_DAYS,
            link_threshold: 0.75,
            link_limit: 3,
            contradiction_threshold: 0.6,
            consolidate_threshold: 0.9,
            consolidate_min_age_days: 7,
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            path: default_continuous_dir()
                .join("IDENTITY.md")
                .to_string_lossy()
                .into_owned(),
        }
    }
}

/// Returns `~/.continuous/`, or `./.continuous` when no home directory is known.
pub fn default_continuous_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".continuous")
}

/// Returns the default config file path: `~/.continuous/config.toml`
pub fn default_config_path() -> PathBuf {
    default_continuous_dir().join("config.toml")
}

impl ContinuousConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            ContinuousConfig::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply environment overrides. `lookup` is `std::env::var` outside tests.
    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("CONTINUOUS_DATABASE_URL").or_else(|| lookup("DATABASE_URL")) {
            self.storage.database_url = val;
        }
        if let Some(val) = lookup("CONTINUOUS_BACKEND") {
            self.storage.backend = val;
        }
        if let Some(val) = lookup("CONTINUOUS_PROJECT") {
            self.projects.current = val;
        }
        if let Some(val) = lookup("CONTINUOUS_IDENTITY") {
            self.identity.path = val;
        }
        if let Some(val) = lookup("CONTINUOUS_LOG_LEVEL") {
            self.server.log_level = val;
        }
    }

    pub fn resolved_local_path(&self) -> PathBuf {
        expand_tilde(&self.storage.local_path)
    }

    pub fn resolved_identity_path(&self) -> PathBuf {
        expand_tilde(&self.identity.path)
    }

    /// True when the postgres backend is selected and a URL is available.
    pub fn uses_postgres(&self) -> bool {
        self.storage.backend.eq_ignore_ascii_case("postgres")
            && !self.storage.database_url.trim().is_empty()
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
