//! Configuration file discovery and loading.

use crate::env;
use crate::error::{ConfigError, ConfigResult};
use crate::types::{GatewayConfig, DEFAULT_PORT, DEFAULT_TIMEOUT};
use crate::validation::{duplicate_route_names, validate};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// System-wide directory searched after the given path
pub const SYSTEM_CONFIG_DIR: &str = "/etc/ai-gateway";

/// Loads a [`GatewayConfig`] from YAML.
///
/// The file is looked up as given, then inside each search directory. The
/// first readable candidate wins.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    file: PathBuf,
    search_dirs: Vec<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Loader for `config.yaml` with the system directory as fallback
    #[must_use]
    pub fn new() -> Self {
        Self {
            file: PathBuf::from(DEFAULT_CONFIG_FILE),
            search_dirs: vec![PathBuf::from(SYSTEM_CONFIG_DIR)],
        }
    }

    /// Set the configuration file
    #[must_use]
    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = file.into();
        self
    }

    /// Replace the fallback search directories
    #[must_use]
    pub fn with_search_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.search_dirs = dirs;
        self
    }

    /// Paths tried, in order
    #[must_use]
    pub fn candidate_paths(&self) -> Vec<PathBuf> {
        let mut paths = vec![self.file.clone()];
        for dir in &self.search_dirs {
            let candidate = dir.join(&self.file);
            if !paths.contains(&candidate) {
                paths.push(candidate);
            }
        }
        paths
    }

    /// Read, substitute, parse, default, and validate the configuration
    pub async fn load(&self) -> ConfigResult<GatewayConfig> {
        let (path, raw) = self.read_first().await?;
        debug!(path = %path.display(), "Read configuration file");
        Self::from_yaml_str_with(&raw, |name| std::env::var(name).ok())
    }

    /// Parse configuration text using the process environment
    pub fn from_yaml_str(raw: &str) -> ConfigResult<GatewayConfig> {
        Self::from_yaml_str_with(raw, |name| std::env::var(name).ok())
    }

    /// Parse configuration text with an explicit environment lookup
    pub fn from_yaml_str_with<F>(raw: &str, lookup: F) -> ConfigResult<GatewayConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_vars = env::referenced_vars(raw);
        let expanded = env::expand(raw, &lookup)?;

        let mut config: GatewayConfig = serde_yaml::from_str(&expanded)?;

        if config.port == 0 {
            config.port = lookup("PORT")
                .and_then(|p| p.trim().parse::<u16>().ok())
                .filter(|p| *p != 0)
                .unwrap_or(DEFAULT_PORT);
        }
        if config.default_timeout.trim().is_empty() {
            config.default_timeout = DEFAULT_TIMEOUT.to_string();
        }

        validate(&config)?;

        for name in duplicate_route_names(&config) {
            warn!(route = %name, "Duplicate route name, only the first declaration is used");
        }

        config.env_vars = env_vars;
        Ok(config)
    }

    async fn read_first(&self) -> ConfigResult<(PathBuf, String)> {
        let candidates = self.candidate_paths();
        let mut last_error = None;

        for path in &candidates {
            match tokio::fs::read_to_string(path).await {
                Ok(raw) => return Ok((path.clone(), raw)),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Config candidate not readable");
                    last_error = Some(e);
                }
            }
        }

        Err(ConfigError::Read {
            tried: candidates.iter().map(|p| p.display().to_string()).collect(),
            source: last_error
                .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "no candidate paths")),
        })
    }
}
