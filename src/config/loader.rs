use super::HarnessConfig;
use crate::error::ConfigError;
use anyhow::{Context, Result};
use directories::UserDirs;
use std::fs;
use std::path::{Path, PathBuf};

impl HarnessConfig {
    /// `~/.hitl-harness/config.toml`, when a home directory exists.
    pub fn default_path() -> Option<PathBuf> {
        UserDirs::new().map(|u| u.home_dir().join(".hitl-harness").join("config.toml"))
    }

    /// Load from `path` (or the default location), apply env overrides, validate.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(default) if default.exists() => Self::from_file(&default)?,
                Some(default) => Self {
                    config_path: default,
                    ..Self::default()
                },
                None => Self::default(),
            },
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config: HarnessConfig =
            toml::from_str(&contents).context("Failed to parse config file")?;
        config.config_path = path.to_path_buf();
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let base = url::Url::parse(&self.orchestrator.base_url).map_err(|e| {
            ConfigError::Validation(format!(
                "orchestrator.base_url '{}' is not a URL: {e}",
                self.orchestrator.base_url
            ))
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ConfigError::Validation(format!(
                "orchestrator.base_url must be http(s), got {}",
                base.scheme()
            )));
        }

        if self.poll.max_retries == 0 {
            return Err(ConfigError::Validation(
                "poll.max_retries must be at least 1".into(),
            ));
        }
        if self.poll.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "poll.timeout_ms must be greater than 0".into(),
            ));
        }
        if self.store.database_url.trim().is_empty() {
            return Err(ConfigError::Validation("store.database_url is empty".into()));
        }

        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}
