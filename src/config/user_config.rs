use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::config_error::{NoHomeDirectorySnafu, ParseUserConfigSnafu, ReadUserConfigSnafu};
use crate::error::ConfigError;
use snafu::ResultExt;

/// User-level config stored at ~/.diagram-annotator.toml.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
}

/// Provider configuration within user config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ProviderConfig {
    #[serde(rename = "type", default)]
    pub provider_type: ProviderType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Supported provider types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderType {
    #[default]
    Ollama,
    Anthropic,
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderType::Ollama => write!(f, "ollama"),
            ProviderType::Anthropic => write!(f, "anthropic"),
        }
    }
}

impl UserConfig {
    /// Path to the user config file (~/.diagram-annotator.toml).
    pub fn path() -> Result<PathBuf, ConfigError> {
        let home = std::env::var("HOME")
            .ok()
            .map(PathBuf::from)
            .filter(|p| p.is_absolute())
            .ok_or_else(|| NoHomeDirectorySnafu.build())?;
        Ok(home.join(".diagram-annotator.toml"))
    }

    /// Load user config from ~/.diagram-annotator.toml.
    /// Returns Ok(None) if the file does not exist.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let path = Self::path()?;
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).context(ReadUserConfigSnafu {
            path: path.display().to_string(),
        })?;
        Self::parse(&contents).map(Some)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).context(ParseUserConfigSnafu)
    }
}
