//! Configuration loader
//!
//! Loads the YAML rule tables either from the copies embedded in the binary
//! or from a directory on disk.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::types::{ContractConfig, CoreConfig, IntentsConfig, NavigationConfig};
use crate::error::ConfigResult;

/// Environment variable naming a directory that overrides the embedded tables
pub const CONFIG_DIR_ENV: &str = "CHUNKFLOW_CONFIG_DIR";

const NAVIGATION_FILE: &str = "navigation.yaml";
const INTENTS_FILE: &str = "intents.yaml";
const CONTRACT_FILE: &str = "contract.yaml";

const EMBEDDED_NAVIGATION: &str = include_str!("../../config/navigation.yaml");
const EMBEDDED_INTENTS: &str = include_str!("../../config/intents.yaml");
const EMBEDDED_CONTRACT: &str = include_str!("../../config/contract.yaml");

#[derive(Debug, Clone, PartialEq, Eq)]
enum ConfigSource {
    Embedded,
    Directory(PathBuf),
}

pub struct ConfigLoader {
    source: ConfigSource,
}

impl ConfigLoader {
    /// Load from `config_dir/{navigation,intents,contract}.yaml`
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            source: ConfigSource::Directory(config_dir.into()),
        }
    }

    /// Use the tables compiled into the crate
    pub fn embedded() -> Self {
        Self {
            source: ConfigSource::Embedded,
        }
    }

    /// `CHUNKFLOW_CONFIG_DIR` when set, otherwise the embedded tables
    pub fn from_env() -> Self {
        match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => Self::new(dir),
            _ => Self::embedded(),
        }
    }

    /// Directory being read, `None` for the embedded tables
    pub fn config_dir(&self) -> Option<&Path> {
        match &self.source {
            ConfigSource::Embedded => None,
            ConfigSource::Directory(dir) => Some(dir),
        }
    }

    /// Load all three tables. Semantic validation happens when the engine,
    /// state machine policy and contract are built from them.
    pub fn load(&self) -> ConfigResult<CoreConfig> {
        let config = CoreConfig {
            navigation: self.load_navigation()?,
            intents: self.load_intents()?,
            contract: self.load_contract()?,
        };

        info!(
            source = %self.describe(),
            navigation_version = %config.navigation.version,
            intents_version = %config.intents.version,
            contract_version = %config.contract.version,
            intents = config.intents.intents.len(),
            chunk_shapes = config.contract.chunk_shapes.len(),
            "Loaded chunkflow configuration"
        );
        Ok(config)
    }

    pub fn load_navigation(&self) -> ConfigResult<NavigationConfig> {
        Ok(self.load_document(NAVIGATION_FILE, EMBEDDED_NAVIGATION)?)
    }

    pub fn load_intents(&self) -> ConfigResult<IntentsConfig> {
        Ok(self.load_document(INTENTS_FILE, EMBEDDED_INTENTS)?)
    }

    pub fn load_contract(&self) -> ConfigResult<ContractConfig> {
        Ok(self.load_document(CONTRACT_FILE, EMBEDDED_CONTRACT)?)
    }

    fn load_document<T: DeserializeOwned>(&self, file: &str, embedded: &str) -> Result<T> {
        match &self.source {
            ConfigSource::Embedded => {
                debug!(file, "Parsing embedded configuration");
                serde_yaml::from_str(embedded)
                    .with_context(|| format!("Failed to parse embedded {}", file))
            }
            ConfigSource::Directory(dir) => {
                let path = dir.join(file);
                debug!(path = %path.display(), "Loading configuration file");

                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                serde_yaml::from_str(&content)
                    .with_context(|| format!("Failed to parse {}", path.display()))
            }
        }
    }

    fn describe(&self) -> String {
        match &self.source {
            ConfigSource::Embedded => "embedded".to_string(),
            ConfigSource::Directory(dir) => dir.display().to_string(),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::embedded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DirectNavigation;
    use crate::error::ConfigError;
    use chunkflow_types::{IntentType, UiState};

    #[test]
    fn test_embedded_tables_parse() {
        let config = ConfigLoader::embedded().load().unwrap();

        assert_eq!(config.navigation.initial_state, UiState::Dashboard);
        assert_eq!(config.navigation.history_limit, 50);
        assert_eq!(config.navigation.direct_navigation, DirectNavigation::Enabled);
        assert_eq!(config.navigation.transitions.len(), UiState::ALL.len());

        assert_eq!(config.intents.thresholds.clarify_below, 0.7);
        assert_eq!(config.intents.max_questions, 2);
        assert_eq!(config.intents.conversation_window, 10);

        assert_eq!(config.contract.mappings.len(), IntentType::ALL.len());
    }

    #[test]
    fn test_missing_directory_reports_path() {
        let loader = ConfigLoader::new("/definitely/not/here");
        let err = loader.load().unwrap_err();

        assert!(matches!(err, ConfigError::Load(_)));
        assert!(err.to_string().contains("navigation.yaml"));
    }

    #[test]
    fn test_directory_override() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(NAVIGATION_FILE),
            EMBEDDED_NAVIGATION.replace("history_limit: 50", "history_limit: 5"),
        )
        .unwrap();
        std::fs::write(dir.path().join(INTENTS_FILE), EMBEDDED_INTENTS).unwrap();
        std::fs::write(dir.path().join(CONTRACT_FILE), EMBEDDED_CONTRACT).unwrap();

        let loader = ConfigLoader::new(dir.path());
        assert_eq!(loader.config_dir(), Some(dir.path()));
        let config = loader.load().unwrap();
        assert_eq!(config.navigation.history_limit, 5);
    }

    #[test]
    fn test_unknown_state_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(NAVIGATION_FILE),
            "version: \"1.0\"\ntransitions:\n  dashboard: [moon_base]\n",
        )
        .unwrap();

        let err = ConfigLoader::new(dir.path()).load_navigation().unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
        assert!(err.to_string().contains("Failed to parse"));
        assert!(err.to_string().contains("moon_base"));
    }
}
