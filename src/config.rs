use std::path::{Path, PathBuf};

use log::warn;

use crate::error::ConfigError;
use crate::gamedata::DEFAULT_MAX_FILES;
use crate::model::DEFAULT_HIDDEN_UNITS;
use crate::selfplay::SelfPlayConfig;
use crate::training::TrainerConfig;

/// Where models and game data live.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_root: PathBuf,
    /// Relative to `data_root`.
    pub models_dir: PathBuf,
    /// Relative to `data_root`.
    pub gamedata_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        PathsConfig {
            data_root: PathBuf::from("."),
            models_dir: PathBuf::from("models"),
            gamedata_dir: PathBuf::from("gamedata"),
        }
    }
}

impl PathsConfig {
    pub fn models_root(&self) -> PathBuf {
        self.data_root.join(&self.models_dir)
    }

    pub fn gamedata_root(&self) -> PathBuf {
        self.data_root.join(&self.gamedata_dir)
    }
}

/// Shape of a freshly initialised network. Loaded models keep the shape
/// recorded in their snapshot.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub hidden_units: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            hidden_units: DEFAULT_HIDDEN_UNITS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GameDataConfig {
    /// Completed record files kept before the oldest are deleted.
    pub max_files: usize,
}

impl Default for GameDataConfig {
    fn default() -> Self {
        GameDataConfig {
            max_files: DEFAULT_MAX_FILES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// flexi_logger spec, e.g. `info` or `info,ttt_selfplay::dataset=debug`.
    /// `RUST_LOG` takes precedence when set.
    pub spec: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            spec: "info".to_string(),
        }
    }
}

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub training: TrainerConfig,
    pub model: ModelConfig,
    pub gamedata: GameDataConfig,
    pub selfplay: SelfPlayConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!("Config file '{}' not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let training = &self.training;
        if training.minibatch_size == 0 {
            return Err(ConfigError::Validation(
                "training.minibatch_size must be > 0".into(),
            ));
        }
        if training.snapshot_epochs == 0 {
            return Err(ConfigError::Validation(
                "training.snapshot_epochs must be > 0".into(),
            ));
        }
        if !(training.learning_rate > 0.0 && training.learning_rate.is_finite()) {
            return Err(ConfigError::Validation(
                "training.learning_rate must be > 0".into(),
            ));
        }
        if training.max_rounds == Some(0) {
            return Err(ConfigError::Validation(
                "training.max_rounds must be >= 1 when set".into(),
            ));
        }
        if training.log_interval == 0 {
            return Err(ConfigError::Validation(
                "training.log_interval must be > 0".into(),
            ));
        }

        if self.model.hidden_units == 0 {
            return Err(ConfigError::Validation(
                "model.hidden_units must be > 0".into(),
            ));
        }
        if self.gamedata.max_files == 0 {
            return Err(ConfigError::Validation(
                "gamedata.max_files must be >= 1".into(),
            ));
        }

        if self.selfplay.games_per_file == 0 {
            return Err(ConfigError::Validation(
                "selfplay.games_per_file must be > 0".into(),
            ));
        }
        if self.selfplay.max_files_to_write == Some(0) {
            return Err(ConfigError::Validation(
                "selfplay.max_files_to_write must be >= 1 when set".into(),
            ));
        }

        if self.selfplay.readouts == 0 {
            return Err(ConfigError::Validation(
                "selfplay.readouts must be >= 1".into(),
            ));
        }
        if !(self.selfplay.cpuct > 0.0) {
            return Err(ConfigError::Validation("selfplay.cpuct must be > 0".into()));
        }
        if !(self.selfplay.dirichlet_alpha > 0.0) {
            return Err(ConfigError::Validation(
                "selfplay.dirichlet_alpha must be > 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.selfplay.dirichlet_epsilon) {
            return Err(ConfigError::Validation(
                "selfplay.dirichlet_epsilon must be in [0, 1]".into(),
            ));
        }

        if self.logging.spec.trim().is_empty() {
            return Err(ConfigError::Validation("logging.spec must not be empty".into()));
        }

        Ok(())
    }

    /// Generate a TOML string with all default values (useful for creating
    /// example config files).
    pub fn default_toml() -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(&AppConfig::default())?)
    }
}
