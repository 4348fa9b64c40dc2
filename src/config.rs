use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration embedded in the binary, used when no override file is given.
pub const DEFAULT_CONFIG: &str = include_str!("../config/config.toml");

/// Environment variable naming an alternative config file.
pub const CONFIG_PATH_ENV: &str = "POKEDEX_CONFIG";

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub pokemon: PokemonConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct PokemonConfig {
    pub api_url: String,
    /// Request timeout in milliseconds.
    pub timeout: u64,
    /// Stagger between detail requests of one page, multiplied by the item index.
    pub detail_delay_ms: u64,
    /// Number of entries requested by the first fetch.
    pub page_limit: u32,
}

impl Default for PokemonConfig {
    fn default() -> Self {
        Self {
            api_url: "https://pokeapi.co/api/v2".to_string(),
            timeout: 10_000,
            detail_delay_ms: 50,
            page_limit: 100,
        }
    }
}

impl PokemonConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    pub fn detail_delay(&self) -> Duration {
        Duration::from_millis(self.detail_delay_ms)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct StoreConfig {
    pub page_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { page_size: 20 }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// `"memory"` (the default) or `"file"`. The embedded binary config selects `"file"`.
    pub r#type: String,
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            r#type: "memory".to_string(),
            path: PathBuf::from("pokedex-storage.json"),
        }
    }
}

impl StorageConfig {
    pub fn is_file(&self) -> bool {
        self.r#type == "file"
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct LoggingConfig {
    pub json: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config validation failed: {message}")]
    Validation { message: String },
}

impl Config {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let message = if self.pokemon.api_url.trim().is_empty() {
            "pokemon.api_url must not be empty"
        } else if self.pokemon.timeout == 0 {
            "pokemon.timeout must be greater than zero"
        } else if self.store.page_size == 0 {
            "store.page_size must be greater than zero"
        } else if self.storage.r#type != "memory" && !self.storage.is_file() {
            "storage.type must be \"memory\" or \"file\""
        } else {
            return Ok(());
        };
        Err(ConfigError::Validation {
            message: message.to_string(),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Loads the file named by `POKEDEX_CONFIG`, falling back to the embedded defaults.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => {
                let path = PathBuf::from(path);
                tracing::debug!("Loading configuration from {}", path.display());
                Self::from_file(&path)
            }
            None => Self::from_toml_str(DEFAULT_CONFIG),
        }
    }
}
