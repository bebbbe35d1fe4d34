use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::encoder::{DEFAULT_MAX_WIDTH, DEFAULT_QUALITY};

const CONFIG_FILE_NAME: &str = "config.toml";
const DEFAULT_STORAGE_KEY: &str = "psub_homeprice_data_v1";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub remote: RemoteConfig,
    pub local: LocalConfig,
    pub images: ImagesConfig,
    pub admin: AdminConfig,
}

/// Remote store settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Board API endpoint; unset or non-http means local-only
    pub endpoint: Option<String>,
}

/// Local fallback store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    /// Name of the storage slot (file stem)
    pub storage_key: String,
    /// Data directory (unset = platform data dir)
    pub data_dir: Option<String>,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            data_dir: None,
        }
    }
}

/// Photo compression settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    /// Photos wider than this are scaled down
    pub max_width: u32,
    /// JPEG quality (0.0 - 1.0)
    pub quality: f32,
    /// Photos kept per listing; extras are dropped
    pub max_per_listing: usize,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            quality: DEFAULT_QUALITY,
            max_per_listing: 3,
        }
    }
}

/// Shared admin login
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub user: String,
    /// Unset disables admin deletes entirely
    pub passphrase: Option<String>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            user: "admin".to_string(),
            passphrase: None,
        }
    }
}

impl Config {
    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("rentboard");

        fs::create_dir_all(&config_dir)
            .context("Failed to create config directory")?;

        Ok(config_dir.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default path, creating it if missing
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .context("Failed to read config file")?;

            let config: Config = toml::from_str(&contents)
                .context("Failed to parse config file")?;

            config.validate()
                .with_context(|| format!("Invalid config in {}", path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Reject photo settings that would make every post fail or silently
    /// encode at the wrong quality.
    pub fn validate(&self) -> Result<()> {
        if self.images.max_width == 0 {
            bail!("images.max_width must be at least 1");
        }
        let quality = self.images.quality;
        if !quality.is_finite() || quality <= 0.0 || quality > 1.0 {
            bail!("images.quality must be in (0.0, 1.0], got {}", quality);
        }
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        fs::write(path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Resolved data directory for the local store
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.local.data_dir {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => crate::storage::FileLocalStore::default_dir(),
        }
    }

    /// Generate example config content for documentation
    pub fn example_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}
