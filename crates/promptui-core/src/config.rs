use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Result, anyhow};

use crate::provider::Provider;

pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// "mocked", "openai" or "gemini"
    pub backend: Option<String>,
    pub model: Option<String>,
    pub prompts_path: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            backend: Some("mocked".to_string()),
            model: None,
            prompts_path: None,
            timeout_secs: None,
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    pub fn save_backend(backend: &str) -> Result<()> {
        let path = Self::get_config_path()?;
        let mut config = Self::load_from(&path).unwrap_or_else(|_| Self::new());
        config.set_backend(backend)?;
        config.save_to(&path)
    }

    /// Accepts "mocked" or a provider name.
    pub fn set_backend(&mut self, backend: &str) -> Result<()> {
        let backend = backend.trim().to_lowercase();
        if backend != "mocked" && Provider::from_str(&backend).is_none() {
            return Err(anyhow!(
                "Unknown backend '{}'. Expected one of: mocked, openai, gemini",
                backend
            ));
        }
        self.backend = Some(backend);
        Ok(())
    }

    /// The generation provider, or `None` for table lookup only.
    pub fn provider(&self) -> Option<Provider> {
        self.backend.as_deref().and_then(Provider::from_str)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("promptui").join("config.json"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
