use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

// Persisted settings, overridable from the command line
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Raw `Cookie` header value of a logged-in StudOn session
    pub cookie: Option<String>,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cookie: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
        }
    }
}

impl Config {
    // Loads the config from the default location, or the defaults if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let mut file = File::open(path)
            .with_context(|| format!("Failed to open config file {}", path.display()))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .context("Failed to read config file")?;

        if contents.trim().is_empty() {
            return Ok(Config::default());
        }

        serde_json::from_str(&contents)
            .context("Failed to parse config file")
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config")?;

        let mut file = File::create(path)
            .context("Failed to open config file for writing")?;

        file.write_all(json.as_bytes())
            .context("Failed to write config file")?;

        Ok(())
    }

    // A cookie passed on the command line wins over the stored one
    pub fn with_cookie(mut self, cookie: Option<String>) -> Self {
        if cookie.is_some() {
            self.cookie = cookie;
        }
        self
    }
}

pub fn config_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir()
        .context("Could not determine the configuration directory")?;

    path.push("studon-dl");
    path.push("config.json");

    Ok(path)
}
