use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

pub const API_KEY_ENV: &str = "OPENWEATHERMAP_API_KEY";
pub const BASE_URL_ENV: &str = "OPENWEATHERMAP_BASE_URL";

/// Settings for the OpenWeatherMap upstream.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct OpenWeatherMapConfig {
    pub api_key: Option<String>,

    /// Defaults to [`DEFAULT_BASE_URL`].
    pub base_url: Option<String>,

    /// Transport timeout; no timeout when absent.
    pub timeout_secs: Option<u64>,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [openweathermap]
/// api_key = "..."
/// timeout_secs = 10
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub openweathermap: OpenWeatherMapConfig,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "forecast", "forecast-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Override file values with `OPENWEATHERMAP_*` variables found by `lookup`.
    ///
    /// `lookup` is usually `|name| std::env::var(name).ok()`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV).filter(|v| !v.trim().is_empty()) {
            self.openweathermap.api_key = Some(key);
        }
        if let Some(url) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.openweathermap.base_url = Some(url);
        }
    }

    /// API key, if one is configured. Blank keys count as missing.
    pub fn api_key(&self) -> Option<&str> {
        self.openweathermap
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.openweathermap.api_key = Some(api_key.trim().to_string());
    }

    /// Upstream base URL, validated.
    pub fn base_url(&self) -> Result<Url> {
        let raw = self.openweathermap.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        parse_base_url(raw)
    }

    /// Store a base URL after validating it. Passing the default clears the override.
    pub fn set_base_url(&mut self, raw: &str) -> Result<()> {
        let url = parse_base_url(raw)?;
        self.openweathermap.base_url = if raw.trim_end_matches('/') == DEFAULT_BASE_URL {
            None
        } else {
            Some(url.to_string())
        };
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.openweathermap.timeout_secs.filter(|s| *s > 0).map(Duration::from_secs)
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("Invalid base URL: {raw}"))?;

    if !matches!(url.scheme(), "http" | "https") {
        bail!("Base URL must use http or https, got '{}'", url.scheme());
    }

    Ok(url)
}
