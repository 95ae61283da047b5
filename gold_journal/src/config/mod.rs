// src/config/mod.rs
use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/journal.toml";
pub const DEFAULT_GEMINI_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub data_dir: PathBuf,
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            log_level: "warn".to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub endpoint: String,
    pub temperature: f64,
    pub top_k: u32,
    pub top_p: f64,
    pub max_output_tokens: u32,
    /// Unset means the request waits for the service indefinitely.
    pub timeout_secs: Option<u64>,
    /// Used when no key has been saved in the journal.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_GEMINI_URL.to_string(),
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 2048,
            timeout_secs: None,
            api_key: None,
        }
    }
}

impl Config {
    /// Loads a TOML file, falling back to defaults when it does not exist, then
    /// applies environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            toml::from_str::<Config>(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?
        } else {
            info!("Config file not found at {}, using defaults", path.display());
            Config::default()
        };

        dotenv::dotenv().ok();
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("GOLD_JOURNAL_DATA_DIR").filter(|v| !v.trim().is_empty()) {
            self.general.data_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup("GEMINI_API_URL").filter(|v| !v.trim().is_empty()) {
            self.analysis.endpoint = url;
        }
        if let Some(key) = lookup("GEMINI_API_KEY").filter(|v| !v.trim().is_empty()) {
            self.analysis.api_key = Some(key.trim().to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [general]
            data_dir = "/tmp/journal"

            [analysis]
            max_output_tokens = 1024
            timeout_secs = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.general.data_dir, PathBuf::from("/tmp/journal"));
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.analysis.max_output_tokens, 1024);
        assert_eq!(config.analysis.timeout_secs, Some(30));
        assert_eq!(config.analysis.top_k, 40);
        assert_eq!(config.analysis.endpoint, DEFAULT_GEMINI_URL);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("GOLD_JOURNAL_DATA_DIR", "/var/lib/journal"),
            ("GEMINI_API_KEY", "  secret  "),
            ("GEMINI_API_URL", ""),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.general.data_dir, PathBuf::from("/var/lib/journal"));
        assert_eq!(config.analysis.api_key.as_deref(), Some("secret"));
        assert_eq!(config.analysis.endpoint, DEFAULT_GEMINI_URL);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load("does/not/exist.toml").unwrap();
        assert_eq!(config.analysis.temperature, 0.7);
    }
}
