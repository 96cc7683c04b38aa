// Configuration module
// Reads INI-style configuration files with environment variable overrides
//
// Keys outside of a section are addressed by their bare name ("LogsDir"),
// keys inside a section as "Section.Key" ("Merge.PreviewScale").

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use configparser::ini::Ini;
use thiserror::Error;

/// Section configparser assigns to keys that appear before any header
const DEFAULT_SECTION: &str = "default";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse configuration file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Configuration file parser
/// Supports INI-style files with environment variable override
#[derive(Debug, Clone, Default)]
pub struct Config {
    values: HashMap<String, String>,
    filename: PathBuf,
    env_prefix: String,
}

impl Config {
    pub fn new(env_prefix: &str) -> Self {
        Config {
            values: HashMap::new(),
            filename: PathBuf::new(),
            env_prefix: env_prefix.to_string(),
        }
    }

    /// Load configuration from a file
    /// env_prefix is used to check environment variables (e.g., "NavMerge_")
    pub fn load(path: &Path, env_prefix: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Config::new(env_prefix);
        config.filename = path.to_path_buf();
        config.parse(&content)?;
        Ok(config)
    }

    /// Build a configuration from in-memory INI text
    pub fn from_ini_str(content: &str, env_prefix: &str) -> Result<Self, ConfigError> {
        let mut config = Config::new(env_prefix);
        config.parse(content)?;
        Ok(config)
    }

    fn parse(&mut self, content: &str) -> Result<(), ConfigError> {
        let mut ini = Ini::new_cs();
        let sections = ini
            .read(content.to_string())
            .map_err(|message| ConfigError::Parse {
                path: self.filename.clone(),
                message,
            })?;

        self.values.clear();
        for (section, entries) in sections {
            for (key, value) in entries {
                let Some(mut value) = value else {
                    continue;
                };

                // Strip quotes
                if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
                    value = value[1..value.len() - 1].to_string();
                }

                let full_key = if section == DEFAULT_SECTION {
                    key
                } else {
                    format!("{}.{}", section, key)
                };
                self.values.insert(full_key, value);
            }
        }

        Ok(())
    }

    /// Path the configuration was loaded from (empty for in-memory configs)
    pub fn filename(&self) -> &Path {
        &self.filename
    }

    /// Check if a key is set
    pub fn is_set(&self, key: &str) -> bool {
        self.get_env_or_config(key).is_some()
    }

    /// Get a string value with a default
    pub fn get_string_default(&self, key: &str, default: &str) -> String {
        self.get_env_or_config(key)
            .unwrap_or_else(|| default.to_string())
    }

    /// Get a string value (empty string default)
    pub fn get_string(&self, key: &str) -> String {
        self.get_string_default(key, "")
    }

    /// Get a boolean value with a default
    pub fn get_bool_default(&self, key: &str, default: bool) -> bool {
        match self.get_env_or_config(key) {
            Some(val) => {
                let lower = val.to_lowercase();
                matches!(lower.as_str(), "1" | "true" | "yes")
            }
            None => default,
        }
    }

    /// Get an integer value with a default
    pub fn get_int_default(&self, key: &str, default: i32) -> i32 {
        match self.get_env_or_config(key) {
            Some(val) => val.trim().parse().unwrap_or(default),
            None => default,
        }
    }

    /// Get a float value with a default
    pub fn get_float_default(&self, key: &str, default: f32) -> f32 {
        match self.get_env_or_config(key) {
            Some(val) => val.trim().parse().unwrap_or(default),
            None => default,
        }
    }

    /// Try environment variable first, then config file
    fn get_env_or_config(&self, key: &str) -> Option<String> {
        if !self.env_prefix.is_empty() {
            let env_key = format!("{}{}", self.env_prefix, key.replace('.', "_"));
            if let Ok(val) = std::env::var(&env_key) {
                return Some(val);
            }
        }

        self.values.get(key).cloned()
    }
}
