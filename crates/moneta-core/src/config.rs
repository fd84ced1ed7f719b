//! Client configuration
//!
//! Resolution order, later wins:
//! 1. TOML file (`--config` path, else `<config dir>/moneta/config.toml`)
//! 2. Environment: `MONETA_URL`, `MONETA_ANON_KEY`, `MONETA_SESSION_FILE`
//!
//! ```toml
//! url = "https://abcd.supabase.co"
//! anon_key = "eyJ..."
//! session_file = "/home/me/.local/share/moneta/session.json"
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

pub const ENV_URL: &str = "MONETA_URL";
pub const ENV_ANON_KEY: &str = "MONETA_ANON_KEY";
pub const ENV_SESSION_FILE: &str = "MONETA_SESSION_FILE";

/// Resolved client configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub url: String,
    pub anon_key: String,
    pub session_file: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    url: Option<String>,
    anon_key: Option<String>,
    session_file: Option<PathBuf>,
}

/// Default config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("moneta").join("config.toml"))
}

/// Default session file location
pub fn default_session_file() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("moneta")
        .join("session.json")
}

impl Config {
    /// Load from the file layer and the process environment
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let env: HashMap<String, String> = [ENV_URL, ENV_ANON_KEY, ENV_SESSION_FILE]
            .iter()
            .filter_map(|key| std::env::var(key).ok().map(|v| (key.to_string(), v)))
            .collect();
        Self::resolve(override_path, &env)
    }

    /// Resolve with an explicit environment
    pub fn resolve(override_path: Option<&Path>, env: &HashMap<String, String>) -> Result<Self> {
        let raw = match override_path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                read_file(path)?
            }
            None => match default_config_path() {
                Some(path) if path.exists() => read_file(&path)?,
                _ => RawConfig::default(),
            },
        };

        let pick = |key: &str, file_value: Option<String>| {
            env.get(key)
                .filter(|v| !v.trim().is_empty())
                .cloned()
                .or(file_value)
        };

        let url = pick(ENV_URL, raw.url)
            .ok_or_else(|| Error::Config(format!("Backend URL not set (config `url` or {})", ENV_URL)))?;
        let anon_key = pick(ENV_ANON_KEY, raw.anon_key).ok_or_else(|| {
            Error::Config(format!(
                "Anon key not set (config `anon_key` or {})",
                ENV_ANON_KEY
            ))
        })?;
        let session_file = pick(
            ENV_SESSION_FILE,
            raw.session_file.map(|p| p.to_string_lossy().into_owned()),
        )
        .map(PathBuf::from)
        .unwrap_or_else(default_session_file);

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key,
            session_file,
        })
    }
}

fn read_file(path: &Path) -> Result<RawConfig> {
    debug!(path = %path.display(), "Loading config");
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}
