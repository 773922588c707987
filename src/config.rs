// src/config.rs

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Optional settings file (`--config=<path>`)
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Settings {
    #[serde(default = "default_psl_url")]
    pub psl_url: String,
    #[serde(default = "default_known_services")]
    pub known_services: PathBuf,
    #[serde(default)]
    pub command_timeout_secs: Option<u64>,
    /// Whole-request limit for downloads; unbounded when unset
    #[serde(default)]
    pub http_timeout_secs: Option<u64>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_psl_url() -> String {
    "https://publicsuffix.org/list/public_suffix_list.dat".to_string()
}
fn default_known_services() -> PathBuf {
    PathBuf::from("./utils/known_services.json")
}
fn default_user_agent() -> String {
    format!("domain-scan/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            psl_url: default_psl_url(),
            known_services: default_known_services(),
            command_timeout_secs: None,
            http_timeout_secs: None,
            user_agent: default_user_agent(),
        }
    }
}

impl Settings {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&contents)?;
        Ok(settings)
    }

    /// Load `path` if given, defaults otherwise
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}
