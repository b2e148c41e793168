use std::{fs, path::Path};

use serde::Deserialize;

use crate::{CareflowError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// store config
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    /// store type
    #[serde(default)]
    pub store_type: StoreType,
    /// http collaborator config
    pub http: Option<HttpConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    #[default]
    Mem,
    Http,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// base url of the workflow api, e.g. `https://api.example.com/v1`
    pub base_url: String,
    /// request timeout in milliseconds, defaults to 10000
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Config {
    pub fn create<T: AsRef<Path>>(path: T) -> Result<Self> {
        let data = fs::read_to_string(path.as_ref()).map_err(|e| CareflowError::Config(format!("failed to load config file {:?}: {}", path.as_ref(), e)))?;

        Self::load_from_str(data.as_str())
    }

    pub fn load_from_str(toml_str: &str) -> Result<Self> {
        let config = toml::from_str::<Config>(toml_str)?;
        Ok(config)
    }
}
