use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{self, Context};
use serde::{Deserialize, Serialize};
use toml;

#[derive(Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// JSON file holding the full record sequence.
    pub data_file: PathBuf,
    /// Directory uploaded profile images are written to.
    pub upload_dir: PathBuf,
    /// File the per-request log lines are appended to.
    pub request_log: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AppConfig {
    pub listen_addr: String,
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn read(filepath: impl AsRef<Path>) -> anyhow::Result<Self> {
        let file_content =
            fs::read_to_string(filepath).with_context(|| "failed to read config file")?;
        let config = toml::from_str(&file_content).with_context(|| "failed to parse config file")?;
        return Ok(config);
    }
}
