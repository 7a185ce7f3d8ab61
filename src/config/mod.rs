mod file_config;

pub use file_config::FileConfig;

use anyhow::{bail, Result};
use std::path::PathBuf;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub data_dir: PathBuf,
    pub inputs_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            inputs_dir: None,
            output_dir: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub inputs_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| cli.data_dir.clone());

        if !data_dir.exists() {
            bail!("Data directory does not exist: {:?}", data_dir);
        }
        if !data_dir.is_dir() {
            bail!("data_dir is not a directory: {:?}", data_dir);
        }

        let inputs_dir = file
            .inputs_dir
            .map(PathBuf::from)
            .or_else(|| cli.inputs_dir.clone())
            .unwrap_or_else(|| data_dir.clone());

        let output_dir = file
            .output_dir
            .map(PathBuf::from)
            .or_else(|| cli.output_dir.clone())
            .unwrap_or_else(|| data_dir.join("reports"));

        Ok(Self {
            data_dir,
            inputs_dir,
            output_dir,
        })
    }

    pub fn snapshots_db_path(&self) -> PathBuf {
        self.data_dir.join("snapshots.db")
    }

    pub fn planning_db_path(&self) -> PathBuf {
        self.data_dir.join("planning.db")
    }
}
