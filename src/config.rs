//! Application configuration, read from a JSON file next to the working directory.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "covid_charts.json";
/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "COVID_CHARTS_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid JSON in config file {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Folder holding the three time-series CSVs and the population file.
    pub data_dir: PathBuf,
    pub confirmed_suffix: String,
    pub deaths_suffix: String,
    pub recovered_suffix: String,
    /// Country metadata JSON, relative to `data_dir`.
    pub population_file: String,
    /// Fail the run when the three tables list different countries.
    pub strict_country_sets: bool,
    pub export_width: u32,
    pub export_height: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            confirmed_suffix: "confirmed.csv".to_string(),
            deaths_suffix: "deaths.csv".to_string(),
            recovered_suffix: "recovered.csv".to_string(),
            population_file: "countries.json".to_string(),
            strict_country_sets: false,
            export_width: 1400,
            export_height: 900,
        }
    }
}

impl AppConfig {
    /// Path of the config file: `$COVID_CHARTS_CONFIG` or `./covid_charts.json`.
    pub fn default_path() -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
    }

    /// Load config from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let config: Self =
                    serde_json::from_str(&contents).map_err(|source| ConfigError::Json {
                        path: path.to_path_buf(),
                        source,
                    })?;
                info!("Loaded config from {}", path.display());
                debug!("config: {config:?}");
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn population_path(&self) -> PathBuf {
        self.data_dir.join(&self.population_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_gives_defaults() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let config = AppConfig::load(&dir.path().join("nope.json"))?;
        assert_eq!(config, AppConfig::default());
        Ok(())
    }

    #[test]
    fn partial_file_keeps_other_defaults() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(file, r#"{{ "data_dir": "/tmp/covid", "strict_country_sets": true }}"#)?;
        let config = AppConfig::load(file.path())?;
        assert_eq!(config.data_dir, PathBuf::from("/tmp/covid"));
        assert!(config.strict_country_sets);
        assert_eq!(config.confirmed_suffix, "confirmed.csv");
        assert_eq!(
            config.population_path(),
            PathBuf::from("/tmp/covid/countries.json")
        );
        Ok(())
    }

    #[test]
    fn invalid_json_is_an_error() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(file, "not json")?;
        assert!(matches!(
            AppConfig::load(file.path()),
            Err(ConfigError::Json { .. })
        ));
        Ok(())
    }
}
