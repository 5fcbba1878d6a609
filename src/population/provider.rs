//! Population Provider Module
//! Country-metadata lookups answering `population(name)`.

use log::{debug, info};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PopulationError {
    #[error("Country not found: {0}")]
    NotFound(String),
    #[error("Failed to open population file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse population file: {0}")]
    Json(#[from] serde_json::Error),
}

/// External source of country populations.
pub trait PopulationProvider: Send + Sync {
    /// Population of `name`, or `PopulationError::NotFound`.
    fn population(&self, name: &str) -> Result<u64, PopulationError>;
}

/// One record of a country metadata file.
#[derive(Debug, Clone, Deserialize)]
pub struct CountryRecord {
    pub name: String,
    #[serde(default)]
    pub population: Option<u64>,
    #[serde(default, rename = "altSpellings")]
    pub alt_spellings: Vec<String>,
}

/// Provider backed by a JSON array of country records.
/// Names and alternative spellings match case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct JsonPopulationProvider {
    by_name: HashMap<String, u64>,
}

impl JsonPopulationProvider {
    pub fn from_path(path: &Path) -> Result<Self, PopulationError> {
        let file = File::open(path).map_err(|source| PopulationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let records: Vec<CountryRecord> = serde_json::from_reader(BufReader::new(file))?;
        let record_count = records.len();
        let provider = Self::from_records(records);
        info!(
            "Loaded {} country records from {} ({} names indexed)",
            record_count,
            path.display(),
            provider.len()
        );
        Ok(provider)
    }

    pub fn from_records(records: impl IntoIterator<Item = CountryRecord>) -> Self {
        let mut by_name = HashMap::new();
        for record in records {
            let Some(population) = record.population.filter(|p| *p > 0) else {
                debug!("Skipping {} without population", record.name);
                continue;
            };
            // Official names win over alternative spellings
            by_name.insert(record.name.to_lowercase(), population);
            for alt in &record.alt_spellings {
                by_name.entry(alt.to_lowercase()).or_insert(population);
            }
        }
        Self { by_name }
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl PopulationProvider for JsonPopulationProvider {
    fn population(&self, name: &str) -> Result<u64, PopulationError> {
        self.by_name
            .get(&name.to_lowercase())
            .copied()
            .ok_or_else(|| PopulationError::NotFound(name.to_string()))
    }
}

/// In-memory provider with exact-name lookups.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct StaticPopulationProvider {
    populations: HashMap<String, u64>,
}

#[cfg(test)]
impl StaticPopulationProvider {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        Self {
            populations: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(test)]
impl PopulationProvider for StaticPopulationProvider {
    fn population(&self, name: &str) -> Result<u64, PopulationError> {
        match self.populations.get(name) {
            Some(&p) if p > 0 => Ok(p),
            _ => Err(PopulationError::NotFound(name.to_string())),
        }
    }
}
