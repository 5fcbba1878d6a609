//! CSV Data Loader Module
//! Finds and loads the confirmed/deaths/recovered time-series CSVs using Polars.

use super::schema::TableKind;
use crate::config::AppConfig;
use log::info;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV {path}: {source}")]
    Csv { path: PathBuf, source: PolarsError },
    #[error("No file ending in \"{suffix}\" for {table} in {dir}")]
    MissingFile {
        table: TableKind,
        suffix: String,
        dir: PathBuf,
    },
    #[error("Failed to read data folder {dir}: {source}")]
    Io { dir: PathBuf, source: std::io::Error },
}

/// The three raw case tables as read from disk.
#[derive(Debug, Clone)]
pub struct RawTables {
    pub confirmed: DataFrame,
    pub deaths: DataFrame,
    pub recovered: DataFrame,
}

impl RawTables {
    pub fn get(&self, kind: TableKind) -> &DataFrame {
        match kind {
            TableKind::Confirmed => &self.confirmed,
            TableKind::Deaths => &self.deaths,
            TableKind::Recovered => &self.recovered,
        }
    }

    pub fn tables(&self) -> [(TableKind, &DataFrame); 3] {
        TableKind::ALL.map(|kind| (kind, self.get(kind)))
    }
}

/// Handles CSV discovery and loading with Polars.
pub struct DataLoader {
    confirmed_suffix: String,
    deaths_suffix: String,
    recovered_suffix: String,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new(&AppConfig::default())
    }
}

impl DataLoader {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            confirmed_suffix: config.confirmed_suffix.clone(),
            deaths_suffix: config.deaths_suffix.clone(),
            recovered_suffix: config.recovered_suffix.clone(),
        }
    }

    fn suffix(&self, kind: TableKind) -> &str {
        match kind {
            TableKind::Confirmed => &self.confirmed_suffix,
            TableKind::Deaths => &self.deaths_suffix,
            TableKind::Recovered => &self.recovered_suffix,
        }
    }

    /// Load a CSV file using Polars. Cells that fail to parse are not ignored.
    pub fn load_csv(path: &Path) -> Result<DataFrame, LoaderError> {
        let to_error = |source: PolarsError| LoaderError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let df = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(10000))
            .finish()
            .map_err(to_error)?
            .collect()
            .map_err(to_error)?;
        info!(
            "Loaded {} ({} rows, {} columns)",
            path.display(),
            df.height(),
            df.width()
        );
        Ok(df)
    }

    /// First `*.csv` in `dir` whose file name ends with the suffix for `kind`.
    pub fn find_file(&self, dir: &Path, kind: TableKind) -> Result<PathBuf, LoaderError> {
        let suffix = self.suffix(kind);
        let entries = std::fs::read_dir(dir).map_err(|source| LoaderError::Io {
            dir: dir.to_path_buf(),
            source,
        })?;

        let mut matches: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .file_name()
                        .map(|n| n.to_string_lossy().ends_with(suffix))
                        .unwrap_or(false)
            })
            .collect();
        matches.sort();

        matches
            .into_iter()
            .next()
            .ok_or_else(|| LoaderError::MissingFile {
                table: kind,
                suffix: suffix.to_string(),
                dir: dir.to_path_buf(),
            })
    }

    /// Load all three tables from `dir`.
    pub fn load_dir(&self, dir: &Path) -> Result<RawTables, LoaderError> {
        let confirmed = Self::load_csv(&self.find_file(dir, TableKind::Confirmed)?)?;
        let deaths = Self::load_csv(&self.find_file(dir, TableKind::Deaths)?)?;
        let recovered = Self::load_csv(&self.find_file(dir, TableKind::Recovered)?)?;
        Ok(RawTables {
            confirmed,
            deaths,
            recovered,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::{inspect_table, COUNTRY_RAW};
    use std::fs;

    const CSV: &str = "Province/State,Country/Region,Lat,Long,1/22/20,1/23/20\n\
                       Hubei,China,30.97,112.27,444,444\n\
                       ,Italy,41.87,12.56,0,2\n";

    fn write_dir() -> anyhow::Result<tempfile::TempDir> {
        let dir = tempfile::tempdir()?;
        for name in [
            "time_series_covid_19_confirmed.csv",
            "time_series_covid_19_deaths.csv",
            "time_series_covid_19_recovered.csv",
        ] {
            fs::write(dir.path().join(name), CSV)?;
        }
        fs::write(dir.path().join("notes.txt"), "ignore me")?;
        Ok(dir)
    }

    #[test]
    fn load_dir_reads_all_three_tables() -> anyhow::Result<()> {
        let dir = write_dir()?;
        let tables = DataLoader::default().load_dir(dir.path())?;
        for (kind, df) in tables.tables() {
            assert_eq!(df.height(), 2, "{kind}");
            let columns = inspect_table(kind, df)?;
            assert_eq!(columns.names, vec!["1/22/20", "1/23/20"]);
        }
        let countries = tables.confirmed.column(COUNTRY_RAW)?.str()?;
        assert_eq!(countries.get(1), Some("Italy"));
        Ok(())
    }

    #[test]
    fn missing_file_names_the_table() -> anyhow::Result<()> {
        let dir = write_dir()?;
        fs::remove_file(dir.path().join("time_series_covid_19_deaths.csv"))?;
        let result = DataLoader::default().load_dir(dir.path());
        assert!(matches!(
            result,
            Err(LoaderError::MissingFile {
                table: TableKind::Deaths,
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn missing_folder_is_io_error() {
        let result =
            DataLoader::default().find_file(Path::new("/no/such/dir"), TableKind::Confirmed);
        assert!(matches!(result, Err(LoaderError::Io { .. })));
    }
}
