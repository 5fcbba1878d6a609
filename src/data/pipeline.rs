//! Normalization Pipeline
//! Turns the three raw case tables into six per-country tables.

use super::aggregator::RegionAggregator;
use super::loader::RawTables;
use super::per_capita::PerCapitaDeriver;
use super::schema::{
    check_country_set, distinct_countries, validate_aligned, SchemaError, TableKind, COUNTRY,
    COUNTRY_RAW,
};
use crate::population::{CountryAliasResolver, PopulationIndex, PopulationProvider, PopulationTable};
use chrono::NaiveDate;
use log::info;
use polars::prelude::*;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Schema mismatch: {0}")]
    Schema(#[from] SchemaError),
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("Expected 6 normalized tables, got {0}")]
    TableCount(usize),
}

/// The six normalized tables, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Metric {
    #[default]
    Confirmed,
    Deaths,
    Recovered,
    ConfirmedPerCapita,
    DeathsPerCapita,
    RecoveredPerCapita,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::Confirmed,
        Metric::Deaths,
        Metric::Recovered,
        Metric::ConfirmedPerCapita,
        Metric::DeathsPerCapita,
        Metric::RecoveredPerCapita,
    ];

    pub fn index(&self) -> usize {
        match self {
            Metric::Confirmed => 0,
            Metric::Deaths => 1,
            Metric::Recovered => 2,
            Metric::ConfirmedPerCapita => 3,
            Metric::DeathsPerCapita => 4,
            Metric::RecoveredPerCapita => 5,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Confirmed => "Confirmed",
            Metric::Deaths => "Deaths",
            Metric::Recovered => "Recovered",
            Metric::ConfirmedPerCapita => "Confirmed per capita",
            Metric::DeathsPerCapita => "Deaths per capita",
            Metric::RecoveredPerCapita => "Recovered per capita",
        }
    }

    pub fn is_per_capita(&self) -> bool {
        self.index() >= 3
    }

    /// Y axis label, e.g. "Number of confirmed cases" or "Number of deaths".
    pub fn axis_label(&self) -> String {
        format!("Number of {}", self.quantity().to_lowercase())
    }

    /// Chart title, e.g. "Number of Confirmed Per Capita Cases".
    pub fn title(&self) -> String {
        let words: Vec<String> = self
            .quantity()
            .split_whitespace()
            .map(|w| {
                let mut chars = w.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect();
        format!("Number of {}", words.join(" "))
    }

    fn quantity(&self) -> String {
        match self {
            Metric::Deaths => self.label().to_string(),
            _ => format!("{} cases", self.label()),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Country names accepted as selection keys, de-duplicated, in Confirmed order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidCountryList {
    names: Vec<String>,
}

impl ValidCountryList {
    /// De-duplicates while keeping the first occurrence.
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        let mut seen = HashSet::new();
        let names = names
            .into_iter()
            .filter(|n| seen.insert(n.clone()))
            .collect();
        Self { names }
    }

    pub fn contains(&self, country: &str) -> bool {
        self.names.iter().any(|n| n == country)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Result of one pipeline run. Immutable once built.
#[derive(Debug, Clone)]
pub struct NormalizedData {
    tables: [DataFrame; 6],
    countries: ValidCountryList,
    date_columns: Vec<String>,
    dates: Vec<NaiveDate>,
    population: PopulationTable,
}

impl NormalizedData {
    pub fn table(&self, metric: Metric) -> &DataFrame {
        &self.tables[metric.index()]
    }

    /// [Confirmed, Deaths, Recovered, ConfirmedPerCapita, DeathsPerCapita, RecoveredPerCapita]
    pub fn tables(&self) -> [&DataFrame; 6] {
        Metric::ALL.map(|m| self.table(m))
    }

    pub fn countries(&self) -> &ValidCountryList {
        &self.countries
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn population(&self) -> &PopulationTable {
        &self.population
    }

    /// Time series of `country` in the `metric` table, or None if the table has no such row.
    pub fn series(&self, metric: Metric, country: &str) -> Option<Vec<f64>> {
        let df = self.table(metric);
        let idx = df
            .column(COUNTRY)
            .ok()?
            .str()
            .ok()?
            .into_iter()
            .position(|c| c == Some(country))?;

        self.date_columns
            .iter()
            .map(|d| {
                let values = df.column(d).ok()?.cast(&DataType::Float64).ok()?;
                let value = values.f64().ok()?.get(idx);
                Some(value.unwrap_or(0.0))
            })
            .collect()
    }
}

/// Orchestrates validation, population lookup, aggregation and per-capita derivation.
pub struct NormalizationPipeline<'a> {
    provider: &'a dyn PopulationProvider,
    resolver: CountryAliasResolver,
    strict_country_sets: bool,
}

impl<'a> NormalizationPipeline<'a> {
    pub fn new(provider: &'a dyn PopulationProvider) -> Self {
        Self {
            provider,
            resolver: CountryAliasResolver::default(),
            strict_country_sets: false,
        }
    }

    #[allow(dead_code)]
    pub fn with_resolver(mut self, resolver: CountryAliasResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Fail instead of warning when Deaths/Recovered list other countries than Confirmed.
    pub fn with_strict_country_sets(mut self, strict: bool) -> Self {
        self.strict_country_sets = strict;
        self
    }

    pub fn run(&self, raw: &RawTables) -> Result<NormalizedData, PipelineError> {
        let date_columns = validate_aligned(&raw.tables())?;
        info!(
            "Validated raw tables: {} date columns from {} to {}",
            date_columns.len(),
            date_columns.dates[0],
            date_columns.dates[date_columns.len() - 1]
        );

        // Only Confirmed feeds the country list
        let raw_countries = distinct_countries(&raw.confirmed, COUNTRY_RAW)?;
        for kind in [TableKind::Deaths, TableKind::Recovered] {
            let others = distinct_countries(raw.get(kind), COUNTRY_RAW)?;
            check_country_set(kind, &raw_countries, &others, self.strict_country_sets)?;
        }

        let countries = ValidCountryList::new(
            raw_countries
                .iter()
                .map(|c| self.resolver.canonicalize(c).to_string()),
        );
        info!("{} distinct countries", countries.len());

        let population =
            PopulationIndex::new(self.provider, self.resolver).build(countries.iter());

        let aggregator = RegionAggregator::new(self.resolver);
        let absolute: Vec<DataFrame> = TableKind::ALL
            .par_iter()
            .map(|kind| aggregator.aggregate(raw.get(*kind), &date_columns.names))
            .collect::<PolarsResult<_>>()?;

        let per_capita: Vec<DataFrame> = absolute
            .par_iter()
            .map(|df| PerCapitaDeriver::derive(df, &population))
            .collect::<PolarsResult<_>>()?;

        let tables: [DataFrame; 6] = absolute
            .into_iter()
            .chain(per_capita)
            .collect::<Vec<_>>()
            .try_into()
            .map_err(|tables: Vec<DataFrame>| PipelineError::TableCount(tables.len()))?;

        Ok(NormalizedData {
            tables,
            countries,
            date_columns: date_columns.names,
            dates: date_columns.dates,
            population,
        })
    }
}
