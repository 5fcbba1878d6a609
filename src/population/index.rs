//! Population Index Module
//! Builds the country -> population table used for per-capita series.

use super::{CountryAliasResolver, PopulationError, PopulationProvider};
use log::{debug, info, warn};
use std::collections::HashMap;

/// Outcome of a single country lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopulationLookup {
    Found(u64),
    NotFound { provider_name: String },
}

/// Best-effort mapping from case-dataset country names to positive populations.
/// Countries the provider could not answer are listed in `missing`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopulationTable {
    entries: HashMap<String, u64>,
    missing: Vec<String>,
}

impl PopulationTable {
    pub fn get(&self, country: &str) -> Option<u64> {
        self.entries.get(country).copied()
    }

    /// Countries absent from the table, in lookup order.
    pub fn missing(&self) -> &[String] {
        &self.missing
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Queries a `PopulationProvider` through the alias resolver.
pub struct PopulationIndex<'a> {
    provider: &'a dyn PopulationProvider,
    resolver: CountryAliasResolver,
}

impl<'a> PopulationIndex<'a> {
    pub fn new(provider: &'a dyn PopulationProvider, resolver: CountryAliasResolver) -> Self {
        Self { provider, resolver }
    }

    /// Look up one country, keeping "not found" as a value rather than an error.
    pub fn lookup(&self, country: &str) -> PopulationLookup {
        let provider_name = self.resolver.resolve(country);
        match self.provider.population(provider_name) {
            Ok(population) if population > 0 => PopulationLookup::Found(population),
            Ok(_) => PopulationLookup::NotFound {
                provider_name: provider_name.to_string(),
            },
            Err(PopulationError::NotFound(_)) => PopulationLookup::NotFound {
                provider_name: provider_name.to_string(),
            },
            Err(e) => {
                warn!("Population lookup for {country} failed: {e}");
                PopulationLookup::NotFound {
                    provider_name: provider_name.to_string(),
                }
            }
        }
    }

    /// Build the table for every name in `countries`. Duplicates are looked up once.
    pub fn build<'c>(&self, countries: impl IntoIterator<Item = &'c str>) -> PopulationTable {
        let mut table = PopulationTable::default();

        for country in countries {
            let seen = table.entries.contains_key(country);
            if seen || table.missing.iter().any(|m| m == country) {
                continue;
            }
            match self.lookup(country) {
                PopulationLookup::Found(population) => {
                    table.entries.insert(country.to_string(), population);
                }
                PopulationLookup::NotFound { provider_name } => {
                    debug!("No population for {country} (looked up as {provider_name})");
                    table.missing.push(country.to_string());
                }
            }
        }

        info!(
            "Population table: {} countries found, {} missing",
            table.entries.len(),
            table.missing.len()
        );
        table
    }
}
