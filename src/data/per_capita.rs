//! Per-Capita Deriver Module
//! Scales aggregated counts to values per 100,000 inhabitants.

use super::schema::COUNTRY;
use crate::population::PopulationTable;
use log::debug;
use polars::prelude::*;

/// Per-capita values are expressed per this many inhabitants.
pub const PER_CAPITA_BASE: f64 = 100_000.0;

/// Divides every country row by its population, dropping countries without one.
pub struct PerCapitaDeriver;

impl PerCapitaDeriver {
    /// Output has the same columns as `aggregated`, with Float64 date columns.
    /// Countries missing from `population` are omitted.
    pub fn derive(aggregated: &DataFrame, population: &PopulationTable) -> PolarsResult<DataFrame> {
        let countries = aggregated.column(COUNTRY)?.str()?;
        let populations: Vec<Option<f64>> = countries
            .into_iter()
            .map(|c| c.and_then(|c| population.get(c)).map(|p| p as f64))
            .collect();

        let keep: Vec<bool> = populations.iter().map(Option::is_some).collect();
        let skipped = keep.iter().filter(|k| !**k).count();
        if skipped > 0 {
            debug!("Skipping {skipped} countries without population");
        }

        let mask = BooleanChunked::from_slice("keep".into(), &keep);
        let kept = aggregated.filter(&mask)?;
        let kept_populations: Vec<f64> = populations.into_iter().flatten().collect();

        let mut columns = Vec::with_capacity(kept.width());
        for column in kept.get_columns() {
            if column.name().as_str() == COUNTRY {
                columns.push(column.clone());
                continue;
            }
            let values = column.cast(&DataType::Float64)?;
            let scaled: Vec<Option<f64>> = values
                .f64()?
                .into_iter()
                .zip(kept_populations.iter())
                .map(|(v, p)| v.map(|v| v / p * PER_CAPITA_BASE))
                .collect();
            columns.push(Column::new(column.name().clone(), scaled));
        }

        DataFrame::new(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::distinct_countries;
    use crate::population::{CountryAliasResolver, PopulationIndex, StaticPopulationProvider};
    use polars::df;

    fn aggregated() -> DataFrame {
        df!(
            COUNTRY => &["China", "Freedonia", "South Korea"],
            "1/22/20" => &[250i64, 5, 10],
            "1/23/20" => &[0i64, 9, 20]
        )
        .unwrap()
    }

    fn population() -> PopulationTable {
        let provider = StaticPopulationProvider::new([
            ("China", 1_400_000_000),
            ("South Korea", 50_000_000),
        ]);
        PopulationIndex::new(&provider, CountryAliasResolver::default())
            .build(["China", "Freedonia", "South Korea"])
    }

    #[test]
    fn values_are_scaled_per_100k() -> anyhow::Result<()> {
        let out = PerCapitaDeriver::derive(&aggregated(), &population())?;
        let first = out.column("1/22/20")?.f64()?;

        let china = first.get(0).unwrap();
        assert!((china - 250.0 / 1_400_000_000.0 * 100_000.0).abs() < 1e-12);
        assert!((china - 0.017857).abs() < 1e-5);

        let korea = first.get(1).unwrap();
        assert!((korea - 0.02).abs() < 1e-12);

        assert_eq!(out.column("1/23/20")?.f64()?.get(0), Some(0.0));
        Ok(())
    }

    #[test]
    fn countries_without_population_are_omitted() -> anyhow::Result<()> {
        let out = PerCapitaDeriver::derive(&aggregated(), &population())?;
        assert_eq!(out.height(), 2);
        assert_eq!(
            distinct_countries(&out, COUNTRY)?,
            vec!["China", "South Korea"]
        );
        Ok(())
    }

    #[test]
    fn schema_matches_aggregated_with_float_values() -> anyhow::Result<()> {
        let out = PerCapitaDeriver::derive(&aggregated(), &population())?;
        assert_eq!(out.get_column_names(), aggregated().get_column_names());
        assert_eq!(out.column("1/22/20")?.dtype(), &DataType::Float64);
        Ok(())
    }

    #[test]
    fn empty_population_gives_empty_table() -> anyhow::Result<()> {
        let out = PerCapitaDeriver::derive(&aggregated(), &PopulationTable::default())?;
        assert_eq!(out.height(), 0);
        assert_eq!(out.width(), 3);
        Ok(())
    }
}
