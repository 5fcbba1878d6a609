//! Region Aggregator Module
//! Collapses province/state rows into one row per country.

use super::schema::{COUNTRY, COUNTRY_RAW};
use crate::population::CountryAliasResolver;
use log::debug;
use polars::prelude::*;

/// Sums sub-national rows into national totals, one column per date.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegionAggregator {
    resolver: CountryAliasResolver,
}

impl RegionAggregator {
    pub fn new(resolver: CountryAliasResolver) -> Self {
        Self { resolver }
    }

    /// Expression producing the canonical country name from the raw column.
    fn canonical_country_expr(&self) -> Expr {
        self.resolver
            .canonical_renames()
            .iter()
            .fold(col(COUNTRY_RAW), |acc, (from, to)| {
                when(col(COUNTRY_RAW).eq(lit(*from)))
                    .then(lit(*to))
                    .otherwise(acc)
            })
            .alias(COUNTRY)
    }

    /// Aggregate a raw table over `date_columns`.
    ///
    /// Output columns: [COUNTRY, date_columns...], rows in order of first appearance.
    /// Empty count cells are summed as zero.
    pub fn aggregate(&self, raw: &DataFrame, date_columns: &[String]) -> PolarsResult<DataFrame> {
        let mut selection = Vec::with_capacity(date_columns.len() + 1);
        selection.push(self.canonical_country_expr());
        selection.extend(date_columns.iter().map(|d| {
            col(d.as_str())
                .cast(DataType::Int64)
                .fill_null(lit(0i64))
        }));

        let sums: Vec<Expr> = date_columns
            .iter()
            .map(|d| col(d.as_str()).sum())
            .collect();

        let aggregated = raw
            .clone()
            .lazy()
            .select(selection)
            .group_by_stable([col(COUNTRY)])
            .agg(sums)
            .collect()?;

        debug!(
            "Aggregated {} rows into {} countries",
            raw.height(),
            aggregated.height()
        );
        Ok(aggregated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::{distinct_countries, LAT, LONG, REGION};
    use polars::df;

    fn raw() -> DataFrame {
        df!(
            REGION => &[Some("Hubei"), Some("Beijing"), None, None, None],
            COUNTRY_RAW => &["China", "China", "Korea, South", "Italy", "Freedonia"],
            LAT => &[30.9, 40.1, 35.9, 41.8, 0.0],
            LONG => &[112.2, 116.4, 127.7, 12.5, 0.0],
            "1/22/20" => &[Some(100i64), Some(150), Some(10), Some(0), None],
            "1/23/20" => &[Some(200i64), Some(160), Some(20), Some(2), Some(7)]
        )
        .unwrap()
    }

    fn dates() -> Vec<String> {
        vec!["1/22/20".to_string(), "1/23/20".to_string()]
    }

    fn row(df: &DataFrame, country: &str) -> anyhow::Result<Vec<i64>> {
        let countries = df.column(COUNTRY)?.str()?;
        let idx = countries
            .into_iter()
            .position(|c| c == Some(country))
            .ok_or_else(|| anyhow::anyhow!("{country} not found"))?;
        let mut values = Vec::new();
        for d in dates() {
            values.push(df.column(&d)?.i64()?.get(idx).unwrap_or_default());
        }
        Ok(values)
    }

    #[test]
    fn provinces_are_summed_per_date() -> anyhow::Result<()> {
        let out = RegionAggregator::default().aggregate(&raw(), &dates())?;
        assert_eq!(row(&out, "China")?, vec![250, 360]);
        Ok(())
    }

    #[test]
    fn one_row_per_distinct_country_in_first_appearance_order() -> anyhow::Result<()> {
        let out = RegionAggregator::default().aggregate(&raw(), &dates())?;
        assert_eq!(out.height(), 4);
        assert_eq!(
            distinct_countries(&out, COUNTRY)?,
            vec!["China", "South Korea", "Italy", "Freedonia"]
        );
        Ok(())
    }

    #[test]
    fn identifier_columns_are_dropped() -> anyhow::Result<()> {
        let out = RegionAggregator::default().aggregate(&raw(), &dates())?;
        let names: Vec<String> = out
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, vec![COUNTRY, "1/22/20", "1/23/20"]);
        Ok(())
    }

    #[test]
    fn single_rows_pass_through_and_nulls_count_as_zero() -> anyhow::Result<()> {
        let out = RegionAggregator::default().aggregate(&raw(), &dates())?;
        assert_eq!(row(&out, "South Korea")?, vec![10, 20]);
        assert_eq!(row(&out, "Italy")?, vec![0, 2]);
        assert_eq!(row(&out, "Freedonia")?, vec![0, 7]);
        Ok(())
    }

    #[test]
    fn aggregation_is_deterministic() -> anyhow::Result<()> {
        let aggregator = RegionAggregator::default();
        let a = aggregator.aggregate(&raw(), &dates())?;
        let b = aggregator.aggregate(&raw(), &dates())?;
        assert!(a.equals(&b));
        Ok(())
    }
}
