//! Raw Table Schema
//! Column names of the case datasets and the structural checks run before normalization.

use chrono::NaiveDate;
use log::warn;
use polars::prelude::*;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

pub const REGION: &str = "Province/State";
pub const COUNTRY_RAW: &str = "Country/Region";
pub const LAT: &str = "Lat";
pub const LONG: &str = "Long";
/// Row key of every normalized table.
pub const COUNTRY: &str = "Country";

/// Non-date columns every raw table must carry.
pub const ID_COLUMNS: [&str; 4] = [REGION, COUNTRY_RAW, LAT, LONG];

const DATE_FORMATS: [&str; 2] = ["%m/%d/%y", "%Y-%m-%d"];

/// The three case datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Confirmed,
    Deaths,
    Recovered,
}

impl TableKind {
    pub const ALL: [TableKind; 3] = [TableKind::Confirmed, TableKind::Deaths, TableKind::Recovered];

    pub fn name(&self) -> &'static str {
        match self {
            TableKind::Confirmed => "Confirmed",
            TableKind::Deaths => "Deaths",
            TableKind::Recovered => "Recovered",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("{table}: missing column \"{column}\"")]
    MissingColumn { table: TableKind, column: String },
    #[error("{table}: column \"{column}\" is neither an identifier nor a date")]
    UnexpectedColumn { table: TableKind, column: String },
    #[error("{table}: column \"{column}\" has non-numeric values ({dtype})")]
    NonNumericColumn {
        table: TableKind,
        column: String,
        dtype: String,
    },
    #[error("{table}: country column holds {dtype} values, expected text")]
    CountryNotText { table: TableKind, dtype: String },
    #[error("{table}: date column \"{column}\" is not after the previous date")]
    DatesOutOfOrder { table: TableKind, column: String },
    #[error("{table}: no date columns")]
    NoDateColumns { table: TableKind },
    #[error("{table}: country column has {count} empty cells")]
    NullCountry { table: TableKind, count: usize },
    #[error("{table}: date columns differ from {expected}: {detail}")]
    DateColumnsMismatch {
        table: TableKind,
        expected: TableKind,
        detail: String,
    },
    #[error("{table}: country set differs from Confirmed (extra: {extra:?}, missing: {missing:?})")]
    CountrySetMismatch {
        table: TableKind,
        extra: Vec<String>,
        missing: Vec<String>,
    },
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Date columns shared by the three raw tables, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateColumns {
    pub names: Vec<String>,
    pub dates: Vec<NaiveDate>,
}

impl DateColumns {
    pub fn len(&self) -> usize {
        self.names.len()
    }
}

/// Parse a date column header such as `1/22/20` or `2020-01-22`.
pub fn parse_date_header(name: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(name, fmt).ok())
}

fn is_count_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Null
    )
}

/// Check one raw table and return its date columns.
pub fn inspect_table(table: TableKind, df: &DataFrame) -> Result<DateColumns, SchemaError> {
    let column_names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    for required in ID_COLUMNS {
        if !column_names.iter().any(|c| c == required) {
            return Err(SchemaError::MissingColumn {
                table,
                column: required.to_string(),
            });
        }
    }

    let country = df.column(COUNTRY_RAW)?;
    if country.dtype() != &DataType::String {
        return Err(SchemaError::CountryNotText {
            table,
            dtype: country.dtype().to_string(),
        });
    }
    if country.null_count() > 0 {
        return Err(SchemaError::NullCountry {
            table,
            count: country.null_count(),
        });
    }

    let mut names = Vec::new();
    let mut dates: Vec<NaiveDate> = Vec::new();
    for name in column_names
        .iter()
        .filter(|c| !ID_COLUMNS.contains(&c.as_str()))
    {
        let Some(date) = parse_date_header(name) else {
            return Err(SchemaError::UnexpectedColumn {
                table,
                column: name.clone(),
            });
        };
        let dtype = df.column(name)?.dtype();
        if !is_count_dtype(dtype) {
            return Err(SchemaError::NonNumericColumn {
                table,
                column: name.clone(),
                dtype: dtype.to_string(),
            });
        }
        if dates.last().is_some_and(|prev| *prev >= date) {
            return Err(SchemaError::DatesOutOfOrder {
                table,
                column: name.clone(),
            });
        }
        names.push(name.clone());
        dates.push(date);
    }

    if names.is_empty() {
        return Err(SchemaError::NoDateColumns { table });
    }

    let gaps = dates
        .windows(2)
        .filter(|w| (w[1] - w[0]).num_days() != 1)
        .count();
    if gaps > 0 {
        warn!("{table}: {gaps} gaps between consecutive date columns");
    }

    Ok(DateColumns { names, dates })
}

/// Check all raw tables and require an identical date schema.
pub fn validate_aligned(tables: &[(TableKind, &DataFrame)]) -> Result<DateColumns, SchemaError> {
    let mut reference: Option<(TableKind, DateColumns)> = None;

    for (kind, df) in tables {
        let columns = inspect_table(*kind, df)?;
        match &reference {
            None => reference = Some((*kind, columns)),
            Some((expected, ref_columns)) => {
                if let Some(detail) = describe_mismatch(&ref_columns.names, &columns.names) {
                    return Err(SchemaError::DateColumnsMismatch {
                        table: *kind,
                        expected: *expected,
                        detail,
                    });
                }
            }
        }
    }

    reference
        .map(|(_, columns)| columns)
        .ok_or(SchemaError::NoDateColumns {
            table: TableKind::Confirmed,
        })
}

fn describe_mismatch(expected: &[String], found: &[String]) -> Option<String> {
    if expected == found {
        return None;
    }
    let position = expected
        .iter()
        .zip(found)
        .position(|(a, b)| a != b)
        .unwrap_or(expected.len().min(found.len()));
    Some(format!(
        "{} vs {} columns, first difference at position {} ({:?} vs {:?})",
        expected.len(),
        found.len(),
        position,
        expected.get(position),
        found.get(position)
    ))
}

/// Distinct values of `column`, in order of first appearance.
pub fn distinct_countries(df: &DataFrame, column: &str) -> Result<Vec<String>, PolarsError> {
    let values = df.column(column)?.str()?;
    let mut seen = HashSet::new();
    Ok(values
        .into_iter()
        .flatten()
        .filter(|c| seen.insert(*c))
        .map(str::to_string)
        .collect())
}

/// Compare a table's country set with the Confirmed one.
pub fn check_country_set(
    table: TableKind,
    confirmed: &[String],
    other: &[String],
    strict: bool,
) -> Result<(), SchemaError> {
    let confirmed_set: HashSet<&str> = confirmed.iter().map(String::as_str).collect();
    let other_set: HashSet<&str> = other.iter().map(String::as_str).collect();

    let extra: Vec<String> = other
        .iter()
        .filter(|c| !confirmed_set.contains(c.as_str()))
        .cloned()
        .collect();
    let missing: Vec<String> = confirmed
        .iter()
        .filter(|c| !other_set.contains(c.as_str()))
        .cloned()
        .collect();

    if extra.is_empty() && missing.is_empty() {
        return Ok(());
    }
    if strict {
        return Err(SchemaError::CountrySetMismatch {
            table,
            extra,
            missing,
        });
    }
    warn!("{table}: country set differs from Confirmed (extra: {extra:?}, missing: {missing:?})");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    fn raw(dates: [&str; 2]) -> DataFrame {
        df!(
            REGION => &[Some("Hubei"), None],
            COUNTRY_RAW => &["China", "Italy"],
            LAT => &[30.9, 41.8],
            LONG => &[112.2, 12.5],
            dates[0] => &[444i64, 0],
            dates[1] => &[444i64, 2]
        )
        .unwrap()
    }

    #[test]
    fn date_headers_parse_in_both_formats() {
        assert_eq!(
            parse_date_header("1/22/20"),
            NaiveDate::from_ymd_opt(2020, 1, 22)
        );
        assert_eq!(
            parse_date_header("2020-12-03"),
            NaiveDate::from_ymd_opt(2020, 12, 3)
        );
        assert_eq!(parse_date_header("Population"), None);
    }

    #[test]
    fn inspect_returns_date_columns() -> anyhow::Result<()> {
        let columns = inspect_table(TableKind::Confirmed, &raw(["1/22/20", "1/23/20"]))?;
        assert_eq!(columns.names, vec!["1/22/20", "1/23/20"]);
        assert_eq!(columns.dates[1], NaiveDate::from_ymd_opt(2020, 1, 23).unwrap());
        Ok(())
    }

    #[test]
    fn missing_identifier_column_is_rejected() -> anyhow::Result<()> {
        let df = raw(["1/22/20", "1/23/20"]).drop(LAT)?;
        assert!(matches!(
            inspect_table(TableKind::Deaths, &df),
            Err(SchemaError::MissingColumn { column, .. }) if column == LAT
        ));
        Ok(())
    }

    #[test]
    fn non_numeric_counts_are_rejected() -> anyhow::Result<()> {
        let df = df!(
            REGION => &[None::<&str>],
            COUNTRY_RAW => &["Italy"],
            LAT => &[41.8],
            LONG => &[12.5],
            "1/22/20" => &["n/a"]
        )?;
        assert!(matches!(
            inspect_table(TableKind::Confirmed, &df),
            Err(SchemaError::NonNumericColumn { .. })
        ));
        Ok(())
    }

    #[test]
    fn numeric_country_column_is_rejected() -> anyhow::Result<()> {
        let df = df!(
            REGION => &[None::<&str>],
            COUNTRY_RAW => &[7i64],
            LAT => &[41.8],
            LONG => &[12.5],
            "1/22/20" => &[3i64]
        )?;
        assert!(matches!(
            inspect_table(TableKind::Deaths, &df),
            Err(SchemaError::CountryNotText { table: TableKind::Deaths, .. })
        ));
        Ok(())
    }

    #[test]
    fn out_of_order_dates_are_rejected() {
        assert!(matches!(
            inspect_table(TableKind::Confirmed, &raw(["1/23/20", "1/22/20"])),
            Err(SchemaError::DatesOutOfOrder { .. })
        ));
    }

    #[test]
    fn differing_date_schemas_fail_fast() {
        let confirmed = raw(["1/22/20", "1/23/20"]);
        let deaths = raw(["1/22/20", "1/24/20"]);
        let result = validate_aligned(&[
            (TableKind::Confirmed, &confirmed),
            (TableKind::Deaths, &deaths),
        ]);
        assert!(matches!(
            result,
            Err(SchemaError::DateColumnsMismatch {
                table: TableKind::Deaths,
                expected: TableKind::Confirmed,
                ..
            })
        ));
    }

    #[test]
    fn distinct_countries_keeps_first_appearance() -> anyhow::Result<()> {
        let df = df!(COUNTRY_RAW => &["China", "Italy", "China", "Albania"])?;
        assert_eq!(
            distinct_countries(&df, COUNTRY_RAW)?,
            vec!["China", "Italy", "Albania"]
        );
        Ok(())
    }

    #[test]
    fn country_set_mismatch_only_fails_when_strict() {
        let confirmed = vec!["China".to_string(), "Italy".to_string()];
        let recovered = vec!["China".to_string()];
        assert!(check_country_set(TableKind::Recovered, &confirmed, &recovered, false).is_ok());
        assert!(matches!(
            check_country_set(TableKind::Recovered, &confirmed, &recovered, true),
            Err(SchemaError::CountrySetMismatch { missing, .. })
                if missing == vec!["Italy".to_string()]
        ));
    }
}
