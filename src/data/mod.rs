//! Data module - CSV loading, validation and normalization

mod aggregator;
mod loader;
mod per_capita;
mod pipeline;
mod schema;
mod selection;

pub use loader::DataLoader;
#[cfg(test)]
pub use loader::RawTables;
pub use pipeline::{Metric, NormalizationPipeline, NormalizedData, ValidCountryList};
pub use selection::parse_selection;
