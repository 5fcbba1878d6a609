//! Population module - country name aliases and population lookups

mod alias;
mod index;
mod provider;

pub use alias::CountryAliasResolver;
pub use index::{PopulationIndex, PopulationTable};
pub use provider::{JsonPopulationProvider, PopulationError, PopulationProvider};

#[cfg(test)]
pub use provider::StaticPopulationProvider;
