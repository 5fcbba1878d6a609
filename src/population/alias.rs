//! Country Alias Resolver
//! Maps country labels between the case dataset and the population provider.

/// Known spellings that differ between the case dataset (left) and the
/// population provider (right).
pub const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("US", "USA"),
    ("Czechia", "Czech Republic"),
    ("Taiwan*", "Taiwan"),
    ("Korea, South", "South Korea"),
    ("Eswatini", "Swaziland"),
    ("Cote d'Ivoire", "Ivory Coast"),
];

/// Renames applied inside the case dataset itself, before grouping.
pub const DEFAULT_CANONICAL_RENAMES: &[(&str, &str)] = &[("Korea, South", "South Korea")];

/// Static alias table with an identity fallback for unlisted names.
#[derive(Debug, Clone, Copy)]
pub struct CountryAliasResolver {
    aliases: &'static [(&'static str, &'static str)],
    renames: &'static [(&'static str, &'static str)],
}

impl Default for CountryAliasResolver {
    fn default() -> Self {
        Self::new(DEFAULT_ALIASES, DEFAULT_CANONICAL_RENAMES)
    }
}

impl CountryAliasResolver {
    pub fn new(
        aliases: &'static [(&'static str, &'static str)],
        renames: &'static [(&'static str, &'static str)],
    ) -> Self {
        Self { aliases, renames }
    }

    /// Case-dataset name to the name the population provider expects.
    pub fn resolve<'a>(&self, case_name: &'a str) -> &'a str {
        self.aliases
            .iter()
            .find(|(case, _)| *case == case_name)
            .map(|(_, provider)| *provider)
            .unwrap_or(case_name)
    }

    /// Population-provider name back to the case-dataset spelling.
    #[allow(dead_code)]
    pub fn reverse<'a>(&self, provider_name: &'a str) -> &'a str {
        self.aliases
            .iter()
            .find(|(_, provider)| *provider == provider_name)
            .map(|(case, _)| *case)
            .unwrap_or(provider_name)
    }

    /// Name as it appears after the in-dataset renames.
    pub fn canonicalize<'a>(&self, case_name: &'a str) -> &'a str {
        self.renames
            .iter()
            .find(|(from, _)| *from == case_name)
            .map(|(_, to)| *to)
            .unwrap_or(case_name)
    }

    pub fn canonical_renames(&self) -> &'static [(&'static str, &'static str)] {
        self.renames
    }
}
