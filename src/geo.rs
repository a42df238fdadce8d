use std::collections::HashMap;

/// Maps a country name to its ISO 3166 alpha-3 code.
///
/// A name without a mapping is not an error, callers get `None` and carry a
/// null code forward.
pub trait CountryCodeLookup {
    fn iso_code(&self, country: &str) -> Option<&str>;
}

const BUILTIN: &[(&str, &str)] = &[
    ("Argentina", "ARG"),
    ("Australia", "AUS"),
    ("Austria", "AUT"),
    ("Belgium", "BEL"),
    ("Brazil", "BRA"),
    ("Canada", "CAN"),
    ("Chile", "CHL"),
    ("China", "CHN"),
    ("Colombia", "COL"),
    ("Czechia", "CZE"),
    ("Denmark", "DNK"),
    ("Egypt", "EGY"),
    ("Finland", "FIN"),
    ("France", "FRA"),
    ("Germany", "DEU"),
    ("Greece", "GRC"),
    ("Hong Kong", "HKG"),
    ("Hungary", "HUN"),
    ("India", "IND"),
    ("Indonesia", "IDN"),
    ("Ireland", "IRL"),
    ("Israel", "ISR"),
    ("Italy", "ITA"),
    ("Japan", "JPN"),
    ("Luxembourg", "LUX"),
    ("Malaysia", "MYS"),
    ("Mexico", "MEX"),
    ("Morocco", "MAR"),
    ("Netherlands", "NLD"),
    ("New Zealand", "NZL"),
    ("Nigeria", "NGA"),
    ("Norway", "NOR"),
    ("Peru", "PER"),
    ("Philippines", "PHL"),
    ("Poland", "POL"),
    ("Portugal", "PRT"),
    ("Qatar", "QAT"),
    ("Romania", "ROU"),
    ("Saudi Arabia", "SAU"),
    ("Singapore", "SGP"),
    ("South Africa", "ZAF"),
    ("Spain", "ESP"),
    ("Sweden", "SWE"),
    ("Switzerland", "CHE"),
    ("Thailand", "THA"),
    ("Turkey", "TUR"),
    ("United Arab Emirates", "ARE"),
    ("United Kingdom", "GBR"),
    ("United States", "USA"),
    ("Viet Nam", "VNM"),
];

/// Table backed lookup, matching names case insensitively
#[derive(Clone, Debug, Default)]
pub struct CountryCodes {
    codes: HashMap<String, String>,
}

impl CountryCodes {
    /// a lookup without any entries
    pub fn empty() -> Self {
        Self::default()
    }

    /// the built in country table
    pub fn builtin() -> Self {
        let mut codes = Self::empty();
        codes.extend(BUILTIN.iter().map(|(name, code)| (name.to_string(), code.to_string())));
        codes
    }

    /// Add or override entries
    pub fn extend<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, code) in entries {
            self.codes.insert(name.trim().to_lowercase(), code);
        }
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl CountryCodeLookup for CountryCodes {
    fn iso_code(&self, country: &str) -> Option<&str> {
        self.codes
            .get(&country.trim().to_lowercase())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_resolve_case_insensitively() {
        let codes = CountryCodes::builtin();
        assert_eq!(Some("FRA"), codes.iso_code("France"));
        assert_eq!(Some("USA"), codes.iso_code("united states"));
    }

    #[test]
    fn unknown_names_are_none() {
        let codes = CountryCodes::builtin();
        assert_eq!(None, codes.iso_code("Atlantis"));
    }

    #[test]
    fn extra_entries_override_builtin() {
        let mut codes = CountryCodes::builtin();
        let before = codes.len();
        codes.extend([
            ("Atlantis".to_string(), "ATL".to_string()),
            ("France".to_string(), "FXX".to_string()),
        ]);
        assert_eq!(before + 1, codes.len());
        assert_eq!(Some("ATL"), codes.iso_code("Atlantis"));
        assert_eq!(Some("FXX"), codes.iso_code("FRANCE"));
    }
}
