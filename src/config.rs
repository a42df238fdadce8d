use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DealError, DealResult};
use crate::geo::CountryCodes;

/// Colors handed to the renderer, assigned to series in order
pub const DEFAULT_PALETTE: [&str; 9] = [
    "#2a9d8f", "#264653", "#e9c46a", "#f4a261", "#e76f51", "#ef233c", "#f6bd60", "#84a59d",
    "#f95738",
];

/// smallest and largest league table the dashboard offers
pub const LEAGUE_SIZE_RANGE: std::ops::RangeInclusive<usize> = 5..=15;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// deal file to load
    pub data_path: PathBuf,
    /// field separator of the deal file, a single byte
    pub delimiter: char,
    /// abort loading on the first malformed row instead of skipping it
    pub strict: bool,
    pub palette: Vec<String>,
    /// number of investors in the league table
    pub league_size: usize,
    /// extra or corrected country name to ISO alpha-3 entries
    pub country_codes: HashMap<String, String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/deals.csv"),
            delimiter: ';',
            strict: false,
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
            league_size: 10,
            country_codes: HashMap::new(),
        }
    }
}

impl DashboardConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> DealResult<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        let config: DashboardConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        log::debug!("loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn validate(&self) -> DealResult<()> {
        self.delimiter_byte()?;
        if self.palette.is_empty() {
            return Err(DealError::InvalidArgument("palette must not be empty".into()));
        }
        if !LEAGUE_SIZE_RANGE.contains(&self.league_size) {
            return Err(DealError::InvalidArgument(format!(
                "league_size must be within {}..={}, got {}",
                LEAGUE_SIZE_RANGE.start(),
                LEAGUE_SIZE_RANGE.end(),
                self.league_size
            )));
        }
        Ok(())
    }

    /// The delimiter as the single byte the CSV reader wants
    pub fn delimiter_byte(&self) -> DealResult<u8> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                DealError::InvalidArgument(format!(
                    "delimiter '{}' is not a single ASCII character",
                    self.delimiter
                ))
            })
    }

    /// builtin country codes with the configured entries on top
    pub fn country_lookup(&self) -> CountryCodes {
        let mut codes = CountryCodes::builtin();
        codes.extend(self.country_codes.clone());
        codes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::CountryCodeLookup;

    #[test]
    fn defaults_match_the_dashboard() {
        let config = DashboardConfig::default();
        assert_eq!(b';', config.delimiter_byte().unwrap());
        assert_eq!(9, config.palette.len());
        assert_eq!(10, config.league_size);
        assert!(config.validate().is_ok());
    }

    #[test]
    /// missing fields fall back to their defaults
    fn partial_file_is_filled_in() {
        let config: DashboardConfig =
            serde_json::from_str(r#"{ "delimiter": ",", "country_codes": { "Atlantis": "ATL" } }"#)
                .unwrap();
        assert_eq!(b',', config.delimiter_byte().unwrap());
        assert_eq!(PathBuf::from("data/deals.csv"), config.data_path);
        assert_eq!(Some("ATL"), config.country_lookup().iso_code("Atlantis"));
        assert_eq!(Some("FRA"), config.country_lookup().iso_code("France"));
    }

    #[test]
    fn invalid_values_are_refused() {
        let config = DashboardConfig {
            delimiter: 'é',
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = DashboardConfig {
            league_size: 40,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = DashboardConfig {
            palette: Vec::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_reads_a_file() {
        let config = DashboardConfig::load("testdata/dashboard.json").unwrap();
        assert_eq!(PathBuf::from("testdata/deals.csv"), config.data_path);
        assert_eq!(12, config.league_size);
        assert!(DashboardConfig::load("testdata/missing.json").is_err());
    }
}
