//! Country record model, display formatting, and property extraction.
//!
//! ```rust
//! use gcountry::{format_area, format_population};
//!
//! assert_eq!(format_population(2_300_000), "2.3M");
//! assert_eq!(format_area(1_234_567.0), "1,234,567 km²");
//! assert_eq!(format_area(0.0), "Unknown");
//! ```

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CountryError;

pub const UNKNOWN: &str = "Unknown";
pub const PROPERTY_NOT_AVAILABLE: &str = "Property not available";

/// Lowercases and trims a user-supplied country name into a lookup key.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

pub fn format_population(population: u64) -> String {
    if population < 1_000 {
        return population.to_string();
    }

    let (value, suffix) = if population < 1_000_000 {
        (population as f64 / 1_000.0, "K")
    } else if population < 1_000_000_000 {
        (population as f64 / 1_000_000.0, "M")
    } else {
        (population as f64 / 1_000_000_000.0, "B")
    };

    format!("{value:.1}{suffix}")
}

pub fn format_area(area: f64) -> String {
    if area.is_nan() || area <= 0.0 {
        return UNKNOWN.to_string();
    }

    format!("{} km²", group_thousands(area.round() as u64))
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

fn unknown() -> String {
    UNKNOWN.to_string()
}

fn is_unknown(value: &str) -> bool {
    value.trim().is_empty() || value == UNKNOWN
}

/// A resolved country. `name` is the lowercase lookup key and `common_name`
/// the display spelling. Population and area are stored raw; their display
/// strings are always derived on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CountryRecord {
    pub name: String,
    pub common_name: String,
    pub official_name: Option<String>,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub subregion: Option<String>,
    pub languages: Vec<String>,
    pub currencies: Vec<String>,
    pub population: u64,
    pub area: f64,
    pub flag_url: Option<String>,
    pub coat_of_arms_url: Option<String>,
    pub borders: Vec<String>,
    pub timezones: Vec<String>,
    pub continents: Vec<String>,
    pub independent: Option<bool>,
    pub un_member: bool,
    pub national_animal: String,
    pub national_flower: String,
    pub national_bird: String,
    pub national_anthem: String,
}

impl Default for CountryRecord {
    fn default() -> Self {
        Self {
            name: String::new(),
            common_name: String::new(),
            official_name: None,
            capital: None,
            region: None,
            subregion: None,
            languages: Vec::new(),
            currencies: Vec::new(),
            population: 0,
            area: 0.0,
            flag_url: None,
            coat_of_arms_url: None,
            borders: Vec::new(),
            timezones: Vec::new(),
            continents: Vec::new(),
            independent: None,
            un_member: false,
            national_animal: unknown(),
            national_flower: unknown(),
            national_bird: unknown(),
            national_anthem: unknown(),
        }
    }
}

impl CountryRecord {
    pub fn new(common_name: impl Into<String>) -> Self {
        let common_name = common_name.into();
        Self {
            name: normalize_name(&common_name),
            common_name,
            ..Self::default()
        }
    }

    pub fn with_capital(mut self, capital: impl Into<String>) -> Self {
        self.capital = Some(capital.into());
        self
    }

    pub fn with_population(mut self, population: u64) -> Self {
        self.population = population;
        self
    }

    pub fn with_area(mut self, area: f64) -> Self {
        self.area = area;
        self
    }

    pub fn display_name(&self) -> &str {
        if self.common_name.is_empty() {
            &self.name
        } else {
            &self.common_name
        }
    }

    pub fn capital_or_unknown(&self) -> &str {
        self.capital.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn formatted_population(&self) -> String {
        format_population(self.population)
    }

    pub fn formatted_area(&self) -> String {
        format_area(self.area)
    }

    /// Fills cultural fields that are still unknown from `local`. Fields
    /// already known on `self` are kept.
    pub fn backfill_cultural(&mut self, local: &CountryRecord) {
        for (target, source) in [
            (&mut self.national_animal, &local.national_animal),
            (&mut self.national_flower, &local.national_flower),
            (&mut self.national_bird, &local.national_bird),
            (&mut self.national_anthem, &local.national_anthem),
        ] {
            if is_unknown(target) && !is_unknown(source) {
                *target = source.clone();
            }
        }
    }

    pub fn has_known(value: &str) -> bool {
        !is_unknown(value)
    }

    pub fn property(&self, property: CountryProperty) -> String {
        match property {
            CountryProperty::Capital => self.capital_or_unknown().to_string(),
            CountryProperty::NationalAnimal => self.national_animal.clone(),
            CountryProperty::NationalFlower => self.national_flower.clone(),
            CountryProperty::Population => self.formatted_population(),
            CountryProperty::Area => self.formatted_area(),
            CountryProperty::Region => self.region.clone().unwrap_or_else(unknown),
            CountryProperty::Languages => self.languages.join(", "),
            CountryProperty::Currencies => self.currencies.join(", "),
        }
    }

    /// Checks the raw numeric fields. Negative or non-finite areas are
    /// rejected rather than coerced.
    pub fn validate(&self) -> Result<(), CountryError> {
        if !self.area.is_finite() || self.area < 0.0 {
            return Err(CountryError::malformed(format!(
                "country '{}' has invalid area {}",
                self.display_name(),
                self.area
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CountryProperty {
    Capital,
    NationalAnimal,
    NationalFlower,
    Population,
    Area,
    Region,
    Languages,
    Currencies,
}

impl CountryProperty {
    pub fn parse(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "capital" => Some(Self::Capital),
            "nationalanimal" => Some(Self::NationalAnimal),
            "nationalflower" => Some(Self::NationalFlower),
            "population" => Some(Self::Population),
            "area" => Some(Self::Area),
            "region" => Some(Self::Region),
            "languages" => Some(Self::Languages),
            "currencies" => Some(Self::Currencies),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Capital => "capital",
            Self::NationalAnimal => "nationalanimal",
            Self::NationalFlower => "nationalflower",
            Self::Population => "population",
            Self::Area => "area",
            Self::Region => "region",
            Self::Languages => "languages",
            Self::Currencies => "currencies",
        }
    }
}

impl Display for CountryProperty {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for CountryProperty {
    type Err = CountryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value).ok_or_else(|| {
            CountryError::invalid_request(format!("unknown country property '{value}'"))
        })
    }
}
