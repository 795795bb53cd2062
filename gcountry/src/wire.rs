//! Typed decoding of REST Countries payloads into country records.
//!
//! Numeric fields are strict: population must be a JSON unsigned integer and
//! area a finite, non-negative JSON number. Anything else rejects the whole
//! payload as malformed instead of being coerced.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::record::normalize_name;
use crate::{CountryError, CountryRecord};

pub fn decode_country(body: &str, requested: &str) -> Result<CountryRecord, CountryError> {
    let countries = serde_json::from_str::<Vec<ApiCountry>>(body)
        .map_err(|error| CountryError::malformed(format!("invalid country payload: {error}")))?;

    let Some(country) = countries.into_iter().next() else {
        return Err(CountryError::not_found(format!(
            "remote source returned no country for '{requested}'"
        )));
    };

    let record = country.into_record(requested);
    record.validate()?;
    Ok(record)
}

pub fn decode_country_names(body: &str) -> Result<Vec<String>, CountryError> {
    let entries = serde_json::from_str::<Vec<ApiCountryName>>(body).map_err(|error| {
        CountryError::malformed(format!("invalid country list payload: {error}"))
    })?;

    let mut names = entries
        .into_iter()
        .map(|entry| entry.name.common.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect::<Vec<_>>();
    names.sort();
    names.dedup();
    Ok(names)
}

#[derive(Debug, Deserialize)]
struct ApiName {
    common: String,
    #[serde(default)]
    official: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiCountryName {
    name: ApiName,
}

#[derive(Debug, Default, Deserialize)]
struct ApiCurrency {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiImageLinks {
    #[serde(default)]
    png: Option<String>,
    #[serde(default)]
    svg: Option<String>,
}

impl ApiImageLinks {
    fn preferred(self) -> Option<String> {
        self.png.or(self.svg)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCountry {
    name: ApiName,
    #[serde(default)]
    capital: Vec<String>,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    subregion: Option<String>,
    #[serde(default)]
    languages: BTreeMap<String, String>,
    #[serde(default)]
    currencies: BTreeMap<String, ApiCurrency>,
    #[serde(default)]
    population: Option<u64>,
    #[serde(default)]
    area: Option<f64>,
    #[serde(default)]
    flags: Option<ApiImageLinks>,
    #[serde(default)]
    coat_of_arms: Option<ApiImageLinks>,
    #[serde(default)]
    borders: Vec<String>,
    #[serde(default)]
    timezones: Vec<String>,
    #[serde(default)]
    continents: Vec<String>,
    #[serde(default)]
    independent: Option<bool>,
    #[serde(default)]
    un_member: bool,
}

impl ApiCountry {
    fn into_record(self, requested: &str) -> CountryRecord {
        let name = match normalize_name(requested) {
            key if key.is_empty() => normalize_name(&self.name.common),
            key => key,
        };

        CountryRecord {
            name,
            common_name: self.name.common,
            official_name: self.name.official,
            capital: self.capital.into_iter().next(),
            region: self.region.filter(|value| !value.is_empty()),
            subregion: self.subregion.filter(|value| !value.is_empty()),
            languages: self.languages.into_values().collect(),
            currencies: self
                .currencies
                .into_iter()
                .map(|(code, currency)| currency.name.unwrap_or(code))
                .collect(),
            population: self.population.unwrap_or_default(),
            area: self.area.unwrap_or_default(),
            flag_url: self.flags.and_then(ApiImageLinks::preferred),
            coat_of_arms_url: self.coat_of_arms.and_then(ApiImageLinks::preferred),
            borders: self.borders,
            timezones: self.timezones,
            continents: self.continents,
            independent: self.independent,
            un_member: self.un_member,
            ..CountryRecord::default()
        }
    }
}
