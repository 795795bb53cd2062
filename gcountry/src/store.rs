//! Local fallback dataset keyed by normalized country name.
//!
//! ```rust
//! use gcountry::CountryStore;
//!
//! let store = CountryStore::bundled().expect("bundled dataset should parse");
//! let spain = store.lookup("  SPAIN ").expect("spain is bundled");
//! assert_eq!(spain.capital.as_deref(), Some("Madrid"));
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::record::normalize_name;
use crate::{CountryError, CountryRecord};

const BUNDLED_DATASET: &str = include_str!("../data/countries.json");

/// Lowercase country name to record. Built once, read-only afterwards.
pub type CountryIndex = HashMap<String, CountryRecord>;

#[derive(Debug, Clone, Default)]
pub struct CountryStore {
    index: CountryIndex,
}

impl CountryStore {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn bundled() -> Result<Self, CountryError> {
        Self::from_json_str(BUNDLED_DATASET)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CountryError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|error| {
            CountryError::data_load(format!(
                "failed to read country dataset '{}': {error}",
                path.display()
            ))
        })?;
        Self::from_json_str(&raw)
    }

    /// Loads `path`, or the bundled dataset when `path` is `None`. A missing
    /// or malformed dataset degrades to an empty store.
    pub fn load_or_empty(path: Option<&Path>) -> Self {
        let loaded = match path {
            Some(path) => Self::load(path),
            None => Self::bundled(),
        };

        match loaded {
            Ok(store) => {
                tracing::info!(countries = store.len(), "loaded local country dataset");
                store
            }
            Err(error) => {
                tracing::warn!(
                    error_kind = ?error.kind,
                    error = %error,
                    "local country dataset unavailable, continuing with empty fallback"
                );
                Self::empty()
            }
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CountryError> {
        let entries = serde_json::from_str::<BTreeMap<String, CountryRecord>>(raw).map_err(
            |error| CountryError::data_load(format!("failed to parse country dataset: {error}")),
        )?;

        let mut index = CountryIndex::with_capacity(entries.len());
        for (key, mut record) in entries {
            let key = normalize_name(&key);
            if key.is_empty() {
                return Err(CountryError::data_load("country dataset contains an empty key"));
            }

            record.validate().map_err(|error| CountryError::data_load(error.message))?;
            record.name = key.clone();
            if record.common_name.trim().is_empty() {
                record.common_name = title_case(&key);
            }

            if index.insert(key.clone(), record).is_some() {
                return Err(CountryError::data_load(format!(
                    "country dataset contains duplicate key '{key}'"
                )));
            }
        }

        Ok(Self { index })
    }

    pub fn from_records(records: impl IntoIterator<Item = CountryRecord>) -> Self {
        let index = records
            .into_iter()
            .map(|mut record| {
                record.name = normalize_name(&record.name);
                (record.name.clone(), record)
            })
            .collect();
        Self { index }
    }

    pub fn lookup(&self, name: &str) -> Option<&CountryRecord> {
        self.index.get(&normalize_name(name))
    }

    /// Display names of every country, sorted.
    pub fn names(&self) -> Vec<String> {
        self.names_matching(|_| true)
    }

    pub fn names_with_prefix(&self, prefix: &str) -> Vec<String> {
        let prefix = normalize_name(prefix);
        self.names_matching(|key| key.starts_with(&prefix))
    }

    fn names_matching(&self, mut predicate: impl FnMut(&str) -> bool) -> Vec<String> {
        let mut names = self
            .index
            .iter()
            .filter(|(key, _)| predicate(key.as_str()))
            .map(|(_, record)| record.display_name().to_string())
            .collect::<Vec<_>>();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

fn title_case(key: &str) -> String {
    key.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
