//! Remote country data source contract.

#[cfg(any(test, feature = "test-util"))]
use std::sync::Mutex;

use gcommon::BoxFuture;

use crate::{CountryError, CountryErrorKind, CountryRecord};

pub trait CountrySource: Send + Sync + std::fmt::Debug {
    /// Fetches one country by its normalized name.
    fn fetch_country<'a>(&'a self, name: &'a str)
    -> BoxFuture<'a, Result<CountryRecord, CountryError>>;

    /// Lists the display names of every country the source knows.
    fn list_country_names<'a>(&'a self) -> BoxFuture<'a, Result<Vec<String>, CountryError>>;
}

/// Source that never reaches a remote service, leaving every lookup to the
/// local dataset. Its failures are not retryable.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineCountrySource;

impl CountrySource for OfflineCountrySource {
    fn fetch_country<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<CountryRecord, CountryError>> {
        Box::pin(async move {
            Err(CountryError::new(
                CountryErrorKind::Unavailable,
                format!("offline source cannot fetch '{name}'"),
                false,
            ))
        })
    }

    fn list_country_names<'a>(&'a self) -> BoxFuture<'a, Result<Vec<String>, CountryError>> {
        Box::pin(async {
            Err(CountryError::new(
                CountryErrorKind::Unavailable,
                "offline source has no country list",
                false,
            ))
        })
    }
}

/// Replays scripted responses in order, then repeats the last one. Records
/// every requested name. Only built for tests or with the `test-util`
/// feature.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug)]
pub struct ScriptedCountrySource {
    fetches: Mutex<Vec<Result<CountryRecord, CountryError>>>,
    names: Result<Vec<String>, CountryError>,
    requested: Mutex<Vec<String>>,
}

#[cfg(any(test, feature = "test-util"))]
impl ScriptedCountrySource {
    pub fn new(fetches: Vec<Result<CountryRecord, CountryError>>) -> Self {
        Self {
            fetches: Mutex::new(fetches),
            names: Err(CountryError::unavailable("no scripted country list")),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn with_names(mut self, names: Result<Vec<String>, CountryError>) -> Self {
        self.names = names;
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested
            .lock()
            .map(|requested| requested.clone())
            .unwrap_or_default()
    }
}

#[cfg(any(test, feature = "test-util"))]
impl CountrySource for ScriptedCountrySource {
    fn fetch_country<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<CountryRecord, CountryError>> {
        Box::pin(async move {
            if let Ok(mut requested) = self.requested.lock() {
                requested.push(name.to_string());
            }

            let mut fetches = self
                .fetches
                .lock()
                .map_err(|_| CountryError::unavailable("scripted source lock poisoned"))?;

            match fetches.len() {
                0 => Err(CountryError::not_found(format!("no scripted country for '{name}'"))),
                1 => fetches[0].clone(),
                _ => fetches.remove(0),
            }
        })
    }

    fn list_country_names<'a>(&'a self) -> BoxFuture<'a, Result<Vec<String>, CountryError>> {
        Box::pin(async move { self.names.clone() })
    }
}
