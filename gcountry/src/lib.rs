//! Country data resolution for globetalk.
//!
//! A [`CountryResolver`] prefers a remote [`CountrySource`] (the REST
//! Countries API by default), retries transient failures with exponential
//! backoff, caches what it finds, and falls back to the bundled
//! [`CountryStore`] whenever the remote path gives up.
//!
//! ```rust
//! use gcountry::prelude::*;
//!
//! let store = CountryStore::bundled().expect("bundled dataset");
//! let kenya = store.lookup("kenya").expect("kenya is bundled");
//! assert_eq!(kenya.property(CountryProperty::NationalAnimal), "Lion");
//! ```

pub mod adapters;
pub mod cache;
pub mod error;
pub mod prelude;
pub mod record;
pub mod resilience;
pub mod resolver;
pub mod source;
pub mod store;
pub mod wire;

pub use cache::{Cache, DEFAULT_NAME_LIST_TTL, DEFAULT_RECORD_TTL, TtlCache};
pub use error::{CountryError, CountryErrorKind};
pub use record::{
    CountryProperty, CountryRecord, PROPERTY_NOT_AVAILABLE, UNKNOWN, format_area,
    format_population, normalize_name,
};
pub use resilience::{
    NoopResolverHooks, ResolverOperationHooks, RetryPolicy, execute_with_retry,
};
pub use resolver::{COUNTRY_NOT_FOUND, CountryLookup, CountryResolver, CountryResolverBuilder};
pub use source::{CountrySource, OfflineCountrySource};
#[cfg(any(test, feature = "test-util"))]
pub use source::ScriptedCountrySource;
pub use store::{CountryIndex, CountryStore};

#[cfg(feature = "rest-countries")]
pub use adapters::rest_countries::RestCountriesSource;
