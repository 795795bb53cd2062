//! Common `gcountry` imports for downstream crates.

pub use crate::{
    Cache, CountryError, CountryErrorKind, CountryLookup, CountryProperty, CountryRecord,
    CountryResolver, CountrySource, CountryStore, NoopResolverHooks, ResolverOperationHooks,
    RetryPolicy, TtlCache, format_area, format_population,
};
pub use gcommon::BoxFuture;
