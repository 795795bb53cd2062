//! Two-tier country resolution: remote source first, local dataset second.
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use gcountry::{CountryResolver, CountryStore, OfflineCountrySource, RetryPolicy};
//!
//! let store = Arc::new(CountryStore::bundled().expect("bundled dataset"));
//! let resolver = CountryResolver::builder(Arc::new(OfflineCountrySource), store)
//!     .retry_policy(RetryPolicy::new(3).with_initial_backoff(Duration::from_millis(500)))
//!     .record_ttl(Duration::from_secs(60 * 60))
//!     .build();
//!
//! assert_eq!(resolver.retry_policy().max_attempts, 3);
//! assert!(resolver.store().lookup("spain").is_some());
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_timer::Delay;
use gcommon::BoxFuture;

use crate::cache::{Cache, DEFAULT_NAME_LIST_TTL, DEFAULT_RECORD_TTL, TtlCache};
use crate::record::{PROPERTY_NOT_AVAILABLE, normalize_name};
use crate::resilience::{NoopResolverHooks, ResolverOperationHooks, RetryPolicy, execute_with_retry};
use crate::source::CountrySource;
use crate::store::CountryStore;
use crate::{CountryError, CountryProperty, CountryRecord};

pub const COUNTRY_NOT_FOUND: &str = "Country not found";

const FETCH_COUNTRY: &str = "fetch_country";
const LIST_COUNTRY_NAMES: &str = "list_country_names";
const ALL_NAMES_KEY: &str = "*";

/// Country operations the dialogue layer depends on.
pub trait CountryLookup: Send + Sync {
    fn resolve<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Option<CountryRecord>>;

    fn list_by_prefix<'a>(&'a self, prefix: &'a str) -> BoxFuture<'a, Vec<String>>;

    fn list_all<'a>(&'a self) -> BoxFuture<'a, Vec<String>>;

    fn get_property<'a>(&'a self, name: &'a str, key: &'a str) -> BoxFuture<'a, String>;
}

pub struct CountryResolver {
    source: Arc<dyn CountrySource>,
    store: Arc<CountryStore>,
    record_cache: Arc<dyn Cache<CountryRecord>>,
    name_cache: Arc<dyn Cache<Vec<String>>>,
    retry_policy: RetryPolicy,
    hooks: Arc<dyn ResolverOperationHooks>,
}

impl std::fmt::Debug for CountryResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CountryResolver")
            .field("source", &self.source)
            .field("local_countries", &self.store.len())
            .field("retry_policy", &self.retry_policy)
            .finish_non_exhaustive()
    }
}

impl CountryResolver {
    pub fn builder(
        source: Arc<dyn CountrySource>,
        store: Arc<CountryStore>,
    ) -> CountryResolverBuilder {
        CountryResolverBuilder::new(source, store)
    }

    pub fn store(&self) -> &CountryStore {
        &self.store
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Resolves one country. Remote data wins for factual fields; unknown
    /// cultural fields are filled from the local dataset. Any remote failure
    /// falls back to the local dataset. Only found records are cached.
    pub async fn resolve(&self, name: &str) -> Option<CountryRecord> {
        let key = normalize_name(name);
        if key.is_empty() {
            return None;
        }

        if let Some(record) = self.record_cache.get(&key) {
            self.hooks.on_cache_hit(FETCH_COUNTRY, &key);
            return Some(record);
        }

        let resolved = match self.fetch_remote(&key).await {
            Ok(mut record) => {
                if let Some(local) = self.store.lookup(&key) {
                    record.backfill_cultural(local);
                }
                Some(record)
            }
            Err(error) => {
                self.fallback(FETCH_COUNTRY, &key, &error);
                self.store.lookup(&key).cloned()
            }
        };

        if let Some(record) = &resolved {
            self.record_cache.put(&key, record.clone());
        }
        resolved
    }

    /// Display names starting with `prefix`, case-insensitively, sorted.
    pub async fn list_by_prefix(&self, prefix: &str) -> Vec<String> {
        let prefix = normalize_name(prefix);

        match self.remote_names().await {
            Ok(names) => {
                let matches = names
                    .into_iter()
                    .filter(|name| name.to_lowercase().starts_with(&prefix))
                    .collect::<Vec<_>>();
                if matches.is_empty() {
                    self.store.names_with_prefix(&prefix)
                } else {
                    matches
                }
            }
            Err(error) => {
                self.fallback(LIST_COUNTRY_NAMES, &prefix, &error);
                self.store.names_with_prefix(&prefix)
            }
        }
    }

    pub async fn list_all(&self) -> Vec<String> {
        match self.remote_names().await {
            Ok(names) => names,
            Err(error) => {
                self.fallback(LIST_COUNTRY_NAMES, ALL_NAMES_KEY, &error);
                self.store.names()
            }
        }
    }

    pub async fn get_property(&self, name: &str, key: &str) -> String {
        let Some(record) = self.resolve(name).await else {
            return COUNTRY_NOT_FOUND.to_string();
        };

        match CountryProperty::parse(key) {
            Some(property) => record.property(property),
            None => PROPERTY_NOT_AVAILABLE.to_string(),
        }
    }

    async fn fetch_remote(&self, key: &str) -> Result<CountryRecord, CountryError> {
        execute_with_retry(
            FETCH_COUNTRY,
            key,
            &self.retry_policy,
            self.hooks.as_ref(),
            |_| self.source.fetch_country(key),
            Delay::new,
        )
        .await
    }

    /// Listing is never retried. Only remote lists are cached.
    async fn remote_names(&self) -> Result<Vec<String>, CountryError> {
        if let Some(names) = self.name_cache.get(ALL_NAMES_KEY) {
            self.hooks.on_cache_hit(LIST_COUNTRY_NAMES, ALL_NAMES_KEY);
            return Ok(names);
        }

        let names = execute_with_retry(
            LIST_COUNTRY_NAMES,
            ALL_NAMES_KEY,
            &RetryPolicy::no_retry(),
            self.hooks.as_ref(),
            |_| self.source.list_country_names(),
            Delay::new,
        )
        .await?;

        if names.is_empty() {
            return Err(CountryError::not_found("remote source returned no countries"));
        }

        self.name_cache.put(ALL_NAMES_KEY, names.clone());
        Ok(names)
    }

    fn fallback(&self, operation: &str, target: &str, error: &CountryError) {
        tracing::warn!(
            operation,
            target,
            error_kind = ?error.kind,
            error = %error,
            "remote country source failed, using local dataset"
        );
        self.hooks.on_fallback(operation, target, error);
    }
}

impl CountryLookup for CountryResolver {
    fn resolve<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Option<CountryRecord>> {
        Box::pin(CountryResolver::resolve(self, name))
    }

    fn list_by_prefix<'a>(&'a self, prefix: &'a str) -> BoxFuture<'a, Vec<String>> {
        Box::pin(CountryResolver::list_by_prefix(self, prefix))
    }

    fn list_all<'a>(&'a self) -> BoxFuture<'a, Vec<String>> {
        Box::pin(CountryResolver::list_all(self))
    }

    fn get_property<'a>(&'a self, name: &'a str, key: &'a str) -> BoxFuture<'a, String> {
        Box::pin(CountryResolver::get_property(self, name, key))
    }
}

pub struct CountryResolverBuilder {
    source: Arc<dyn CountrySource>,
    store: Arc<CountryStore>,
    record_cache: Option<Arc<dyn Cache<CountryRecord>>>,
    name_cache: Option<Arc<dyn Cache<Vec<String>>>>,
    retry_policy: RetryPolicy,
    hooks: Arc<dyn ResolverOperationHooks>,
}

impl CountryResolverBuilder {
    pub fn new(source: Arc<dyn CountrySource>, store: Arc<CountryStore>) -> Self {
        Self {
            source,
            store,
            record_cache: None,
            name_cache: None,
            retry_policy: RetryPolicy::default(),
            hooks: Arc::new(NoopResolverHooks),
        }
    }

    pub fn record_cache(mut self, cache: Arc<dyn Cache<CountryRecord>>) -> Self {
        self.record_cache = Some(cache);
        self
    }

    pub fn record_ttl(self, ttl: Duration) -> Self {
        self.record_cache(Arc::new(TtlCache::new(ttl)))
    }

    pub fn name_cache(mut self, cache: Arc<dyn Cache<Vec<String>>>) -> Self {
        self.name_cache = Some(cache);
        self
    }

    pub fn name_list_ttl(self, ttl: Duration) -> Self {
        self.name_cache(Arc::new(TtlCache::new(ttl)))
    }

    pub fn retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn ResolverOperationHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn build(self) -> CountryResolver {
        CountryResolver {
            source: self.source,
            store: self.store,
            record_cache: self
                .record_cache
                .unwrap_or_else(|| Arc::new(TtlCache::new(DEFAULT_RECORD_TTL))),
            name_cache: self
                .name_cache
                .unwrap_or_else(|| Arc::new(TtlCache::new(DEFAULT_NAME_LIST_TTL))),
            retry_policy: self.retry_policy,
            hooks: self.hooks,
        }
    }
}
