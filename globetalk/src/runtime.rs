//! Runtime wiring: country resolution, transcript memory, and the chat service.

use std::sync::Arc;

use crate::{
    ChatService, CountryResolver, CountrySource, CountryStore, MemoryBackend,
    MemoryTranscriptStore, ObservabilityHooks, RestCountriesSource, RuntimeConfig, RuntimeError,
    SafeDialogueHooks, SafeResolverHooks, create_memory_backend,
};

const USER_AGENT: &str = concat!("globetalk/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct RuntimeBundle {
    pub config: RuntimeConfig,
    pub resolver: Arc<CountryResolver>,
    pub memory: Arc<dyn MemoryBackend>,
    pub chat: ChatService,
}

/// Wires the REST Countries source described by `config`.
pub fn build_runtime(config: RuntimeConfig) -> Result<RuntimeBundle, RuntimeError> {
    let source = RestCountriesSource::with_client_options(config.api_timeout, USER_AGENT)
        .map_err(|error| RuntimeError::config(format!("failed to build HTTP client: {error}")))?
        .with_base_url(config.api_base_url.clone());

    build_runtime_with_source(config, Arc::new(source))
}

pub fn build_runtime_with_source(
    config: RuntimeConfig,
    source: Arc<dyn CountrySource>,
) -> Result<RuntimeBundle, RuntimeError> {
    let store = Arc::new(CountryStore::load_or_empty(config.dataset_path.as_deref()));
    let hooks = ObservabilityHooks::new(config.metrics_enabled);

    let resolver = Arc::new(
        CountryResolver::builder(source, store)
            .retry_policy(config.retry_policy())
            .record_ttl(config.cache_ttl)
            .name_list_ttl(config.country_list_ttl)
            .hooks(Arc::new(SafeResolverHooks::new(hooks)))
            .build(),
    );

    let memory = create_memory_backend(config.memory.clone())?;
    let mut chat = ChatService::builder(resolver.clone())
        .store(Arc::new(MemoryTranscriptStore::new(Arc::clone(&memory))))
        .hooks(Arc::new(SafeDialogueHooks::new(hooks)));
    if !config.session_idle_timeout.is_zero() {
        chat = chat.idle_timeout(config.session_idle_timeout);
    }
    let chat = chat.build();

    tracing::info!(
        api_base_url = %config.api_base_url,
        retry_attempts = config.retry_attempts,
        memory = ?config.memory,
        session_idle_secs = config.session_idle_timeout.as_secs(),
        "globetalk runtime ready"
    );

    Ok(RuntimeBundle {
        config,
        resolver,
        memory,
        chat,
    })
}
