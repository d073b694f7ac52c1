//! Validation cache.
//!
//! Validation outcomes are stored under the fingerprint of the schema and of the parsed document,
//! so a document seen before skips the structural validation. Valid and invalid outcomes are both
//! stored. Documents that fail to parse never reach the validation phase and are never stored.

use std::num::NonZeroUsize;
use std::ops::ControlFlow;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;
use tower::BoxError;

use crate::cache::CacheStorage;
use crate::plugin::AfterHook;
use crate::plugin::HookFlow;
use crate::plugin::OnValidateDone;
use crate::plugin::Plugin;
use crate::plugin::PluginInit;
use crate::plugin::ValidateParams;
use crate::plugin::ValidationOutcome;
use crate::spec::QueryHash;
use crate::spec::SchemaHash;

pub(crate) const NAME: &str = "validation_cache";

type Fingerprint = (SchemaHash, QueryHash);

/// Validation cache configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    /// Maximum number of stored outcomes. Unbounded when absent, least recently used first
    /// evicted otherwise.
    pub capacity: Option<NonZeroUsize>,
}

/// Skips validation of documents whose outcome is already known.
#[derive(Debug)]
pub struct ValidationCache {
    storage: CacheStorage<Fingerprint, ValidationOutcome>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ValidationCache {
    pub(crate) fn with_storage(storage: CacheStorage<Fingerprint, ValidationOutcome>) -> Self {
        Self {
            storage,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Lookups answered from the cache.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Lookups that required a validation.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Number of stored outcomes.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Whether nothing is stored yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl Plugin for ValidationCache {
    type Config = Config;

    async fn new(init: PluginInit<Self::Config>) -> Result<Self, BoxError> {
        Ok(Self::with_storage(CacheStorage::new(init.config.capacity)))
    }

    fn name(&self) -> &'static str {
        NAME
    }

    fn on_validate(&self, params: &mut ValidateParams<'_>) -> HookFlow<Option<OnValidateDone>> {
        // an earlier plugin already decided
        if params.result().is_some() {
            return ControlFlow::Continue(None);
        }
        let key = (params.schema.id().clone(), params.document.hash().clone());
        if let Some(outcome) = self.storage.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(document = %key.1, "validation cache hit");
            params.set_result(outcome);
            return ControlFlow::Continue(None);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let storage = self.storage.clone();
        ControlFlow::Continue(Some(AfterHook::new(move |outcome: &ValidationOutcome| {
            storage.insert(key, outcome.clone());
            Ok(())
        })))
    }
}
