//! Source fallback with offline cache
//!
//! Walks the router's source list for a category until one provider answers,
//! caches the answer, and falls back to the offline cache when every provider
//! fails.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::{CacheRecord, FetchMetadata, KeyValueStorage, OfflineCache, RetrieveOptions};
use crate::data::{sources_for_category, RouterError, SourceDescriptor, SourceId};

/// Errors a provider can report for a single fetch
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider could not be reached or refused the request
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    /// The provider answered with something unusable
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Something that can execute a source descriptor against its provider
pub trait SourceProvider {
    fn fetch(&self, descriptor: &SourceDescriptor) -> Result<Value, ProviderError>;
}

/// A provider call that failed during a fallback walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedAttempt {
    pub source: SourceId,
    pub method: &'static str,
    pub error: String,
}

/// Where a fetch result came from
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// A provider answered
    Live {
        descriptor: SourceDescriptor,
        data: Value,
        /// Whether the answer was written to the offline cache
        cached: bool,
    },
    /// Every provider failed; this is the freshest usable cached record
    Cached(CacheRecord),
}

impl FetchOutcome {
    /// The payload, wherever it came from
    pub fn data(&self) -> &Value {
        match self {
            FetchOutcome::Live { data, .. } => data,
            FetchOutcome::Cached(record) => &record.data,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, FetchOutcome::Live { .. })
    }
}

/// Errors from `fetch_category`
#[derive(Debug, Error)]
pub enum FetchError {
    /// The category has no routing entry
    #[error(transparent)]
    Router(#[from] RouterError),

    /// No provider answered and the cache had nothing usable
    #[error("No data available for '{category}' ({} sources tried, cache empty or stale)", .attempts.len())]
    Unavailable {
        category: String,
        attempts: Vec<FailedAttempt>,
    },
}

/// Fetches data for a category, falling back across sources and then the cache
///
/// # Behavior
/// - Tries the router's primary sources in order, then its secondary sources
/// - Caches the first successful answer, tagged with its source and method
/// - If every source fails, returns the newest fresh cached record
/// - An unknown category fails immediately without touching any provider
pub fn fetch_category<S, P>(
    cache: &OfflineCache<S>,
    provider: &P,
    category: &str,
    primary_compromised: bool,
) -> Result<FetchOutcome, FetchError>
where
    S: KeyValueStorage,
    P: SourceProvider + ?Sized,
{
    let sources = sources_for_category(category, primary_compromised)?;
    let mut attempts = Vec::new();

    for descriptor in sources.in_priority_order() {
        match provider.fetch(descriptor) {
            Ok(data) => {
                debug!(category, source = %descriptor.source, method = descriptor.method, "Source answered");
                let metadata = FetchMetadata::from_sources([descriptor.source.as_str()])
                    .with_field("method", descriptor.method);
                let cached = cache.store_data(category, data.clone(), metadata);
                return Ok(FetchOutcome::Live {
                    descriptor: *descriptor,
                    data,
                    cached,
                });
            }
            Err(e) => {
                warn!(category, source = %descriptor.source, method = descriptor.method, error = %e, "Source failed");
                attempts.push(FailedAttempt {
                    source: descriptor.source,
                    method: descriptor.method,
                    error: e.to_string(),
                });
            }
        }
    }

    match cache.retrieve_data(category, &RetrieveOptions::default()) {
        Some(record) => {
            info!(category, failed = attempts.len(), "All sources failed; serving cached data");
            Ok(FetchOutcome::Cached(record))
        }
        None => Err(FetchError::Unavailable {
            category: category.to_string(),
            attempts,
        }),
    }
}
