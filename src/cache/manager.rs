//! Offline cache store for fetched health data
//!
//! Keeps a newest-first log of fetch results per category inside a single
//! JSON blob, bounded by record count and checked for age at read time.
//! Every public operation is best-effort: failures are logged and turned into
//! `false`, `None` or an empty snapshot so a broken cache never blocks a live
//! fetch.

use std::collections::BTreeMap;
use std::io;

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, error, warn};

use super::storage::KeyValueStorage;

/// Storage key the cache blob lives under unless configured otherwise
pub const DEFAULT_STORAGE_KEY: &str = "vital_health_offline_data";

/// Records kept per category unless configured otherwise
pub const DEFAULT_MAX_ITEMS: usize = 100;

/// Age after which a record is rejected on read unless configured otherwise
pub const DEFAULT_MAX_AGE_DAYS: i64 = 30;

/// Metadata key reserved for the store timestamp
const STORED_AT_KEY: &str = "storedAt";

/// Metadata key holding the typed source list
const SOURCES_KEY: &str = "sources";

/// Errors from loading or saving the cache blob
///
/// Never escapes the public API; see the module docs.
#[derive(Debug, Error)]
enum CacheError {
    #[error("Storage error: {0}")]
    Storage(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Retention settings for an `OfflineCache`
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Key the whole cache blob is persisted under
    pub storage_key: String,
    /// Records older than this are rejected on read
    pub max_age: Duration,
    /// Maximum records retained per category
    pub max_items: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            max_age: Duration::days(DEFAULT_MAX_AGE_DAYS),
            max_items: DEFAULT_MAX_ITEMS,
        }
    }
}

/// Caller-supplied metadata attached to a stored record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchMetadata {
    /// Source identifiers that contributed the data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
    /// Any other caller-defined fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FetchMetadata {
    /// Creates metadata naming the sources that produced the data
    pub fn from_sources<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sources: Some(sources.into_iter().map(Into::into).collect()),
            extra: Map::new(),
        }
    }

    /// Adds a caller-defined field
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Metadata persisted with each record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheMetadata {
    /// When the record was stored; always assigned by the cache
    #[serde(rename = "storedAt")]
    pub stored_at: DateTime<Utc>,
    /// Caller-supplied fields, unchanged
    #[serde(flatten)]
    pub fetch: FetchMetadata,
}

/// One stored fetch result
///
/// Records are immutable once stored; a newer record for the same category
/// supersedes older ones by being prepended to the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Category the record belongs to
    pub category: String,
    /// Opaque payload as returned by a source
    pub data: Value,
    /// Store timestamp and caller metadata
    pub metadata: CacheMetadata,
}

impl CacheRecord {
    /// Time elapsed since the record was stored
    pub fn age(&self) -> Duration {
        Utc::now() - self.metadata.stored_at
    }

    /// Whether the record is older than `max_age`
    pub fn is_stale(&self, max_age: Duration) -> bool {
        self.age() > max_age
    }

    /// Source identifiers recorded for this result, if any
    pub fn sources(&self) -> &[String] {
        self.metadata.fetch.sources.as_deref().unwrap_or(&[])
    }

    /// Whether `source` contributed to this record
    pub fn has_source(&self, source: &str) -> bool {
        self.sources().iter().any(|s| s == source)
    }

    /// Decodes the payload into a concrete type
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.data)
    }
}

/// Decoded cache contents: category to newest-first record log
pub type CacheSnapshot = BTreeMap<String, Vec<CacheRecord>>;

/// Selection options for `OfflineCache::retrieve_data`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrieveOptions {
    /// Prefer the newest record this source contributed to
    pub source: Option<String>,
    /// Return the selected record even if it is older than `max_age`
    pub ignore_age: bool,
}

impl RetrieveOptions {
    /// Options preferring records from `source`
    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            ignore_age: false,
        }
    }

    /// Returns these options with the age check disabled
    pub fn ignoring_age(mut self) -> Self {
        self.ignore_age = true;
        self
    }
}

/// Category-partitioned, age-bounded offline cache
///
/// The whole cache is one JSON object under `config.storage_key`, keyed by
/// category, each value a newest-first array of records. It is reloaded on
/// every operation and rewritten in full on every write.
///
/// A load-modify-save is not atomic: callers sharing the same storage from
/// several threads or processes get last-writer-wins and should serialize
/// access themselves if they need more.
#[derive(Debug)]
pub struct OfflineCache<S> {
    storage: S,
    config: CacheConfig,
}

impl<S: KeyValueStorage> OfflineCache<S> {
    /// Creates a cache over `storage` with the given retention settings
    pub fn new(storage: S, config: CacheConfig) -> Self {
        Self { storage, config }
    }

    /// Creates a cache over `storage` with default retention settings
    pub fn with_defaults(storage: S) -> Self {
        Self::new(storage, CacheConfig::default())
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn load(&self) -> Result<CacheSnapshot, CacheError> {
        match self.storage.get(&self.config.storage_key)? {
            Some(contents) => Ok(serde_json::from_str(&contents)?),
            None => Ok(CacheSnapshot::new()),
        }
    }

    fn save(&self, snapshot: &CacheSnapshot) -> Result<(), CacheError> {
        let contents = serde_json::to_string(snapshot)?;
        self.storage.set(&self.config.storage_key, &contents)?;
        Ok(())
    }

    /// Stores a fetch result as the newest record for `category`
    ///
    /// `metadata.storedAt` is always set to the current time, replacing any
    /// caller-supplied value. A `"sources"` entry in `metadata.extra` is merged
    /// into `metadata.sources` when it is a list of strings and dropped
    /// otherwise, so the persisted blob always decodes. The category log is
    /// truncated to `max_items` right after the insert.
    ///
    /// # Returns
    /// * `true` if the cache was written
    /// * `false` if persistence failed (the error is logged)
    pub fn store_data(&self, category: &str, data: Value, mut metadata: FetchMetadata) -> bool {
        metadata.extra.remove(STORED_AT_KEY);
        if let Some(extra_sources) = metadata.extra.remove(SOURCES_KEY) {
            match serde_json::from_value::<Vec<String>>(extra_sources) {
                Ok(extra_sources) => {
                    let sources = metadata.sources.get_or_insert_with(Vec::new);
                    for source in extra_sources {
                        if !sources.contains(&source) {
                            sources.push(source);
                        }
                    }
                }
                Err(e) => {
                    warn!(category, error = %e, "Dropping metadata sources that are not a list of strings");
                }
            }
        }

        let record = CacheRecord {
            category: category.to_string(),
            data,
            metadata: CacheMetadata {
                stored_at: Utc::now(),
                fetch: metadata,
            },
        };

        let mut snapshot = self.get_storage();
        let log = snapshot.entry(category.to_string()).or_default();
        log.insert(0, record);
        log.truncate(self.config.max_items);
        let retained = log.len();

        match self.save(&snapshot) {
            Ok(()) => {
                debug!(category, retained, "Stored cache record");
                true
            }
            Err(e) => {
                error!(category, error = %e, "Failed to store cache record");
                false
            }
        }
    }

    /// Retrieves the best cached record for `category`
    ///
    /// Selects the newest record, or the newest one listing `options.source`
    /// among its sources when such a record exists. The selected record is
    /// then checked against `max_age` unless `options.ignore_age` is set.
    /// A stale source match is a miss; it does not fall back to the newest record.
    ///
    /// # Returns
    /// * `Some(CacheRecord)` for a fresh (or age-exempt) selection
    /// * `None` if the category is empty, the selection is stale, or the
    ///   cache could not be read
    pub fn retrieve_data(&self, category: &str, options: &RetrieveOptions) -> Option<CacheRecord> {
        let mut snapshot = match self.load() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(category, error = %e, "Failed to read offline cache");
                return None;
            }
        };

        let mut log = snapshot.remove(category)?;
        if log.is_empty() {
            return None;
        }

        let index = options
            .source
            .as_deref()
            .and_then(|source| log.iter().position(|r| r.has_source(source)))
            .unwrap_or(0);
        let record = log.swap_remove(index);

        if !options.ignore_age && record.is_stale(self.config.max_age) {
            warn!(
                category,
                age_secs = record.age().num_seconds(),
                "Cached record is older than max age"
            );
            return None;
        }

        debug!(category, stored_at = %record.metadata.stored_at, "Cache hit");
        Some(record)
    }

    /// Returns the full decoded cache
    ///
    /// An absent, unreadable or corrupted blob yields an empty snapshot.
    pub fn get_storage(&self) -> CacheSnapshot {
        self.load().unwrap_or_else(|e| {
            error!(error = %e, "Failed to load offline cache; treating as empty");
            CacheSnapshot::new()
        })
    }

    /// Categories holding at least one record, sorted
    pub fn cached_categories(&self) -> Vec<String> {
        self.get_storage()
            .into_iter()
            .filter(|(_, log)| !log.is_empty())
            .map(|(category, _)| category)
            .collect()
    }

    /// Removes the entire cache blob
    ///
    /// Returns `false` if the storage backend refused the removal.
    pub fn clear_storage(&self) -> bool {
        match self.storage.remove(&self.config.storage_key) {
            Ok(()) => {
                debug!("Cleared offline cache");
                true
            }
            Err(e) => {
                error!(error = %e, "Failed to clear offline cache");
                false
            }
        }
    }

    /// Removes every record for `category`, leaving other categories alone
    ///
    /// Returns `false` if the rewritten cache could not be persisted.
    pub fn clear_category(&self, category: &str) -> bool {
        let mut snapshot = self.get_storage();
        snapshot.remove(category);

        match self.save(&snapshot) {
            Ok(()) => {
                debug!(category, "Cleared cache category");
                true
            }
            Err(e) => {
                error!(category, error = %e, "Failed to clear cache category");
                false
            }
        }
    }
}
