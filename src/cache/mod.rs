//! Cache module for keeping fetched health data available offline
//!
//! This module provides an offline store that persists fetch results per
//! category in a single serialized blob, bounded by record count and checked
//! for age on read. The blob is written through a pluggable key-value
//! storage so the store can run over files or memory.

mod manager;
mod storage;

pub use manager::{
    CacheConfig, CacheMetadata, CacheRecord, CacheSnapshot, FetchMetadata, OfflineCache,
    RetrieveOptions, DEFAULT_MAX_AGE_DAYS, DEFAULT_MAX_ITEMS, DEFAULT_STORAGE_KEY,
};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
