//! Command-line interface for Vital Health Vision's data core
//!
//! This module handles parsing of CLI arguments using clap and runs each
//! subcommand against the category router and an offline cache.

use std::io::{self, Write};
use std::path::PathBuf;

use chrono::Duration;
use clap::{Parser, Subcommand};
use serde_json::Value;
use thiserror::Error;

use crate::cache::{FetchMetadata, KeyValueStorage, OfflineCache, RetrieveOptions};
use crate::config::{ConfigError, Settings};
use crate::data::{available_categories, sources_for_category, RouterError};

/// Error types for CLI commands
#[derive(Debug, Error)]
pub enum CliError {
    /// The data argument is not valid JSON
    #[error("Invalid JSON data: {0}")]
    InvalidJson(String),

    /// The category is not in the routing table
    #[error(transparent)]
    UnknownCategory(#[from] RouterError),

    /// Nothing usable is cached for the category
    #[error("No cached data for '{0}'")]
    NotFound(String),

    /// The offline cache could not be written
    #[error("Failed to update offline cache for '{0}'")]
    CacheWriteFailed(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The max age flag does not fit in a duration
    #[error("--max-age-days out of range: {0}")]
    InvalidMaxAge(i64),

    /// No data directory was given and none could be determined
    #[error("Could not determine a data directory; pass --data-dir")]
    NoDataDir,

    #[error("Failed to write output: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to serialize output: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Vital Health Vision - source routing and offline cache for health datasets
#[derive(Parser, Debug)]
#[command(name = "vitalvision")]
#[command(about = "Source routing and offline cache for public-health datasets")]
#[command(version)]
pub struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the offline cache
    #[arg(long, value_name = "DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Key the cache blob is stored under
    #[arg(long, value_name = "KEY", global = true)]
    pub storage_key: Option<String>,

    /// Maximum age of a usable cached record, in days
    #[arg(long, value_name = "DAYS", global = true)]
    pub max_age_days: Option<i64>,

    /// Maximum records kept per category
    #[arg(long, value_name = "N", global = true)]
    pub max_items: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List configured data categories
    Categories,

    /// Show the ordered sources to query for a category
    Sources {
        category: String,

        /// Treat the category's primary sources as compromised
        #[arg(long)]
        compromised: bool,
    },

    /// Store a fetch result in the offline cache
    ///
    /// Examples:
    ///   vitalvision store obesity '{"rate": 41.9}' --source nhanes
    Store {
        category: String,

        /// JSON payload to cache
        data: String,

        /// Source that produced the data (repeatable)
        #[arg(long = "source", value_name = "ID")]
        sources: Vec<String>,
    },

    /// Print the cached record for a category
    Get {
        category: String,

        /// Prefer the newest record from this source
        #[arg(long, value_name = "ID")]
        source: Option<String>,

        /// Return the record even if it is older than the max age
        #[arg(long)]
        ignore_age: bool,
    },

    /// Print the whole offline cache
    Dump,

    /// Clear one category, or the whole cache when no category is given
    Clear { category: Option<String> },
}

impl Cli {
    /// Resolves settings from the config file, then applies flag overrides
    pub fn settings(&self) -> Result<Settings, CliError> {
        let mut settings = match &self.config {
            Some(path) => Settings::load_from(path)?,
            None => Settings::load()?,
        };

        if let Some(dir) = &self.data_dir {
            settings.data_dir = Some(dir.clone());
        }
        if let Some(key) = &self.storage_key {
            settings.storage_key = key.clone();
        }
        if let Some(days) = self.max_age_days {
            settings.max_age_ms = Duration::try_days(days)
                .ok_or(CliError::InvalidMaxAge(days))?
                .num_milliseconds();
        }
        if let Some(max_items) = self.max_items {
            settings.max_items = max_items;
        }

        Ok(settings)
    }
}

/// Parses a JSON payload argument
///
/// # Returns
/// * `Ok(Value)` for any valid JSON document
/// * `Err(CliError::InvalidJson)` otherwise
pub fn parse_json_arg(s: &str) -> Result<Value, CliError> {
    serde_json::from_str(s).map_err(|e| CliError::InvalidJson(e.to_string()))
}

/// Runs a subcommand, writing its output to `out`
pub fn run<S, W>(command: &Command, cache: &OfflineCache<S>, out: &mut W) -> Result<(), CliError>
where
    S: KeyValueStorage,
    W: Write,
{
    match command {
        Command::Categories => {
            for category in available_categories() {
                writeln!(out, "{}", category)?;
            }
        }
        Command::Sources {
            category,
            compromised,
        } => {
            let sources = sources_for_category(category, *compromised)?;
            writeln!(out, "{}", serde_json::to_string_pretty(&sources)?)?;
        }
        Command::Store {
            category,
            data,
            sources,
        } => {
            let data = parse_json_arg(data)?;
            let metadata = if sources.is_empty() {
                FetchMetadata::default()
            } else {
                FetchMetadata::from_sources(sources.iter().cloned())
            };
            if !cache.store_data(category, data, metadata) {
                return Err(CliError::CacheWriteFailed(category.clone()));
            }
            writeln!(out, "Stored record for '{}'", category)?;
        }
        Command::Get {
            category,
            source,
            ignore_age,
        } => {
            let options = RetrieveOptions {
                source: source.clone(),
                ignore_age: *ignore_age,
            };
            let record = cache
                .retrieve_data(category, &options)
                .ok_or_else(|| CliError::NotFound(category.clone()))?;
            writeln!(out, "{}", serde_json::to_string_pretty(&record)?)?;
        }
        Command::Dump => {
            writeln!(out, "{}", serde_json::to_string_pretty(&cache.get_storage())?)?;
        }
        Command::Clear { category: Some(category) } => {
            if !cache.clear_category(category) {
                return Err(CliError::CacheWriteFailed(category.clone()));
            }
            writeln!(out, "Cleared '{}'", category)?;
        }
        Command::Clear { category: None } => {
            if !cache.clear_storage() {
                return Err(CliError::CacheWriteFailed("all categories".to_string()));
            }
            writeln!(out, "Cleared offline cache")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStorage;

    fn run_to_string(command: Command, cache: &OfflineCache<MemoryStorage>) -> Result<String, CliError> {
        let mut out = Vec::new();
        run(&command, cache, &mut out)?;
        Ok(String::from_utf8(out).expect("Output should be UTF-8"))
    }

    #[test]
    fn test_parse_json_arg_valid() {
        assert_eq!(parse_json_arg("{\"v\": 1}").unwrap()["v"], 1);
        assert!(parse_json_arg("42").unwrap().is_number());
    }

    #[test]
    fn test_parse_json_arg_invalid() {
        let err = parse_json_arg("{oops").unwrap_err();
        assert!(err.to_string().contains("Invalid JSON"));
    }

    #[test]
    fn test_cli_parse_sources_compromised() {
        let cli = Cli::parse_from(["vitalvision", "sources", "obesity", "--compromised"]);
        assert_eq!(
            cli.command,
            Command::Sources {
                category: "obesity".to_string(),
                compromised: true
            }
        );
    }

    #[test]
    fn test_cli_parse_store_with_repeated_sources() {
        let cli = Cli::parse_from([
            "vitalvision",
            "store",
            "obesity",
            "{}",
            "--source",
            "nhanes",
            "--source",
            "brfss",
        ]);
        match cli.command {
            Command::Store { sources, .. } => assert_eq!(sources, vec!["nhanes", "brfss"]),
            other => panic!("Expected store command, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["vitalvision", "dump", "--max-items", "5"]);
        assert_eq!(cli.max_items, Some(5));
        assert_eq!(cli.command, Command::Dump);
    }

    #[test]
    fn test_cli_parse_clear_without_category() {
        let cli = Cli::parse_from(["vitalvision", "clear"]);
        assert_eq!(cli.command, Command::Clear { category: None });
    }

    #[test]
    fn test_settings_apply_flag_overrides() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
        let config_path = temp_dir.path().join("config.json");
        std::fs::write(&config_path, r#"{"max_items": 7, "storage_key": "from_file"}"#).unwrap();

        let cli = Cli::parse_from([
            "vitalvision",
            "--config",
            config_path.to_str().unwrap(),
            "--storage-key",
            "from_flag",
            "--max-age-days",
            "2",
            "dump",
        ]);
        let settings = cli.settings().unwrap();

        assert_eq!(settings.max_items, 7);
        assert_eq!(settings.storage_key, "from_flag");
        assert_eq!(settings.max_age_ms, 2 * 86_400_000);
    }

    #[test]
    fn test_settings_reject_out_of_range_max_age() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
        let config_path = temp_dir.path().join("config.json");

        let cli = Cli::parse_from([
            "vitalvision",
            "--config",
            config_path.to_str().unwrap(),
            "--max-age-days",
            i64::MAX.to_string().as_str(),
            "dump",
        ]);

        assert!(matches!(cli.settings(), Err(CliError::InvalidMaxAge(days)) if days == i64::MAX));
    }

    #[test]
    fn test_run_categories_lists_table() {
        let cache = OfflineCache::with_defaults(MemoryStorage::new());
        let output = run_to_string(Command::Categories, &cache).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "obesity");
    }

    #[test]
    fn test_run_sources_unknown_category() {
        let cache = OfflineCache::with_defaults(MemoryStorage::new());
        let result = run_to_string(
            Command::Sources {
                category: "bogus".to_string(),
                compromised: false,
            },
            &cache,
        );
        assert!(matches!(result, Err(CliError::UnknownCategory(_))));
    }

    #[test]
    fn test_run_store_then_get() {
        let cache = OfflineCache::with_defaults(MemoryStorage::new());
        run_to_string(
            Command::Store {
                category: "obesity".to_string(),
                data: "{\"rate\": 41.9}".to_string(),
                sources: vec!["nhanes".to_string()],
            },
            &cache,
        )
        .unwrap();

        let output = run_to_string(
            Command::Get {
                category: "obesity".to_string(),
                source: Some("nhanes".to_string()),
                ignore_age: false,
            },
            &cache,
        )
        .unwrap();

        let record: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(record["data"]["rate"], 41.9);
        assert_eq!(record["metadata"]["sources"][0], "nhanes");
    }

    #[test]
    fn test_run_get_missing_is_not_found() {
        let cache = OfflineCache::with_defaults(MemoryStorage::new());
        let result = run_to_string(
            Command::Get {
                category: "obesity".to_string(),
                source: None,
                ignore_age: true,
            },
            &cache,
        );
        assert!(matches!(result, Err(CliError::NotFound(_))));
    }

    #[test]
    fn test_run_clear_category() {
        let cache = OfflineCache::with_defaults(MemoryStorage::new());
        cache.store_data("obesity", serde_json::json!(1), FetchMetadata::default());

        run_to_string(
            Command::Clear {
                category: Some("obesity".to_string()),
            },
            &cache,
        )
        .unwrap();

        assert!(cache.cached_categories().is_empty());
    }
}
