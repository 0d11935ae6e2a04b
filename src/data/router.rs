//! Category source router
//!
//! Decides, for a category and the reliability of its primary providers,
//! which sources to query and in what order. Stateless and deterministic.

use thiserror::Error;

use super::categories::{all_categories, get_mapping_by_category};
use super::CategorySources;

/// Errors returned by the router
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouterError {
    /// No mapping is configured for the requested category
    #[error("No source mapping for category: '{0}'")]
    CategoryNotFound(String),
}

/// Returns the ordered source lists for a category
///
/// # Arguments
/// * `category` - Category key; must be present in the static table
/// * `primary_compromised` - Whether the category's primary providers are
///   currently considered unreliable
///
/// # Returns
/// * Normally, the table's primary and secondary lists unchanged
/// * When `primary_compromised` is set, `secondary ++ primary` as the primary
///   list and an empty secondary list. The original primaries stay reachable
///   as a last resort.
/// * `Err(RouterError::CategoryNotFound)` for an unconfigured category
pub fn sources_for_category(
    category: &str,
    primary_compromised: bool,
) -> Result<CategorySources, RouterError> {
    let mapping = get_mapping_by_category(category)
        .ok_or_else(|| RouterError::CategoryNotFound(category.to_string()))?;

    if primary_compromised {
        let promoted = mapping
            .secondary
            .iter()
            .chain(mapping.primary.iter())
            .copied()
            .collect();
        Ok(CategorySources {
            primary_sources: promoted,
            secondary_sources: Vec::new(),
        })
    } else {
        Ok(CategorySources {
            primary_sources: mapping.primary.to_vec(),
            secondary_sources: mapping.secondary.to_vec(),
        })
    }
}

/// Returns every configured category key, in table order
pub fn available_categories() -> Vec<&'static str> {
    all_categories().iter().map(|m| m.category).collect()
}
