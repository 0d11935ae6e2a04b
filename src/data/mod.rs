//! Source routing data model for Vital Health Vision
//!
//! This module contains the types describing which data providers serve each
//! health-data category, plus the static category table and the router that
//! orders providers for a fetch.

pub mod categories;
pub mod router;

pub use categories::{all_categories, get_mapping_by_category};
pub use router::{available_categories, sources_for_category, RouterError};

use serde::{Serialize, Serializer};

/// Named data provider a source descriptor points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    /// CDC National Health and Nutrition Examination Survey
    Nhanes,
    /// CDC Behavioral Risk Factor Surveillance System
    Brfss,
    /// Independent archive of previously published datasets
    Archive,
    /// Fenway Institute LGBTQ+ health research
    Fenway,
    /// World Health Organization Global Health Observatory
    Who,
}

impl SourceId {
    /// Returns the identifier used in cache metadata and serialized output
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::Nhanes => "nhanes",
            SourceId::Brfss => "brfss",
            SourceId::Archive => "archive",
            SourceId::Fenway => "fenway",
            SourceId::Who => "who",
        }
    }

    /// Parses a provider identifier, case-insensitively
    ///
    /// Returns `None` for identifiers that don't name a known provider.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "nhanes" => Some(SourceId::Nhanes),
            "brfss" => Some(SourceId::Brfss),
            "archive" => Some(SourceId::Archive),
            "fenway" => Some(SourceId::Fenway),
            "who" => Some(SourceId::Who),
            _ => None,
        }
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of a provider-specific fetch parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Text(&'static str),
    Integer(i64),
    Flag(bool),
}

/// A single named fetch parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Param {
    pub name: &'static str,
    pub value: ParamValue,
}

/// One provider to try: which source, which fetch operation, with what parameters
///
/// Uses `&'static` references so the whole category table can live in a
/// `static`. Parameters serialize as a JSON object keyed by parameter name.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SourceDescriptor {
    /// Provider to query
    pub source: SourceId,
    /// Logical fetch operation on that provider
    pub method: &'static str,
    /// Provider-specific parameters
    #[serde(serialize_with = "serialize_params")]
    pub params: &'static [Param],
}

impl SourceDescriptor {
    /// Looks up a parameter by name
    pub fn param(&self, name: &str) -> Option<ParamValue> {
        self.params.iter().find(|p| p.name == name).map(|p| p.value)
    }
}

fn serialize_params<S: Serializer>(params: &&'static [Param], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_map(params.iter().map(|p| (p.name, p.value)))
}

/// Static routing entry for one health-data category
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CategoryMapping {
    /// Category key (e.g. "obesity")
    pub category: &'static str,
    /// Sources tried first under normal conditions
    pub primary: &'static [SourceDescriptor],
    /// Fallback and cross-verification sources
    pub secondary: &'static [SourceDescriptor],
}

/// Ordered source lists returned by the router for one fetch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySources {
    /// Sources to try, in order
    pub primary_sources: Vec<SourceDescriptor>,
    /// Sources held back for fallback or verification
    pub secondary_sources: Vec<SourceDescriptor>,
}

impl CategorySources {
    /// Iterates every source in the order a caller should attempt them
    pub fn in_priority_order(&self) -> impl Iterator<Item = &SourceDescriptor> {
        self.primary_sources.iter().chain(self.secondary_sources.iter())
    }
}
