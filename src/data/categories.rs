//! Static category routing table
//!
//! Maps each health-data category to the providers that serve it. The table
//! is fixed at compile time and never mutated.

use super::{CategoryMapping, Param, ParamValue, SourceDescriptor, SourceId};

/// Static array of all configured health-data categories
///
/// Primary sources are the government surveys each dashboard is built on;
/// secondary sources are archives and independent providers used when a
/// primary source is unavailable or under question.
pub static CATEGORY_MAPPINGS: [CategoryMapping; 5] = [
    CategoryMapping {
        category: "obesity",
        primary: &[
            SourceDescriptor {
                source: SourceId::Nhanes,
                method: "getObesityData",
                params: &[
                    Param {
                        name: "cycle",
                        value: ParamValue::Text("2017-2020"),
                    },
                    Param {
                        name: "measure",
                        value: ParamValue::Text("bmi"),
                    },
                ],
            },
            SourceDescriptor {
                source: SourceId::Brfss,
                method: "getObesityPrevalence",
                params: &[Param {
                    name: "year",
                    value: ParamValue::Integer(2022),
                }],
            },
        ],
        secondary: &[
            SourceDescriptor {
                source: SourceId::Archive,
                method: "getArchivedDataset",
                params: &[Param {
                    name: "dataset",
                    value: ParamValue::Text("nhanes-obesity"),
                }],
            },
            SourceDescriptor {
                source: SourceId::Who,
                method: "getIndicator",
                params: &[Param {
                    name: "indicator",
                    value: ParamValue::Text("NCD_BMI_30A"),
                }],
            },
        ],
    },
    CategoryMapping {
        category: "mental-health",
        primary: &[
            SourceDescriptor {
                source: SourceId::Brfss,
                method: "getMentalHealthData",
                params: &[Param {
                    name: "topic",
                    value: ParamValue::Text("depression"),
                }],
            },
            SourceDescriptor {
                source: SourceId::Nhanes,
                method: "getDepressionScreening",
                params: &[Param {
                    name: "instrument",
                    value: ParamValue::Text("PHQ-9"),
                }],
            },
        ],
        secondary: &[
            SourceDescriptor {
                source: SourceId::Archive,
                method: "getArchivedDataset",
                params: &[Param {
                    name: "dataset",
                    value: ParamValue::Text("brfss-mental-health"),
                }],
            },
            SourceDescriptor {
                source: SourceId::Who,
                method: "getIndicator",
                params: &[Param {
                    name: "indicator",
                    value: ParamValue::Text("MH_12"),
                }],
            },
        ],
    },
    CategoryMapping {
        category: "lgbtq-health",
        primary: &[SourceDescriptor {
            source: SourceId::Brfss,
            method: "getSexualOrientationModule",
            params: &[
                Param {
                    name: "module",
                    value: ParamValue::Text("SOGI"),
                },
                Param {
                    name: "includeGenderIdentity",
                    value: ParamValue::Flag(true),
                },
            ],
        }],
        secondary: &[
            SourceDescriptor {
                source: SourceId::Fenway,
                method: "getLgbtqHealthData",
                params: &[Param {
                    name: "report",
                    value: ParamValue::Text("health-disparities"),
                }],
            },
            SourceDescriptor {
                source: SourceId::Archive,
                method: "getArchivedDataset",
                params: &[Param {
                    name: "dataset",
                    value: ParamValue::Text("brfss-sogi"),
                }],
            },
        ],
    },
    CategoryMapping {
        category: "minority-health",
        primary: &[
            SourceDescriptor {
                source: SourceId::Brfss,
                method: "getHealthDisparities",
                params: &[Param {
                    name: "stratifyBy",
                    value: ParamValue::Text("race_ethnicity"),
                }],
            },
            SourceDescriptor {
                source: SourceId::Nhanes,
                method: "getDemographicBreakdown",
                params: &[Param {
                    name: "cycle",
                    value: ParamValue::Text("2017-2020"),
                }],
            },
        ],
        secondary: &[SourceDescriptor {
            source: SourceId::Archive,
            method: "getArchivedDataset",
            params: &[Param {
                name: "dataset",
                value: ParamValue::Text("omh-minority-health"),
            }],
        }],
    },
    CategoryMapping {
        category: "global-health",
        primary: &[SourceDescriptor {
            source: SourceId::Who,
            method: "getGlobalHealthObservatory",
            params: &[Param {
                name: "indicator",
                value: ParamValue::Text("WHOSIS_000001"),
            }],
        }],
        secondary: &[SourceDescriptor {
            source: SourceId::Archive,
            method: "getArchivedDataset",
            params: &[Param {
                name: "dataset",
                value: ParamValue::Text("who-gho"),
            }],
        }],
    },
];

/// Get the routing entry for a category
///
/// # Arguments
///
/// * `category` - The category key (e.g., "obesity", "mental-health")
///
/// # Returns
///
/// Returns `Some(&CategoryMapping)` if configured, `None` otherwise
pub fn get_mapping_by_category(category: &str) -> Option<&'static CategoryMapping> {
    CATEGORY_MAPPINGS.iter().find(|m| m.category == category)
}

/// Get all configured category mappings, in table order
pub fn all_categories() -> &'static [CategoryMapping] {
    &CATEGORY_MAPPINGS
}
