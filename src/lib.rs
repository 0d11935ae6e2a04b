//! Vital Health Vision data core
//!
//! Category-to-source routing for public-health datasets and an offline
//! cache that keeps recent fetch results available when sources fail.

pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod fetch;
