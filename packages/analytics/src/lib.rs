#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation engine for the incident dashboard.
//!
//! [`AggregationEngine`] owns the normalized incident table and answers the
//! dashboard's queries: the per-year series behind the line/bar chart, the
//! scalar totals behind the pie chart, the per-location series behind the
//! map, the country list for a region, and the map centre for a country.
//! Indexes are built once at construction; every query is a lookup plus a
//! range scan over immutable data.

pub mod engine;

use thiserror::Error;

pub use engine::AggregationEngine;

/// Errors returned by the engine's lookup operations.
///
/// Selection mismatches are not errors: they yield empty results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalyticsError {
    /// No reference coordinate exists for the country.
    #[error("No location found for country '{country}'")]
    LocationNotFound {
        /// Country that was looked up.
        country: String,
    },

    /// The region does not occur in the dataset.
    #[error("Unknown region '{region}'")]
    UnknownRegion {
        /// Region that was looked up.
        region: String,
    },

    /// The region occurs in the dataset but lists no countries.
    #[error("Region '{region}' has no countries")]
    EmptyRegion {
        /// Region that was looked up.
        region: String,
    },
}
