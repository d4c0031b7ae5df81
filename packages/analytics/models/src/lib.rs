#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Input and result types for the incident aggregation engine.
//!
//! A [`Selection`] goes in; per-year series, per-location series, scalar
//! totals, or a whole [`DashboardSnapshot`] come out. None of these types
//! carry presentation details.

use gtd_incident_models::{Coordinates, Measures, YearRange};
use serde::{Deserialize, Serialize};

/// The filter selection driving every aggregate view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    /// Selected region.
    pub region: String,
    /// Selected country (expected to belong to `region`).
    pub country: String,
    /// Inclusive year range.
    pub years: YearRange,
}

impl Selection {
    #[must_use]
    pub fn new(region: impl Into<String>, country: impl Into<String>, years: YearRange) -> Self {
        Self {
            region: region.into(),
            country: country.into(),
            years,
        }
    }
}

/// Summed measures for one year of the selected country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearSeriesPoint {
    /// Year.
    pub year: i32,
    /// Measures summed over every incident of that year.
    #[serde(flatten)]
    pub measures: Measures,
}

/// Summed measures for one distinct location in one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSeriesPoint {
    /// Province or state.
    pub province: String,
    /// City.
    pub city: String,
    /// Year.
    pub year: i32,
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// Measures summed over every incident at this location in this year.
    #[serde(flatten)]
    pub measures: Measures,
}

impl LocationSeriesPoint {
    #[must_use]
    pub const fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// Options for the country selector after a region change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryOptions {
    /// Region the countries belong to.
    pub region: String,
    /// Countries in first-appearance order.
    pub countries: Vec<String>,
    /// Preselected country: the first entry of `countries`.
    pub default: String,
}

/// Everything one input change recomputes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    /// The selection these views were computed for.
    pub selection: Selection,
    /// Per-year series for the line/bar chart.
    pub series: Vec<YearSeriesPoint>,
    /// Totals for the pie chart.
    pub totals: Measures,
    /// Per-location series for the map.
    pub locations: Vec<LocationSeriesPoint>,
    /// Map centre, or `None` to let the renderer keep its default view.
    pub center: Option<Coordinates>,
}
