#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the incident dashboard server.
//!
//! Aggregate results are serialized straight from the analytics models;
//! the types here cover query parameters and the few responses that have
//! no engine counterpart.

use gtd_analytics_models::Selection;
use gtd_incident_models::{AttackType, YearRange};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
    /// Number of incidents loaded.
    pub incidents: usize,
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Query parameters shared by the series, totals, locations, and dashboard
/// endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionQueryParams {
    /// Selected region.
    pub region: String,
    /// Selected country.
    pub country: String,
    /// First year (inclusive). Defaults to the dataset's first year.
    pub from: Option<i32>,
    /// Last year (inclusive). Defaults to the dataset's last year.
    pub to: Option<i32>,
}

impl SelectionQueryParams {
    /// Builds a [`Selection`], filling missing years from `bounds`.
    #[must_use]
    pub fn to_selection(&self, bounds: YearRange) -> Selection {
        Selection::new(
            self.region.clone(),
            self.country.clone(),
            YearRange::new(
                self.from.unwrap_or(bounds.from),
                self.to.unwrap_or(bounds.to),
            ),
        )
    }
}

/// Query parameters for the countries endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CountryQueryParams {
    pub region: String,
}

/// Query parameters for the location endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct LocationQueryParams {
    pub country: String,
}

/// Year slider bounds and its initial position.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiYearBounds {
    /// First year present in the dataset.
    pub min: i32,
    /// Last year present in the dataset.
    pub max: i32,
    /// Initial lower handle.
    pub default_from: i32,
    /// Initial upper handle.
    pub default_to: i32,
}

/// An attack type with its numeric code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiAttackType {
    pub code: u32,
    pub name: String,
}

impl From<AttackType> for ApiAttackType {
    fn from(value: AttackType) -> Self {
        Self {
            code: value.code(),
            name: value.label().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_years_fall_back_to_bounds() {
        let params = SelectionQueryParams {
            region: "South Asia".to_string(),
            country: "India".to_string(),
            from: Some(2012),
            to: None,
        };
        let selection = params.to_selection(YearRange::new(1970, 2017));
        assert_eq!(selection.years, YearRange::new(2012, 2017));
        assert_eq!(selection.country, "India");
    }

    #[test]
    fn year_bounds_serialize_camel_case() {
        let bounds = ApiYearBounds {
            min: 1970,
            max: 2017,
            default_from: 2010,
            default_to: 2017,
        };
        let json = serde_json::to_value(&bounds).unwrap();
        assert_eq!(json["defaultFrom"], 2010);
        assert_eq!(json["defaultTo"], 2017);
    }

    #[test]
    fn attack_type_carries_code_and_label() {
        let api = ApiAttackType::from(AttackType::BombingExplosion);
        assert_eq!(api.code, 3);
        assert_eq!(api.name, "Bombing/Explosion");
    }
}
