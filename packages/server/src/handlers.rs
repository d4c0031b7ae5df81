//! HTTP handler functions for the incident dashboard API.
//!
//! Selection mismatches are answered with `200` and empty bodies; only
//! lookups that name something absent from the dataset return `404`.

use actix_web::{HttpResponse, web};
use gtd_analytics::AnalyticsError;
use gtd_incident_models::AttackType;
use gtd_server_models::{
    ApiAttackType, ApiError, ApiHealth, ApiYearBounds, CountryQueryParams, LocationQueryParams,
    SelectionQueryParams,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        incidents: state.engine.table().len(),
    })
}

/// `GET /api/regions`
pub async fn regions(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.engine.regions())
}

/// `GET /api/countries`
///
/// Lists the countries of a region along with the preselected one.
pub async fn countries(
    state: web::Data<AppState>,
    params: web::Query<CountryQueryParams>,
) -> HttpResponse {
    match state.engine.country_options(&params.region) {
        Ok(options) => HttpResponse::Ok().json(options),
        Err(e @ AnalyticsError::EmptyRegion { .. }) => {
            log::error!("Failed to list countries: {e}");
            HttpResponse::InternalServerError().json(ApiError::new(e.to_string()))
        }
        Err(e) => not_found(&e),
    }
}

/// `GET /api/years`
///
/// Bounds and initial position of the year range slider.
pub async fn years(state: web::Data<AppState>) -> HttpResponse {
    match (state.engine.year_bounds(), state.default_years()) {
        (Some(bounds), Some(defaults)) => HttpResponse::Ok().json(ApiYearBounds {
            min: bounds.from,
            max: bounds.to,
            default_from: defaults.from,
            default_to: defaults.to,
        }),
        _ => HttpResponse::NotFound().json(ApiError::new("No incidents loaded")),
    }
}

/// `GET /api/attack-types`
pub async fn attack_types() -> HttpResponse {
    let types: Vec<ApiAttackType> = AttackType::all()
        .iter()
        .copied()
        .map(ApiAttackType::from)
        .collect();

    HttpResponse::Ok().json(types)
}

/// `GET /api/series`
pub async fn series(
    state: web::Data<AppState>,
    params: web::Query<SelectionQueryParams>,
) -> HttpResponse {
    let selection = params.to_selection(state.year_bounds());
    HttpResponse::Ok().json(state.engine.series_by_year(&selection))
}

/// `GET /api/totals`
pub async fn totals(
    state: web::Data<AppState>,
    params: web::Query<SelectionQueryParams>,
) -> HttpResponse {
    let selection = params.to_selection(state.year_bounds());
    HttpResponse::Ok().json(state.engine.totals(&selection))
}

/// `GET /api/locations`
pub async fn locations(
    state: web::Data<AppState>,
    params: web::Query<SelectionQueryParams>,
) -> HttpResponse {
    let selection = params.to_selection(state.year_bounds());
    HttpResponse::Ok().json(state.engine.series_by_location(&selection))
}

/// `GET /api/location`
///
/// Map centre for a country.
pub async fn location(
    state: web::Data<AppState>,
    params: web::Query<LocationQueryParams>,
) -> HttpResponse {
    match state.engine.location_of(&params.country) {
        Ok(coordinates) => HttpResponse::Ok().json(coordinates),
        Err(e) => not_found(&e),
    }
}

/// `GET /api/dashboard`
///
/// Every view the dashboard redraws after an input change.
pub async fn dashboard(
    state: web::Data<AppState>,
    params: web::Query<SelectionQueryParams>,
) -> HttpResponse {
    let selection = params.to_selection(state.year_bounds());
    HttpResponse::Ok().json(state.engine.snapshot(&selection))
}

fn not_found(e: &AnalyticsError) -> HttpResponse {
    log::warn!("{e}");
    HttpResponse::NotFound().json(ApiError::new(e.to_string()))
}
