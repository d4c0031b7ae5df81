//! Interactive explorer.
//!
//! Walks through the same inputs the dashboard offers: a region, then a
//! country of that region (preselecting the first one), then a year range
//! (preselecting the configured defaults). Prints every view for the
//! resulting selection and offers to start over.

use dialoguer::{Confirm, Input, Select};
use gtd_analytics_models::Selection;
use gtd_incident_models::YearRange;
use gtd_server::AppState;

use crate::render;

/// Runs the explorer until the user declines another round.
///
/// # Errors
///
/// Returns an error if a prompt fails or the chosen region lists no
/// countries.
pub fn run(state: &AppState, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let regions = state.engine.regions();
    let defaults = state.default_years().ok_or("No incidents loaded")?;
    let default_region = state
        .defaults
        .region
        .as_deref()
        .and_then(|region| regions.iter().position(|r| r == region))
        .unwrap_or(0);

    loop {
        let region_idx = Select::new()
            .with_prompt("Region")
            .items(regions)
            .default(default_region)
            .interact()?;
        let region = &regions[region_idx];

        let options = state.engine.country_options(region)?;
        let country_idx = Select::new()
            .with_prompt("Country")
            .items(&options.countries)
            .default(0)
            .interact()?;

        let from: i32 = Input::new()
            .with_prompt("From year")
            .default(defaults.from)
            .interact_text()?;
        let to: i32 = Input::new()
            .with_prompt("To year")
            .default(defaults.to)
            .interact_text()?;

        let selection = Selection::new(
            region.clone(),
            options.countries[country_idx].clone(),
            YearRange::new(from, to),
        );
        if !selection.years.is_valid() {
            log::warn!(
                "Year range {} is inverted; every view will be empty",
                selection.years
            );
        }

        let snapshot = state.engine.snapshot(&selection);
        if json {
            render::print_json(&snapshot)?;
        } else {
            render::print_snapshot(&snapshot);
        }

        if !Confirm::new()
            .with_prompt("Explore another selection?")
            .default(true)
            .interact()?
        {
            return Ok(());
        }
    }
}
