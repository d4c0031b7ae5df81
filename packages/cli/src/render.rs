//! Terminal output for query results.

use gtd_analytics_models::{DashboardSnapshot, LocationSeriesPoint, YearSeriesPoint};
use gtd_incident_models::Measures;
use gtd_server_models::ApiAttackType;
use serde::Serialize;

/// Prints `value` as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints one item per line under `header`.
pub fn print_list(header: &str, items: &[String]) {
    println!("{header}");
    println!("{}", "-".repeat(40));
    for item in items {
        println!("{item}");
    }
}

/// Prints the attack-type taxonomy as a code/name table.
pub fn print_attack_types(types: &[ApiAttackType]) {
    println!("{:<6} NAME", "CODE");
    println!("{}", "-".repeat(50));
    for attack_type in types {
        println!("{:<6} {}", attack_type.code, attack_type.name);
    }
}

/// Prints the per-year series as a table.
pub fn print_series(series: &[YearSeriesPoint]) {
    if series.is_empty() {
        println!("No incidents match this selection.");
        return;
    }

    println!(
        "{:<6} {:>10} {:>10} {:>10} {:>10}",
        "YEAR", "KILLED", "WOUNDED", "ATTACK", "INCIDENTS"
    );
    println!("{}", "-".repeat(50));
    for point in series {
        println!(
            "{:<6} {:>10} {:>10} {:>10} {:>10}",
            point.year,
            point.measures.killed,
            point.measures.wounded,
            point.measures.attack_count,
            point.measures.incidents
        );
    }
}

/// Prints the totals one measure per line.
pub fn print_totals(totals: &Measures) {
    println!("{:<10} {}", "Killed", totals.killed);
    println!("{:<10} {}", "Wounded", totals.wounded);
    println!("{:<10} {}", "Attack", totals.attack_count);
    println!("{:<10} {}", "Incidents", totals.incidents);
}

/// Prints the per-location series as a table.
pub fn print_locations(locations: &[LocationSeriesPoint]) {
    if locations.is_empty() {
        println!("No located incidents match this selection.");
        return;
    }

    println!(
        "{:<24} {:<24} {:<6} {:>10} {:>11} {:>8} {:>8}",
        "PROVINCE", "CITY", "YEAR", "LAT", "LON", "KILLED", "WOUNDED"
    );
    println!("{}", "-".repeat(97));
    for point in locations {
        println!(
            "{:<24} {:<24} {:<6} {:>10.4} {:>11.4} {:>8} {:>8}",
            truncate(&point.province, 24),
            truncate(&point.city, 24),
            point.year,
            point.latitude,
            point.longitude,
            point.measures.killed,
            point.measures.wounded
        );
    }
}

/// Prints every view of a snapshot with the selection as a heading.
pub fn print_snapshot(snapshot: &DashboardSnapshot) {
    let selection = &snapshot.selection;
    println!();
    println!(
        "{} / {} ({})",
        selection.region, selection.country, selection.years
    );
    println!();
    print_series(&snapshot.series);
    println!();
    print_totals(&snapshot.totals);
    println!();
    match snapshot.center {
        Some(center) => println!(
            "Map centre: {:.6}, {:.6} ({} locations)",
            center.latitude,
            center.longitude,
            snapshot.locations.len()
        ),
        None => println!("Map centre: default view"),
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut out: String = value.chars().take(width.saturating_sub(1)).collect();
    out.push('~');
    out
}
