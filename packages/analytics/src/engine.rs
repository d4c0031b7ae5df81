//! The aggregation engine and its precomputed indexes.
//!
//! Construction makes one pass over the table and groups rows by
//! (region, country), then by year and by location-year. Queries select a
//! (region, country) group and scan the requested year range.

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use gtd_analytics_models::{
    CountryOptions, DashboardSnapshot, LocationSeriesPoint, Selection, YearSeriesPoint,
};
use gtd_dataset::IncidentTable;
use gtd_incident_models::{Coordinates, IncidentRecord, Measures, YearRange};

use crate::AnalyticsError;

/// Identity of a location-year group within one country.
///
/// Coordinates are compared by bit pattern; `-0.0` is folded into `0.0`
/// first so both spellings land in the same group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct LocationSlotKey {
    province: String,
    city: String,
    year: i32,
    latitude_bits: u64,
    longitude_bits: u64,
}

fn coordinate_bits(value: f64) -> u64 {
    (value + 0.0).to_bits()
}

/// Aggregates for one (region, country) pair.
#[derive(Debug, Default)]
struct CountryIndex {
    by_year: BTreeMap<i32, Measures>,
    /// Location-year groups in order of first appearance in the table.
    locations: Vec<LocationSeriesPoint>,
    location_slots: HashMap<LocationSlotKey, usize>,
}

impl CountryIndex {
    fn add(&mut self, record: &IncidentRecord) {
        let measures = record.measures();
        *self.by_year.entry(record.year).or_default() += measures;

        // Every location key component must be present for the row to form
        // a map group.
        let (Some(province), Some(city), Some(coords)) =
            (&record.province, &record.city, record.coordinates())
        else {
            return;
        };

        let key = LocationSlotKey {
            province: province.clone(),
            city: city.clone(),
            year: record.year,
            latitude_bits: coordinate_bits(coords.latitude),
            longitude_bits: coordinate_bits(coords.longitude),
        };

        if let Some(&slot) = self.location_slots.get(&key) {
            self.locations[slot].measures += measures;
        } else {
            self.location_slots.insert(key, self.locations.len());
            self.locations.push(LocationSeriesPoint {
                province: province.clone(),
                city: city.clone(),
                year: record.year,
                latitude: coords.latitude,
                longitude: coords.longitude,
                measures,
            });
        }
    }
}

/// Countries of one region and their aggregates.
#[derive(Debug, Default)]
struct RegionIndex {
    /// Country names in order of first appearance.
    countries: Vec<String>,
    by_country: HashMap<String, CountryIndex>,
}

/// Owns the incident table and answers the dashboard's queries.
///
/// Immutable after construction, so a single instance can be shared across
/// threads without locking.
#[derive(Debug)]
pub struct AggregationEngine {
    table: IncidentTable,
    /// Region names in order of first appearance.
    regions: Vec<String>,
    by_region: HashMap<String, RegionIndex>,
    country_locations: HashMap<String, Coordinates>,
    year_bounds: Option<YearRange>,
}

impl AggregationEngine {
    /// Builds every index in a single pass over `table`.
    #[must_use]
    pub fn new(table: IncidentTable) -> Self {
        let started = Instant::now();

        let mut regions = Vec::new();
        let mut by_region: HashMap<String, RegionIndex> = HashMap::new();
        let mut country_locations: HashMap<String, Coordinates> = HashMap::new();

        for record in table.records() {
            let region_index = by_region.entry(record.region.clone()).or_insert_with(|| {
                regions.push(record.region.clone());
                RegionIndex::default()
            });

            if !region_index.by_country.contains_key(&record.country) {
                region_index.countries.push(record.country.clone());
            }
            region_index
                .by_country
                .entry(record.country.clone())
                .or_default()
                .add(record);

            if let Some(coords) = record.coordinates() {
                country_locations
                    .entry(record.country.clone())
                    .or_insert(coords);
            }
        }

        let year_bounds = table.year_bounds();

        log::info!(
            "Indexed {} incidents: {} regions, {} countries with coordinates, years {} in {:.2?}",
            table.len(),
            regions.len(),
            country_locations.len(),
            year_bounds.map_or_else(|| "n/a".to_string(), |b| b.to_string()),
            started.elapsed()
        );

        Self {
            table,
            regions,
            by_region,
            country_locations,
            year_bounds,
        }
    }

    /// The table this engine was built from.
    #[must_use]
    pub const fn table(&self) -> &IncidentTable {
        &self.table
    }

    /// Region names in order of first appearance in the table.
    #[must_use]
    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    /// The observed `[min(year), max(year)]`, `None` for an empty table.
    #[must_use]
    pub const fn year_bounds(&self) -> Option<YearRange> {
        self.year_bounds
    }

    fn country_index(&self, region: &str, country: &str) -> Option<&CountryIndex> {
        self.by_region.get(region)?.by_country.get(country)
    }

    /// Per-year sums for the selected country, ascending by year.
    ///
    /// Returns an empty vector when the country does not belong to the
    /// region, nothing matches, or the year range is inverted.
    #[must_use]
    pub fn series_by_year(&self, selection: &Selection) -> Vec<YearSeriesPoint> {
        let years = selection.years;
        if !years.is_valid() {
            return Vec::new();
        }
        let Some(index) = self.country_index(&selection.region, &selection.country) else {
            return Vec::new();
        };

        index
            .by_year
            .range(years.from..=years.to)
            .map(|(&year, &measures)| YearSeriesPoint { year, measures })
            .collect()
    }

    /// Measures summed over every year of the selection. Zero when nothing
    /// matches.
    #[must_use]
    pub fn totals(&self, selection: &Selection) -> Measures {
        let years = selection.years;
        if !years.is_valid() {
            return Measures::ZERO;
        }
        self.country_index(&selection.region, &selection.country)
            .map_or(Measures::ZERO, |index| {
                index
                    .by_year
                    .range(years.from..=years.to)
                    .map(|(_, &measures)| measures)
                    .sum()
            })
    }

    /// Per-location-year sums for the selected country, in order of first
    /// appearance in the table.
    #[must_use]
    pub fn series_by_location(&self, selection: &Selection) -> Vec<LocationSeriesPoint> {
        let years = selection.years;
        let Some(index) = self.country_index(&selection.region, &selection.country) else {
            return Vec::new();
        };

        index
            .locations
            .iter()
            .filter(|point| years.contains(point.year))
            .cloned()
            .collect()
    }

    /// Countries recorded under `region`, in order of first appearance.
    /// Empty for an unknown region.
    #[must_use]
    pub fn countries_in_region(&self, region: &str) -> &[String] {
        self.by_region
            .get(region)
            .map(|index| index.countries.as_slice())
            .unwrap_or_default()
    }

    /// Country selector options for `region`; the default is the first
    /// country.
    ///
    /// # Errors
    ///
    /// * [`AnalyticsError::UnknownRegion`] if the region is not in the table.
    /// * [`AnalyticsError::EmptyRegion`] if it is but lists no country.
    pub fn country_options(&self, region: &str) -> Result<CountryOptions, AnalyticsError> {
        let index = self
            .by_region
            .get(region)
            .ok_or_else(|| AnalyticsError::UnknownRegion {
                region: region.to_string(),
            })?;

        let default = index
            .countries
            .first()
            .cloned()
            .ok_or_else(|| AnalyticsError::EmptyRegion {
                region: region.to_string(),
            })?;

        Ok(CountryOptions {
            region: region.to_string(),
            countries: index.countries.clone(),
            default,
        })
    }

    /// Reference coordinate used to centre the map on `country`: the first
    /// row of that country carrying both latitude and longitude.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::LocationNotFound`] if `country` is empty,
    /// unknown, or never has coordinates.
    pub fn location_of(&self, country: &str) -> Result<Coordinates, AnalyticsError> {
        self.country_locations
            .get(country)
            .copied()
            .ok_or_else(|| AnalyticsError::LocationNotFound {
                country: country.to_string(),
            })
    }

    /// Recomputes every view for `selection`.
    #[must_use]
    pub fn snapshot(&self, selection: &Selection) -> DashboardSnapshot {
        let center = match self.location_of(&selection.country) {
            Ok(coords) => Some(coords),
            Err(e) => {
                log::debug!("Map falls back to default view: {e}");
                None
            }
        };

        DashboardSnapshot {
            selection: selection.clone(),
            series: self.series_by_year(selection),
            totals: self.totals(selection),
            locations: self.series_by_location(selection),
            center,
        }
    }
}

#[cfg(test)]
mod tests {
    use gtd_dataset::progress::null_progress;
    use gtd_dataset::{DatasetDefinition, read_table};

    use super::*;

    #[allow(clippy::too_many_arguments)]
    fn record(
        region: &str,
        country: &str,
        city: Option<&str>,
        year: i32,
        coords: Option<(f64, f64)>,
        killed: f64,
        wounded: f64,
        attack: u32,
    ) -> IncidentRecord {
        IncidentRecord {
            region: region.to_string(),
            country: country.to_string(),
            province: city.map(|c| format!("{c} Province")),
            city: city.map(ToString::to_string),
            year,
            latitude: coords.map(|c| c.0),
            longitude: coords.map(|c| c.1),
            killed,
            wounded,
            attack_type_code: attack,
        }
    }

    fn sample_engine() -> AggregationEngine {
        let delhi = Some((28.6, 77.2));
        let mumbai = Some((19.0, 72.8));
        let karachi = Some((24.8, 67.0));
        let lima = Some((-12.0, -77.0));
        AggregationEngine::new(IncidentTable::from_records(vec![
            record("South Asia", "India", Some("Delhi"), 2015, delhi, 3.0, 5.0, 1),
            record("South Asia", "Pakistan", Some("Karachi"), 2012, karachi, 4.0, 1.0, 3),
            record("South Asia", "India", Some("Mumbai"), 2008, mumbai, 10.0, 20.0, 2),
            record("South America", "Peru", Some("Lima"), 1985, lima, 1.0, 0.0, 3),
            record("South Asia", "India", Some("Delhi"), 2015, delhi, 2.0, 0.0, 1),
            record("South Asia", "India", None, 2016, None, 1.0, 1.0, 9),
            record("South Asia", "India", Some("Mumbai"), 2015, mumbai, 0.0, 2.0, 3),
            record("South America", "Peru", Some("Lima"), 1990, lima, 0.0, 0.0, 2),
        ]))
    }

    fn selection(region: &str, country: &str, from: i32, to: i32) -> Selection {
        Selection::new(region, country, YearRange::new(from, to))
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn two_rows_same_year_collapse_into_one_point() {
        let engine = AggregationEngine::new(IncidentTable::from_records(vec![
            record("South Asia", "India", None, 2015, None, 3.0, 5.0, 1),
            record("South Asia", "India", None, 2015, None, 2.0, 0.0, 1),
        ]));

        let series = engine.series_by_year(&selection("South Asia", "India", 2015, 2015));
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].year, 2015);
        assert_close(series[0].measures.killed, 5.0);
        assert_close(series[0].measures.wounded, 5.0);
        assert_eq!(series[0].measures.attack_count, 2);
    }

    #[test]
    fn series_is_ascending_and_within_range() {
        let engine = sample_engine();
        let series = engine.series_by_year(&selection("South Asia", "India", 2010, 2017));
        let years: Vec<i32> = series.iter().map(|p| p.year).collect();
        assert_eq!(years, vec![2015, 2016]);

        let all = engine.series_by_year(&selection("South Asia", "India", 1900, 2100));
        let years: Vec<i32> = all.iter().map(|p| p.year).collect();
        assert_eq!(years, vec![2008, 2015, 2016]);
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let engine = sample_engine();
        let series = engine.series_by_year(&selection("South Asia", "India", 2008, 2015));
        let years: Vec<i32> = series.iter().map(|p| p.year).collect();
        assert_eq!(years, vec![2008, 2015]);
    }

    #[test]
    fn country_outside_region_yields_empty_results() {
        let engine = sample_engine();
        let mismatch = selection("South America", "India", 1970, 2017);
        assert!(engine.series_by_year(&mismatch).is_empty());
        assert!(engine.series_by_location(&mismatch).is_empty());
        assert_eq!(engine.totals(&mismatch), Measures::ZERO);
    }

    #[test]
    fn unknown_names_yield_empty_results() {
        let engine = sample_engine();
        let unknown = selection("Atlantis", "Nowhere", 1970, 2017);
        assert!(engine.series_by_year(&unknown).is_empty());
        assert!(engine.series_by_location(&unknown).is_empty());
        assert_eq!(engine.totals(&unknown), Measures::ZERO);
    }

    #[test]
    fn inverted_range_yields_empty_results() {
        let engine = sample_engine();
        let inverted = selection("South Asia", "India", 2017, 2010);
        assert!(engine.series_by_year(&inverted).is_empty());
        assert!(engine.series_by_location(&inverted).is_empty());
        assert_eq!(engine.totals(&inverted), Measures::ZERO);
    }

    #[test]
    fn totals_equal_sum_of_year_series() {
        let engine = sample_engine();
        for sel in [
            selection("South Asia", "India", 1970, 2017),
            selection("South Asia", "India", 2015, 2016),
            selection("South Asia", "Pakistan", 2010, 2017),
            selection("South America", "Peru", 1980, 1989),
        ] {
            let series_sum: Measures = engine
                .series_by_year(&sel)
                .iter()
                .map(|p| p.measures)
                .sum();
            let totals = engine.totals(&sel);
            assert_close(totals.killed, series_sum.killed);
            assert_close(totals.wounded, series_sum.wounded);
            assert_eq!(totals.attack_count, series_sum.attack_count);
            assert_eq!(totals.incidents, series_sum.incidents);
        }
    }

    #[test]
    fn totals_over_selection() {
        let engine = sample_engine();
        let totals = engine.totals(&selection("South Asia", "India", 2010, 2017));
        assert_close(totals.killed, 6.0);
        assert_close(totals.wounded, 8.0);
        assert_eq!(totals.attack_count, 1 + 1 + 9 + 3);
        assert_eq!(totals.incidents, 4);
    }

    #[test]
    fn locations_group_by_location_year_in_first_appearance_order() {
        let engine = sample_engine();
        let points = engine.series_by_location(&selection("South Asia", "India", 1970, 2017));
        let keys: Vec<(&str, i32)> = points.iter().map(|p| (p.city.as_str(), p.year)).collect();
        assert_eq!(keys, vec![("Delhi", 2015), ("Mumbai", 2008), ("Mumbai", 2015)]);

        let delhi = &points[0];
        assert_eq!(delhi.province, "Delhi Province");
        assert_close(delhi.measures.killed, 5.0);
        assert_close(delhi.measures.wounded, 5.0);
        assert_eq!(delhi.measures.incidents, 2);
        assert_close(delhi.latitude, 28.6);
    }

    #[test]
    fn rows_without_location_count_toward_years_but_not_map() {
        let engine = sample_engine();
        let sel = selection("South Asia", "India", 2016, 2016);
        assert_eq!(engine.series_by_year(&sel).len(), 1);
        assert!(engine.series_by_location(&sel).is_empty());
    }

    #[test]
    fn location_results_stay_within_range() {
        let engine = sample_engine();
        let range = YearRange::new(2010, 2015);
        let points = engine.series_by_location(&Selection::new("South Asia", "India", range));
        assert!(!points.is_empty());
        assert!(points.iter().all(|p| range.contains(p.year)));
    }

    #[test]
    fn negative_zero_coordinates_share_a_group() {
        let engine = AggregationEngine::new(IncidentTable::from_records(vec![
            record("Sub-Saharan Africa", "Ghana", Some("Accra"), 2000, Some((0.0, -0.0)), 1.0, 0.0, 1),
            record("Sub-Saharan Africa", "Ghana", Some("Accra"), 2000, Some((-0.0, 0.0)), 1.0, 0.0, 1),
        ]));
        let points =
            engine.series_by_location(&selection("Sub-Saharan Africa", "Ghana", 2000, 2000));
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].measures.incidents, 2);
    }

    #[test]
    fn countries_follow_first_appearance_and_stay_in_region() {
        let engine = sample_engine();
        assert_eq!(engine.countries_in_region("South Asia"), ["India", "Pakistan"]);
        assert_eq!(engine.countries_in_region("South America"), ["Peru"]);
        assert!(!engine.countries_in_region("South Asia").contains(&"Peru".to_string()));
        assert!(engine.countries_in_region("Atlantis").is_empty());
    }

    #[test]
    fn country_options_default_to_first_country() {
        let engine = sample_engine();
        let options = engine.country_options("South Asia").unwrap();
        assert_eq!(options.default, "India");
        assert_eq!(options.countries, vec!["India", "Pakistan"]);
        assert_eq!(
            engine.country_options("Atlantis"),
            Err(AnalyticsError::UnknownRegion {
                region: "Atlantis".to_string()
            })
        );
    }

    #[test]
    fn regions_follow_first_appearance() {
        let engine = sample_engine();
        assert_eq!(engine.regions(), ["South Asia", "South America"]);
    }

    #[test]
    fn location_of_uses_first_row_with_coordinates() {
        let engine = sample_engine();
        let india = engine.location_of("India").unwrap();
        assert_close(india.latitude, 28.6);
        assert_close(india.longitude, 77.2);
    }

    #[test]
    fn location_of_missing_country_is_not_found() {
        let engine = sample_engine();
        assert!(matches!(
            engine.location_of(""),
            Err(AnalyticsError::LocationNotFound { .. })
        ));
        assert!(matches!(
            engine.location_of("Atlantis"),
            Err(AnalyticsError::LocationNotFound { .. })
        ));
    }

    #[test]
    fn year_bounds_cover_table() {
        let engine = sample_engine();
        assert_eq!(engine.year_bounds(), Some(YearRange::new(1985, 2016)));
        let empty = AggregationEngine::new(IncidentTable::default());
        assert_eq!(empty.year_bounds(), None);
        assert!(empty.regions().is_empty());
    }

    #[test]
    fn queries_are_idempotent() {
        let engine = sample_engine();
        let sel = selection("South Asia", "India", 2008, 2016);
        assert_eq!(engine.series_by_year(&sel), engine.series_by_year(&sel));
        assert_eq!(engine.series_by_location(&sel), engine.series_by_location(&sel));
        assert_eq!(engine.totals(&sel), engine.totals(&sel));
        assert_eq!(engine.snapshot(&sel), engine.snapshot(&sel));
    }

    #[test]
    fn snapshot_bundles_every_view() {
        let engine = sample_engine();
        let sel = selection("South Asia", "India", 2010, 2017);
        let snapshot = engine.snapshot(&sel);
        assert_eq!(snapshot.selection, sel);
        assert_eq!(snapshot.series, engine.series_by_year(&sel));
        assert_eq!(snapshot.totals, engine.totals(&sel));
        assert_eq!(snapshot.locations, engine.series_by_location(&sel));
        assert!(snapshot.center.is_some());
    }

    #[test]
    fn snapshot_without_location_has_no_center() {
        let engine = sample_engine();
        let snapshot = engine.snapshot(&selection("South Asia", "", 2010, 2017));
        assert!(snapshot.center.is_none());
        assert!(snapshot.series.is_empty());
    }

    #[test]
    fn missing_measures_contribute_zero_after_load() {
        let csv = "iyear,country_txt,region_txt,provstate,city,latitude,longitude,attacktype1,nkill,nwound\n\
                   2015,India,South Asia,Delhi,New Delhi,28.6,77.2,1,3,5\n\
                   2015,India,South Asia,Delhi,New Delhi,28.6,77.2,1,2,\n\
                   2015,India,South Asia,Delhi,New Delhi,28.6,77.2,,,\n\
                   2015,India,South Asia,Delhi,New Delhi,28.6,77.2,1,NAN,inf\n";
        let table = read_table(
            csv.as_bytes(),
            &DatasetDefinition::embedded().unwrap(),
            &null_progress(),
        )
        .unwrap();
        let engine = AggregationEngine::new(table);
        let sel = selection("South Asia", "India", 2015, 2015);

        let series = engine.series_by_year(&sel);
        assert_eq!(series.len(), 1);
        assert_close(series[0].measures.killed, 5.0);
        assert_close(series[0].measures.wounded, 5.0);
        assert_eq!(series[0].measures.attack_count, 3);
        assert_eq!(series[0].measures.incidents, 4);
        assert_close(engine.totals(&sel).killed, 5.0);

        let locations = engine.series_by_location(&sel);
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].measures.attack_count, 3);
        assert_close(locations[0].measures.wounded, 5.0);
    }

    #[test]
    fn engine_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AggregationEngine>();
    }
}
