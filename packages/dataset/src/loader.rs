//! Delimited-file reader and load-time normalization.
//!
//! Reads the incident file in a single pass. Each row is normalized once:
//! missing numeric measures become zero, text is decoded lossily, and rows
//! without a year, region, or country are dropped because they cannot take
//! part in any grouping key.

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, Read};
use std::sync::Arc;
use std::time::Instant;

use csv::ByteRecord;
use gtd_incident_models::IncidentRecord;

use crate::definition::{ColumnMapping, DatasetDefinition};
use crate::parsing::{
    InvalidNumber, parse_nullable_code, parse_nullable_f64, parse_nullable_measure, parse_text,
    parse_year,
};
use crate::progress::ProgressCallback;
use crate::{DatasetError, IncidentTable};

/// Rows between progress updates.
const PROGRESS_BATCH: u64 = 10_000;

/// Resolved header positions for every canonical field.
#[derive(Debug, Clone, Copy)]
struct ColumnIndexes {
    region: usize,
    country: usize,
    province: usize,
    city: usize,
    year: usize,
    latitude: usize,
    longitude: usize,
    killed: usize,
    wounded: usize,
    attack_type: usize,
}

impl ColumnIndexes {
    fn resolve(headers: &ByteRecord, columns: &ColumnMapping) -> Result<Self, DatasetError> {
        let names: Vec<String> = headers
            .iter()
            .map(|h| {
                String::from_utf8_lossy(h)
                    .trim()
                    .trim_start_matches('\u{feff}')
                    .to_string()
            })
            .collect();

        let find = |column: &str| {
            names
                .iter()
                .position(|name| name == column)
                .ok_or_else(|| DatasetError::MissingColumn {
                    column: column.to_string(),
                })
        };

        Ok(Self {
            region: find(&columns.region)?,
            country: find(&columns.country)?,
            province: find(&columns.province)?,
            city: find(&columns.city)?,
            year: find(&columns.year)?,
            latitude: find(&columns.latitude)?,
            longitude: find(&columns.longitude)?,
            killed: find(&columns.killed)?,
            wounded: find(&columns.wounded)?,
            attack_type: find(&columns.attack_type)?,
        })
    }
}

/// Why a row was not admitted to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkipReason {
    MissingYear,
    MissingRegion,
    MissingCountry,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingYear => write!(f, "missing or non-integer year"),
            Self::MissingRegion => write!(f, "missing region"),
            Self::MissingCountry => write!(f, "missing country"),
        }
    }
}

fn cell(record: &ByteRecord, idx: usize) -> Cow<'_, str> {
    String::from_utf8_lossy(record.get(idx).unwrap_or_default())
}

/// Normalizes one row. Unparseable measures are zero-filled and counted in
/// `invalid`.
fn normalize_row(
    record: &ByteRecord,
    cols: ColumnIndexes,
    invalid: &mut u64,
) -> Result<IncidentRecord, SkipReason> {
    let year = parse_year(&cell(record, cols.year)).ok_or(SkipReason::MissingYear)?;
    let region = parse_text(&cell(record, cols.region)).ok_or(SkipReason::MissingRegion)?;
    let country = parse_text(&cell(record, cols.country)).ok_or(SkipReason::MissingCountry)?;

    let killed = zero_fill(parse_nullable_measure(&cell(record, cols.killed)), invalid);
    let wounded = zero_fill(parse_nullable_measure(&cell(record, cols.wounded)), invalid);
    let attack_type_code = zero_fill(parse_nullable_code(&cell(record, cols.attack_type)), invalid);

    // Coordinates are key components, not measures: an unparseable value is
    // absent rather than zero.
    let latitude = parse_nullable_f64(&cell(record, cols.latitude))
        .ok()
        .flatten();
    let longitude = parse_nullable_f64(&cell(record, cols.longitude))
        .ok()
        .flatten();

    Ok(IncidentRecord {
        region,
        country,
        province: parse_text(&cell(record, cols.province)),
        city: parse_text(&cell(record, cols.city)),
        year,
        latitude,
        longitude,
        killed,
        wounded,
        attack_type_code,
    })
}

fn zero_fill<T: Default>(parsed: Result<Option<T>, InvalidNumber>, invalid: &mut u64) -> T {
    match parsed {
        Ok(value) => value.unwrap_or_default(),
        Err(e) => {
            *invalid += 1;
            log::trace!("Zero-filling {e}");
            T::default()
        }
    }
}

/// Wraps `input` in a gzip decoder when requested.
fn decoder<R: Read + 'static>(input: R, gzipped: bool) -> Box<dyn Read> {
    if gzipped {
        Box::new(flate2::read::GzDecoder::new(input))
    } else {
        Box::new(input)
    }
}

/// Loads and normalizes the incident file named by `definition`.
///
/// # Errors
///
/// Returns [`DatasetError`] if the file cannot be opened, is not valid
/// delimited data, lacks a required column, or yields no usable rows.
pub fn load_table(
    definition: &DatasetDefinition,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<IncidentTable, DatasetError> {
    let path = &definition.path;
    log::info!(
        "[{}] Loading {} from {}",
        definition.id,
        definition.name,
        path.display()
    );

    let file = File::open(path).map_err(|source| DatasetError::Open {
        path: path.clone(),
        source,
    })?;

    let input = decoder(BufReader::new(file), definition.is_gzipped());
    read_table(input, definition, progress)
}

/// Reads and normalizes incident rows from any reader.
///
/// # Errors
///
/// Returns [`DatasetError`] if the data is not valid delimited text, lacks
/// a required column, or yields no usable rows.
pub fn read_table<R: Read>(
    input: R,
    definition: &DatasetDefinition,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<IncidentTable, DatasetError> {
    let started = Instant::now();

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(definition.delimiter_byte())
        .flexible(true)
        .from_reader(input);

    let cols = ColumnIndexes::resolve(reader.byte_headers()?, &definition.columns)?;

    progress.set_message(format!("[{}] Reading incidents", definition.id));

    let mut records = Vec::new();
    let mut skipped: u64 = 0;
    let mut invalid: u64 = 0;
    let mut pending: u64 = 0;
    let mut row = ByteRecord::new();

    while reader.read_byte_record(&mut row)? {
        match normalize_row(&row, cols, &mut invalid) {
            Ok(record) => records.push(record),
            Err(reason) => {
                skipped += 1;
                log::debug!(
                    "[{}] Skipping line {}: {reason}",
                    definition.id,
                    row.position().map_or(0, csv::Position::line)
                );
            }
        }

        pending += 1;
        if pending == PROGRESS_BATCH {
            progress.inc(pending);
            pending = 0;
        }
    }
    progress.inc(pending);

    if records.is_empty() {
        return Err(DatasetError::Empty {
            dataset: definition.id.clone(),
        });
    }

    if invalid > 0 {
        log::warn!(
            "[{}] {invalid} numeric cells could not be parsed and were treated as zero",
            definition.id
        );
    }

    log::info!(
        "[{}] Loaded {} incidents ({skipped} rows skipped) in {:.2?}",
        definition.id,
        records.len(),
        started.elapsed()
    );
    progress.finish(format!(
        "[{}] loaded {} incidents",
        definition.id,
        records.len()
    ));

    Ok(IncidentTable::with_load_stats(records, skipped, invalid))
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;
    use crate::progress::null_progress;

    const HEADER: &str =
        "eventid,iyear,country_txt,region_txt,provstate,city,latitude,longitude,attacktype1,nkill,nwound";

    fn definition() -> DatasetDefinition {
        DatasetDefinition::embedded().unwrap()
    }

    fn read(csv_text: &str) -> Result<IncidentTable, DatasetError> {
        read_table(csv_text.as_bytes(), &definition(), &null_progress())
    }

    #[test]
    fn loads_and_zero_fills_missing_measures() {
        let data = format!(
            "{HEADER}\n\
             1,2015,India,South Asia,Delhi,New Delhi,28.6,77.2,1,3,5\n\
             2,2015,India,South Asia,Delhi,New Delhi,28.6,77.2,1,2,\n"
        );
        let table = read(&data).unwrap();
        assert_eq!(table.len(), 2);
        let second = &table.records()[1];
        assert!((second.killed - 2.0).abs() < f64::EPSILON);
        assert!(second.wounded.abs() < f64::EPSILON);
        assert_eq!(second.attack_type_code, 1);
        assert_eq!(table.skipped_rows(), 0);
    }

    #[test]
    fn column_order_does_not_matter() {
        let data = "nwound,nkill,attacktype1,longitude,latitude,city,provstate,region_txt,country_txt,iyear\n\
                    4,1,3,67.0,24.8,Karachi,Sindh,South Asia,Pakistan,2012\n";
        let table = read(data).unwrap();
        let record = &table.records()[0];
        assert_eq!(record.country, "Pakistan");
        assert_eq!(record.year, 2012);
        assert_eq!(record.city.as_deref(), Some("Karachi"));
        assert!((record.wounded - 4.0).abs() < f64::EPSILON);
        assert_eq!(record.attack_type_code, 3);
    }

    #[test]
    fn missing_required_column_fails() {
        let data = "iyear,country_txt,region_txt\n2015,India,South Asia\n";
        let err = read(data).unwrap_err();
        assert!(
            matches!(err, DatasetError::MissingColumn { ref column } if column == "provstate"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn rows_without_key_fields_are_skipped() {
        let data = format!(
            "{HEADER}\n\
             1,,India,South Asia,Delhi,New Delhi,28.6,77.2,1,3,5\n\
             2,2015,,South Asia,Delhi,New Delhi,28.6,77.2,1,3,5\n\
             3,2015,India,,Delhi,New Delhi,28.6,77.2,1,3,5\n\
             4,2015,India,South Asia,,,,,1,3,5\n"
        );
        let table = read(&data).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.skipped_rows(), 3);
        let kept = &table.records()[0];
        assert!(kept.province.is_none());
        assert!(kept.coordinates().is_none());
    }

    #[test]
    fn unparseable_measures_are_counted_and_zeroed() {
        let data = format!("{HEADER}\n1,2015,India,South Asia,Delhi,New Delhi,28.6,77.2,x,many,5\n");
        let table = read(&data).unwrap();
        assert_eq!(table.invalid_values(), 2);
        let record = &table.records()[0];
        assert!(record.killed.abs() < f64::EPSILON);
        assert_eq!(record.attack_type_code, 0);
    }

    #[test]
    fn non_finite_and_negative_measures_contribute_zero() {
        let data = format!(
            "{HEADER}\n\
             1,2015,India,South Asia,Delhi,New Delhi,28.6,77.2,1,NAN,inf\n\
             2,2015,India,South Asia,Delhi,New Delhi,28.6,77.2,1,-5,+nan\n\
             3,2015,India,South Asia,Delhi,New Delhi,28.6,77.2,1,3,2\n"
        );
        let table = read(&data).unwrap();
        assert_eq!(table.len(), 3);
        // "inf" and "-5" are invalid; the NaN spellings are plain missing values.
        assert_eq!(table.invalid_values(), 2);

        let killed: f64 = table.records().iter().map(|r| r.killed).sum();
        let wounded: f64 = table.records().iter().map(|r| r.wounded).sum();
        assert!((killed - 3.0).abs() < f64::EPSILON);
        assert!((wounded - 2.0).abs() < f64::EPSILON);
        assert!(table.records().iter().all(|r| r.killed >= 0.0 && r.wounded >= 0.0));
    }

    #[test]
    fn non_finite_coordinates_are_absent() {
        let data = format!(
            "{HEADER}\n\
             1,2015,India,South Asia,Delhi,New Delhi,NAN,77.2,1,1,1\n\
             2,2015,India,South Asia,Delhi,New Delhi,28.6,inf,1,1,1\n"
        );
        let table = read(&data).unwrap();
        assert!(table.records().iter().all(|r| r.coordinates().is_none()));
        assert_eq!(table.invalid_values(), 0);
    }

    #[test]
    fn header_only_file_is_empty_error() {
        let err = read(&format!("{HEADER}\n")).unwrap_err();
        assert!(matches!(err, DatasetError::Empty { .. }));
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let mut data = format!("{HEADER}\n1,2015,Cote d").into_bytes();
        data.push(0xD4);
        data.extend_from_slice(b"Ivoire,Sub-Saharan Africa,Abidjan,Abidjan,5.3,-4.0,2,1,0\n");
        let table = read_table(data.as_slice(), &definition(), &null_progress()).unwrap();
        assert!(table.records()[0].country.starts_with("Cote d"));
    }

    #[test]
    fn reads_gzip_input() {
        let data = format!("{HEADER}\n1,1999,Peru,South America,Lima,Lima,-12.0,-77.0,3,0,2\n");
        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::fast());
        encoder.write_all(data.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();

        let input = decoder(std::io::Cursor::new(compressed), true);
        let table = read_table(input, &definition(), &null_progress()).unwrap();
        assert_eq!(table.records()[0].country, "Peru");
        assert_eq!(table.year_bounds().unwrap().from, 1999);
    }

    #[test]
    fn custom_delimiter_and_column_names() {
        let mut def = definition();
        def.delimiter = ";".to_string();
        def.columns.year = "year".to_string();
        let data = "year;country_txt;region_txt;provstate;city;latitude;longitude;attacktype1;nkill;nwound\n\
                    2001;United States;North America;New York;New York City;40.7;-74.0;4;100;10\n";
        let table = read_table(data.as_bytes(), &def, &null_progress()).unwrap();
        assert_eq!(table.records()[0].year, 2001);
    }

    #[test]
    fn missing_file_is_open_error() {
        let def = definition().with_path("does/not/exist.csv");
        let err = load_table(&def, &null_progress()).unwrap_err();
        assert!(matches!(err, DatasetError::Open { .. }));
    }

    #[test]
    fn year_bounds_cover_all_rows() {
        let data = format!(
            "{HEADER}\n\
             1,1970,Peru,South America,,,,,1,,\n\
             2,2017,Peru,South America,,,,,1,,\n\
             3,1990,Peru,South America,,,,,1,,\n"
        );
        let bounds = read(&data).unwrap().year_bounds().unwrap();
        assert_eq!((bounds.from, bounds.to), (1970, 2017));
    }
}
