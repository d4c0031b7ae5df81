#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident table loading and load-time normalization.
//!
//! A [`DatasetDefinition`] (TOML) names the input file and maps each
//! canonical field to a header in that file. [`load_table`] reads the file
//! once, zero-fills missing numeric measures, drops rows that cannot form a
//! grouping key, and returns an immutable [`IncidentTable`].

pub mod definition;
pub mod loader;
pub mod parsing;
pub mod progress;

use std::path::PathBuf;

use gtd_incident_models::{IncidentRecord, YearRange};
use thiserror::Error;

pub use definition::DatasetDefinition;
pub use loader::{load_table, read_table};

/// Errors that can occur while loading the incident table.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The input file could not be opened.
    #[error("Failed to open {}: {source}", .path.display())]
    Open {
        /// Path that was opened.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// I/O error (config file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed delimited data.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Malformed dataset definition.
    #[error("Invalid dataset definition: {0}")]
    Config(#[from] toml::de::Error),

    /// A required column is absent from the header row.
    #[error("Missing required column '{column}'")]
    MissingColumn {
        /// Header name that was expected.
        column: String,
    },

    /// The file parsed but no row could be admitted.
    #[error("Dataset '{dataset}' contains no usable incident rows")]
    Empty {
        /// Dataset identifier.
        dataset: String,
    },
}

/// The normalized incident table.
///
/// Constructed once and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct IncidentTable {
    records: Vec<IncidentRecord>,
    skipped_rows: u64,
    invalid_values: u64,
}

impl IncidentTable {
    /// Wraps already-normalized records.
    #[must_use]
    pub const fn from_records(records: Vec<IncidentRecord>) -> Self {
        Self {
            records,
            skipped_rows: 0,
            invalid_values: 0,
        }
    }

    pub(crate) const fn with_load_stats(
        records: Vec<IncidentRecord>,
        skipped_rows: u64,
        invalid_values: u64,
    ) -> Self {
        Self {
            records,
            skipped_rows,
            invalid_values,
        }
    }

    /// Records in source file order.
    #[must_use]
    pub fn records(&self) -> &[IncidentRecord] {
        &self.records
    }

    /// Number of admitted incidents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when no incident was admitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows dropped at load time because year, region, or country was
    /// missing.
    #[must_use]
    pub const fn skipped_rows(&self) -> u64 {
        self.skipped_rows
    }

    /// Numeric cells that were present but unparseable (treated as zero).
    #[must_use]
    pub const fn invalid_values(&self) -> u64 {
        self.invalid_values
    }

    /// The observed `[min(year), max(year)]`, or `None` for an empty table.
    #[must_use]
    pub fn year_bounds(&self) -> Option<YearRange> {
        let mut iter = self.records.iter().map(|r| r.year);
        let first = iter.next()?;
        Some(iter.fold(YearRange::single(first), YearRange::including))
    }
}
