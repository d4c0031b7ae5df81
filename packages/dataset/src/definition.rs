//! Config-driven dataset definition.
//!
//! [`DatasetDefinition`] describes where the incident file lives, how it is
//! encoded, and which header carries each canonical field. The default
//! Global Terrorism Database definition is baked into the binary from
//! `datasets/gtd.toml`; a user-supplied TOML file can replace it.

use std::path::{Path, PathBuf};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

use crate::DatasetError;

/// Default definition, embedded at compile time.
const GTD_TOML: &str = include_str!("../datasets/gtd.toml");

/// A complete dataset definition.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetDefinition {
    /// Short identifier used in log lines (e.g. `"gtd"`).
    pub id: String,
    /// Human-readable dataset name.
    pub name: String,
    /// Path to the delimited incident file.
    pub path: PathBuf,
    /// Field delimiter: a single ASCII character.
    #[serde(
        default = "default_delimiter",
        deserialize_with = "deserialize_delimiter"
    )]
    pub delimiter: String,
    /// Compression format (`"gzip"` or `None`). Files ending in `.gz` are
    /// treated as gzip regardless.
    #[serde(default)]
    pub compressed: Option<String>,
    /// Header names for each canonical field.
    #[serde(default)]
    pub columns: ColumnMapping,
    /// Initial dashboard selection.
    #[serde(default)]
    pub defaults: SelectionDefaults,
}

fn default_delimiter() -> String {
    ",".to_string()
}

fn deserialize_delimiter<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = String::deserialize(deserializer)?;
    if value.len() == 1 && value.is_ascii() {
        Ok(value)
    } else {
        Err(D::Error::custom(format!(
            "delimiter must be a single ASCII character, got {value:?}"
        )))
    }
}

/// Maps each canonical incident field to the header name in the file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub region: String,
    pub country: String,
    pub province: String,
    pub city: String,
    pub year: String,
    pub latitude: String,
    pub longitude: String,
    pub killed: String,
    pub wounded: String,
    pub attack_type: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            region: "region_txt".to_string(),
            country: "country_txt".to_string(),
            province: "provstate".to_string(),
            city: "city".to_string(),
            year: "iyear".to_string(),
            latitude: "latitude".to_string(),
            longitude: "longitude".to_string(),
            killed: "nkill".to_string(),
            wounded: "nwound".to_string(),
            attack_type: "attacktype1".to_string(),
        }
    }
}

/// The selection shown before the user touches any input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectionDefaults {
    /// Region preselected in the region dropdown.
    pub region: Option<String>,
    /// Lower end of the year slider.
    pub year_from: Option<i32>,
    /// Upper end of the year slider.
    pub year_to: Option<i32>,
}

/// Parses a dataset definition from a TOML string.
///
/// # Errors
///
/// Returns [`DatasetError::Config`] if the TOML is malformed or a required
/// key (`id`, `name`, `path`) is missing.
pub fn parse_dataset_toml(toml_str: &str) -> Result<DatasetDefinition, DatasetError> {
    Ok(toml::from_str(toml_str)?)
}

impl DatasetDefinition {
    /// The embedded Global Terrorism Database definition.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Config`] if the embedded TOML is malformed.
    pub fn embedded() -> Result<Self, DatasetError> {
        parse_dataset_toml(GTD_TOML)
    }

    /// Reads a definition from a TOML file on disk.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, DatasetError> {
        let contents = std::fs::read_to_string(path)?;
        parse_dataset_toml(&contents)
    }

    /// Replaces the input file path, keeping everything else.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// The delimiter as a byte. Definitions read from TOML always hold a
    /// single ASCII character; a delimiter set in code falls back to `,`
    /// when empty and otherwise uses its first byte.
    #[must_use]
    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter.as_bytes().first().copied().unwrap_or(b',')
    }

    #[must_use]
    pub fn is_gzipped(&self) -> bool {
        self.compressed.as_deref() == Some("gzip")
            || self
                .path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_definition_parses() {
        let def = DatasetDefinition::embedded().unwrap();
        assert_eq!(def.id, "gtd");
        assert_eq!(def.columns.year, "iyear");
        assert_eq!(def.columns.attack_type, "attacktype1");
        assert_eq!(def.defaults.region.as_deref(), Some("South Asia"));
        assert_eq!(def.defaults.year_from, Some(2010));
        assert_eq!(def.defaults.year_to, Some(2017));
        assert!(!def.is_gzipped());
    }

    #[test]
    fn partial_column_table_falls_back_to_defaults() {
        let def = parse_dataset_toml(
            r#"
            id = "custom"
            name = "Custom"
            path = "incidents.tsv"
            delimiter = "\t"

            [columns]
            year = "year"
            "#,
        )
        .unwrap();
        assert_eq!(def.columns.year, "year");
        assert_eq!(def.columns.region, "region_txt");
        assert_eq!(def.delimiter_byte(), b'\t');
        assert!(def.defaults.region.is_none());
    }

    #[test]
    fn missing_path_is_a_config_error() {
        let err = parse_dataset_toml("id = \"x\"\nname = \"x\"").unwrap_err();
        assert!(matches!(err, DatasetError::Config(_)));
    }

    #[test]
    fn gz_extension_implies_gzip() {
        let def = DatasetDefinition::embedded()
            .unwrap()
            .with_path("data/global_terrorism.csv.gz");
        assert!(def.is_gzipped());
    }

    #[test]
    fn non_ascii_or_multi_char_delimiter_is_a_config_error() {
        for delimiter in ["§", ";;", ""] {
            let toml = format!(
                "id = \"x\"\nname = \"x\"\npath = \"x.csv\"\ndelimiter = \"{delimiter}\"\n"
            );
            let err = parse_dataset_toml(&toml).unwrap_err();
            assert!(matches!(err, DatasetError::Config(_)), "{delimiter:?}: {err}");
        }
    }

    #[test]
    fn empty_delimiter_defaults_to_comma() {
        let mut def = DatasetDefinition::embedded().unwrap();
        def.delimiter = String::new();
        assert_eq!(def.delimiter_byte(), b',');
    }
}
