#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident record, measure, and attack-type taxonomy types.
//!
//! These types describe a single row of the incident table after load-time
//! normalization, and the additive [`Measures`] that every aggregate view
//! sums over. They are shared by the loader, the aggregation engine, and
//! the API layer.

use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Primary attack type, as coded in the incident table's attack-type column.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AttackType {
    /// Code 1
    Assassination = 1,
    /// Code 2
    ArmedAssault = 2,
    /// Code 3
    BombingExplosion = 3,
    /// Code 4
    Hijacking = 4,
    /// Code 5
    HostageTakingBarricade = 5,
    /// Code 6
    HostageTakingKidnapping = 6,
    /// Code 7
    FacilityInfrastructureAttack = 7,
    /// Code 8
    UnarmedAssault = 8,
    /// Code 9
    Unknown = 9,
}

impl AttackType {
    /// Returns the numeric code of this attack type.
    #[must_use]
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Maps a numeric attack-type code to its variant.
    ///
    /// Returns `None` for `0` (the zero-filled "missing" code) and for codes
    /// outside the taxonomy.
    #[must_use]
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Assassination),
            2 => Some(Self::ArmedAssault),
            3 => Some(Self::BombingExplosion),
            4 => Some(Self::Hijacking),
            5 => Some(Self::HostageTakingBarricade),
            6 => Some(Self::HostageTakingKidnapping),
            7 => Some(Self::FacilityInfrastructureAttack),
            8 => Some(Self::UnarmedAssault),
            9 => Some(Self::Unknown),
            _ => None,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Assassination => "Assassination",
            Self::ArmedAssault => "Armed Assault",
            Self::BombingExplosion => "Bombing/Explosion",
            Self::Hijacking => "Hijacking",
            Self::HostageTakingBarricade => "Hostage Taking (Barricade Incident)",
            Self::HostageTakingKidnapping => "Hostage Taking (Kidnapping)",
            Self::FacilityInfrastructureAttack => "Facility/Infrastructure Attack",
            Self::UnarmedAssault => "Unarmed Assault",
            Self::Unknown => "Unknown",
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Assassination,
            Self::ArmedAssault,
            Self::BombingExplosion,
            Self::Hijacking,
            Self::HostageTakingBarricade,
            Self::HostageTakingKidnapping,
            Self::FacilityInfrastructureAttack,
            Self::UnarmedAssault,
            Self::Unknown,
        ]
    }
}

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

/// An inclusive range of years.
///
/// A range with `from > to` is representable; it simply contains no year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearRange {
    /// First year (inclusive).
    pub from: i32,
    /// Last year (inclusive).
    pub to: i32,
}

impl YearRange {
    #[must_use]
    pub const fn new(from: i32, to: i32) -> Self {
        Self { from, to }
    }

    /// A range covering exactly one year.
    #[must_use]
    pub const fn single(year: i32) -> Self {
        Self {
            from: year,
            to: year,
        }
    }

    /// Returns `true` when `from <= to`.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.from <= self.to
    }

    #[must_use]
    pub const fn contains(&self, year: i32) -> bool {
        self.from <= year && year <= self.to
    }

    /// Widens this range so that it also covers `year`.
    #[must_use]
    pub fn including(self, year: i32) -> Self {
        Self {
            from: self.from.min(year),
            to: self.to.max(year),
        }
    }
}

impl std::fmt::Display for YearRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.from, self.to)
    }
}

/// The additive quantities summed by every aggregate view.
///
/// `attack_count` is the sum of the attack-type codes of the contributing
/// rows, which is what the dashboard's "Attack" series plots. `incidents`
/// is the number of contributing rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measures {
    /// Number of people killed.
    pub killed: f64,
    /// Number of people wounded.
    pub wounded: f64,
    /// Sum of attack-type codes.
    pub attack_count: u64,
    /// Number of incident rows.
    pub incidents: u64,
}

impl Measures {
    /// Measures with every quantity at zero.
    pub const ZERO: Self = Self {
        killed: 0.0,
        wounded: 0.0,
        attack_count: 0,
        incidents: 0,
    };

    /// Returns `true` if no row contributed to these measures.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.incidents == 0
    }
}

impl AddAssign for Measures {
    fn add_assign(&mut self, rhs: Self) {
        self.killed += rhs.killed;
        self.wounded += rhs.wounded;
        self.attack_count += rhs.attack_count;
        self.incidents += rhs.incidents;
    }
}

impl Add for Measures {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl std::iter::Sum for Measures {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

/// One incident row after load-time normalization.
///
/// Missing numeric measures have already been replaced by zero. Text fields
/// that form the location key stay optional because a row without them
/// still counts toward the per-year views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentRecord {
    /// Region name (e.g. "South Asia").
    pub region: String,
    /// Country name (e.g. "India").
    pub country: String,
    /// Sub-national province or state.
    pub province: Option<String>,
    /// City name.
    pub city: Option<String>,
    /// Year the incident occurred.
    pub year: i32,
    /// Latitude, if recorded.
    pub latitude: Option<f64>,
    /// Longitude, if recorded.
    pub longitude: Option<f64>,
    /// Number killed (zero when not recorded).
    pub killed: f64,
    /// Number wounded (zero when not recorded).
    pub wounded: f64,
    /// Attack-type code (zero when not recorded).
    pub attack_type_code: u32,
}

impl IncidentRecord {
    /// Returns the recorded coordinates if both latitude and longitude are
    /// present.
    #[must_use]
    pub const fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }

    #[must_use]
    pub const fn attack_type(&self) -> Option<AttackType> {
        AttackType::from_code(self.attack_type_code)
    }

    /// The measures this single row contributes to any aggregate.
    #[must_use]
    pub fn measures(&self) -> Measures {
        Measures {
            killed: self.killed,
            wounded: self.wounded,
            attack_count: u64::from(self.attack_type_code),
            incidents: 1,
        }
    }
}
