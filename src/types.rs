use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Declared angle convention of a source. Never auto-detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleUnit {
    Degrees,
    Radians,
}

/// How a source expresses orbit size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementRepresentation {
    SemiMajorAxisMeters,
    MeanMotionRevPerDay,
}

/// Coarse orbit regime carried in the `OrbitType` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrbitClass {
    #[serde(rename = "LEO")]
    Leo,
    #[serde(rename = "MEO")]
    Meo,
    #[serde(rename = "GEO")]
    Geo,
    #[serde(rename = "HEO")]
    Heo,
}

impl OrbitClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrbitClass::Leo => "LEO",
            OrbitClass::Meo => "MEO",
            OrbitClass::Geo => "GEO",
            OrbitClass::Heo => "HEO",
        }
    }
}

impl fmt::Display for OrbitClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Orbital elements in canonical units: meters and radians.
///
/// `None` means the source cell was absent or could not be converted; such a
/// record fails the validity filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrbitalElements {
    pub sma_m: Option<f64>,
    pub ecc: Option<f64>,
    pub inc_rad: Option<f64>,
    pub raan_rad: Option<f64>,
    pub argp_rad: Option<f64>,
    pub mean_anom_rad: Option<f64>,
}

/// One row from one source after unit normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawOrbitalRecord {
    pub source_id: String,
    /// Grouping key, already trimmed and canonicalized
    pub object_id: Option<String>,
    pub epoch: Option<String>,
    pub elements: OrbitalElements,
    pub orbit_class: Option<OrbitClass>,
    /// Pass-through metadata keyed by output column name, never validated
    pub descriptive: BTreeMap<String, String>,
}

impl RawOrbitalRecord {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            object_id: None,
            epoch: None,
            elements: OrbitalElements::default(),
            orbit_class: None,
            descriptive: BTreeMap::new(),
        }
    }

    pub fn descriptive_field(&self, column: &str) -> &str {
        self.descriptive.get(column).map(String::as_str).unwrap_or("")
    }
}

/// Maps a `sourceId` to its display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSourceDescriptor {
    pub code: String,
    pub name: String,
}
