//! Unit and angle normalization.
//!
//! Sources disagree on orbit size (mean motion vs. semi-major axis) and on
//! angle units. Everything leaving this module is meters and radians.

pub mod registry;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f64::consts::PI;

use crate::constants::{
    FIELD_ARGP, FIELD_ECC, FIELD_EPOCH, FIELD_INC, FIELD_MEAN_ANOM, FIELD_MEAN_MOTION, FIELD_NORAD_ID,
    FIELD_ORBIT_CLASS, FIELD_RAAN, FIELD_SMA, MU_EARTH, PASS_THROUGH_FIELDS, SECONDS_PER_DAY,
};
use crate::pipeline::processing::parser::RawRow;
use crate::types::{AngleUnit, ElementRepresentation, OrbitClass, OrbitalElements, RawOrbitalRecord};

pub use registry::NormalizationRegistry;

/// Semi-major axis in meters from mean motion in rev/day.
///
/// Returns `None` for a non-finite or non-positive rate so the record is
/// rejected downstream instead of carrying a zero or NaN axis.
pub fn sma_from_mean_motion(rev_per_day: f64) -> Option<f64> {
    if !rev_per_day.is_finite() || rev_per_day <= 0.0 {
        return None;
    }
    let omega = rev_per_day * 2.0 * PI / SECONDS_PER_DAY;
    Some((MU_EARTH / (omega * omega)).cbrt())
}

/// Degrees to radians. Missing or non-finite input becomes `0.0`.
pub fn degrees_to_radians(degrees: Option<f64>) -> f64 {
    match degrees {
        Some(d) if d.is_finite() => d * PI / 180.0,
        _ => 0.0,
    }
}

/// `L`, `M`, `G`, `H` map to a class; anything else is unclassified.
pub fn orbit_class_from_letter(letter: &str) -> Option<OrbitClass> {
    match letter.trim() {
        "L" => Some(OrbitClass::Leo),
        "M" => Some(OrbitClass::Meo),
        "G" => Some(OrbitClass::Geo),
        "H" => Some(OrbitClass::Heo),
        _ => None,
    }
}

/// Trim and parse a numeric cell; blank or unparsable cells are `None`.
pub fn parse_number(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Trim a catalog number; all-digit ids lose their leading zeros.
pub fn normalize_object_id(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.bytes().all(|b| b.is_ascii_digit()) {
        let stripped = trimmed.trim_start_matches('0');
        return Some(if stripped.is_empty() { "0".to_string() } else { stripped.to_string() });
    }
    Some(trimmed.to_string())
}

/// Per-source conventions, declared in configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConventions {
    pub angle_unit: AngleUnit,
    pub element_representation: ElementRepresentation,
    /// Canonical field name -> header token used by this source
    #[serde(default)]
    pub columns: HashMap<String, String>,
}

impl SourceConventions {
    pub fn new(angle_unit: AngleUnit, element_representation: ElementRepresentation) -> Self {
        Self {
            angle_unit,
            element_representation,
            columns: HashMap::new(),
        }
    }

    pub fn with_column(mut self, canonical: &str, header: &str) -> Self {
        self.columns.insert(canonical.to_string(), header.to_string());
        self
    }

    fn header_for<'a>(&'a self, canonical: &'a str) -> &'a str {
        self.columns.get(canonical).map(String::as_str).unwrap_or(canonical)
    }
}

/// Turns loaded rows of one source into canonical records
#[derive(Debug, Clone)]
pub struct RecordNormalizer {
    source_id: String,
    conventions: SourceConventions,
}

impl RecordNormalizer {
    pub fn new(source_id: impl Into<String>, conventions: SourceConventions) -> Self {
        Self {
            source_id: source_id.into(),
            conventions,
        }
    }

    fn field<'r>(&self, row: &'r RawRow, canonical: &str) -> Option<&'r str> {
        row.get(self.conventions.header_for(canonical))
    }

    fn number(&self, row: &RawRow, canonical: &str) -> Option<f64> {
        self.field(row, canonical).and_then(parse_number)
    }

    /// Missing or non-finite angles become zero in either unit.
    fn angle(&self, row: &RawRow, canonical: &str) -> Option<f64> {
        let raw = self.number(row, canonical);
        match self.conventions.angle_unit {
            AngleUnit::Degrees => Some(degrees_to_radians(raw)),
            AngleUnit::Radians => Some(raw.filter(|v| v.is_finite()).unwrap_or(0.0)),
        }
    }

    pub fn normalize(&self, row: &RawRow) -> RawOrbitalRecord {
        let sma_m = match self.conventions.element_representation {
            ElementRepresentation::MeanMotionRevPerDay => {
                self.number(row, FIELD_MEAN_MOTION).and_then(sma_from_mean_motion)
            }
            ElementRepresentation::SemiMajorAxisMeters => self.number(row, FIELD_SMA),
        };

        let elements = OrbitalElements {
            sma_m,
            ecc: self.number(row, FIELD_ECC),
            inc_rad: self.angle(row, FIELD_INC),
            raan_rad: self.angle(row, FIELD_RAAN),
            argp_rad: self.angle(row, FIELD_ARGP),
            mean_anom_rad: self.angle(row, FIELD_MEAN_ANOM),
        };

        let epoch = self
            .field(row, FIELD_EPOCH)
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string);

        let descriptive = PASS_THROUGH_FIELDS
            .iter()
            .filter_map(|&column| {
                self.field(row, column)
                    .map(|value| (column.to_string(), value.to_string()))
            })
            .collect();

        RawOrbitalRecord {
            source_id: self.source_id.clone(),
            object_id: self.field(row, FIELD_NORAD_ID).and_then(normalize_object_id),
            epoch,
            elements,
            orbit_class: self.field(row, FIELD_ORBIT_CLASS).and_then(orbit_class_from_letter),
            descriptive,
        }
    }
}
