//! Validity filter for normalized records.
//!
//! Only guards against unusable numeric cells. Physical plausibility (an
//! eccentricity above one, say) is left to consumers of the catalog.

use serde::{Deserialize, Serialize};

use crate::types::RawOrbitalRecord;

/// Why a record cannot take part in reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidityIssue {
    MissingSemiMajorAxis,
    NonPositiveSemiMajorAxis,
    NonFiniteElement(ElementField),
    MissingEpoch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementField {
    SemiMajorAxis,
    Eccentricity,
    Inclination,
    Raan,
    ArgumentOfPerigee,
    MeanAnomaly,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Validity {
    Valid,
    Invalid(Vec<ValidityIssue>),
}

impl Validity {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validity::Valid)
    }
}

/// Collect every issue with the record's elements and epoch
pub fn assess(record: &RawOrbitalRecord) -> Validity {
    let mut issues = Vec::new();
    let elements = &record.elements;

    match elements.sma_m {
        None => issues.push(ValidityIssue::MissingSemiMajorAxis),
        Some(sma) if !sma.is_finite() => {
            issues.push(ValidityIssue::NonFiniteElement(ElementField::SemiMajorAxis))
        }
        Some(sma) if sma <= 0.0 => issues.push(ValidityIssue::NonPositiveSemiMajorAxis),
        Some(_) => {}
    }

    let others = [
        (ElementField::Eccentricity, elements.ecc),
        (ElementField::Inclination, elements.inc_rad),
        (ElementField::Raan, elements.raan_rad),
        (ElementField::ArgumentOfPerigee, elements.argp_rad),
        (ElementField::MeanAnomaly, elements.mean_anom_rad),
    ];
    for (field, value) in others {
        if !value.is_some_and(f64::is_finite) {
            issues.push(ValidityIssue::NonFiniteElement(field));
        }
    }

    if record.epoch.as_deref().map_or(true, |e| e.trim().is_empty()) {
        issues.push(ValidityIssue::MissingEpoch);
    }

    if issues.is_empty() {
        Validity::Valid
    } else {
        Validity::Invalid(issues)
    }
}

pub fn is_valid(record: &RawOrbitalRecord) -> bool {
    assess(record).is_valid()
}
