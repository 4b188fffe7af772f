//! Physical constants and the fixed table layouts shared across the pipeline.

/// Earth gravitational parameter, m^3/s^2
pub const MU_EARTH: f64 = 3.986004418e14;

pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Mean equatorial radius, meters
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

// Canonical input field names. Sources may alias these through `columns`.
pub const FIELD_NORAD_ID: &str = "NoradId";
pub const FIELD_EPOCH: &str = "Epoch";
pub const FIELD_SMA: &str = "SMA";
pub const FIELD_MEAN_MOTION: &str = "MeanMotion";
pub const FIELD_ECC: &str = "Ecc";
pub const FIELD_INC: &str = "Inc";
pub const FIELD_RAAN: &str = "RAAN";
pub const FIELD_ARGP: &str = "ArgP";
pub const FIELD_MEAN_ANOM: &str = "MeanAnom";
pub const FIELD_ORBIT_CLASS: &str = "OrbitClass";

/// Metadata columns copied verbatim from the winning record
pub const PASS_THROUGH_FIELDS: [&str; 15] = [
    "Name",
    "Country",
    "CatalogId",
    "BirthDate",
    "Operator",
    "Users",
    "Purpose",
    "DetailedPurpose",
    "LaunchMass",
    "DryMass",
    "Power",
    "Lifetime",
    "Contractor",
    "LaunchSite",
    "LaunchVehicle",
];

pub const DESCRIPTOR_COLUMNS: [&str; 2] = ["Code", "Name"];

pub const OBJECT_COLUMNS: [&str; 25] = [
    "DataSource",
    "Name",
    "Country",
    "CatalogId",
    "NoradId",
    "BirthDate",
    "Operator",
    "Users",
    "Purpose",
    "DetailedPurpose",
    "LaunchMass",
    "DryMass",
    "Power",
    "Lifetime",
    "Contractor",
    "LaunchSite",
    "LaunchVehicle",
    "OrbitType",
    "Epoch",
    "SMA",
    "Ecc",
    "Inc",
    "RAAN",
    "ArgP",
    "MeanAnom",
];

// Upstream renamed the operator behind source "0"; older descriptor tables still
// carry the USSPACE* spelling.
pub const LEGACY_OPERATOR_CODE: &str = "0";
pub const LEGACY_OPERATOR_MARKER: &str = "USSPACE";
pub const CANONICAL_OPERATOR_NAME: &str = "USSTRATCOM";

// Output file names written by the filesystem store
pub const DESCRIPTOR_TABLE_FILE: &str = "DataSources.tsv";
pub const OBJECT_TABLE_FILE: &str = "Objects.tsv";
pub const RUN_REPORT_FILE: &str = "run_report.json";
