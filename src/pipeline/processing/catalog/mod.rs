//! Catalog emitter: reconciled objects to the fixed tabular output.
//!
//! Two tables come out: the data-source registry (`Code`, `Name`) and the
//! object table with the column order in [`OBJECT_COLUMNS`]. Absent values
//! are empty strings and numbers are plain decimals.

mod descriptors;

pub use descriptors::DescriptorRegistry;

use serde::Serialize;
use tracing::warn;

use crate::constants::{DESCRIPTOR_COLUMNS, OBJECT_COLUMNS};
use crate::pipeline::processing::conflation::{ReconciledCatalog, ReconciledObject};
use crate::types::DataSourceDescriptor;

/// Shortest round-trip decimal text, never exponential. Non-finite is empty.
pub fn format_decimal(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{}", v),
        _ => String::new(),
    }
}

/// One object-table row, values in [`OBJECT_COLUMNS`] order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalCatalogRow {
    values: Vec<String>,
}

impl CanonicalCatalogRow {
    pub fn from_object(object: &ReconciledObject) -> Self {
        let record = &object.record;
        let elements = &record.elements;
        let values = OBJECT_COLUMNS
            .iter()
            .map(|&column| match column {
                "DataSource" => object.source_id.clone(),
                "NoradId" => object.object_id.clone(),
                "OrbitType" => record.orbit_class.map(|c| c.to_string()).unwrap_or_default(),
                "Epoch" => record.epoch.clone().unwrap_or_default(),
                "SMA" => format_decimal(elements.sma_m),
                "Ecc" => format_decimal(elements.ecc),
                "Inc" => format_decimal(elements.inc_rad),
                "RAAN" => format_decimal(elements.raan_rad),
                "ArgP" => format_decimal(elements.argp_rad),
                "MeanAnom" => format_decimal(elements.mean_anom_rad),
                other => record.descriptive_field(other).to_string(),
            })
            .collect();
        Self { values }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        OBJECT_COLUMNS
            .iter()
            .position(|&c| c == column)
            .map(|i| self.values[i].as_str())
    }
}

/// An object dropped because its source has no descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedSource {
    pub object_id: String,
    pub source_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct DescriptorTable {
    pub rows: Vec<DataSourceDescriptor>,
}

impl DescriptorTable {
    pub fn to_tsv(&self) -> String {
        render_tsv(
            &DESCRIPTOR_COLUMNS,
            self.rows.iter().map(|d| vec![d.code.as_str(), d.name.as_str()]),
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObjectTable {
    pub rows: Vec<CanonicalCatalogRow>,
}

impl ObjectTable {
    pub fn to_tsv(&self) -> String {
        render_tsv(
            &OBJECT_COLUMNS,
            self.rows
                .iter()
                .map(|row| row.values.iter().map(String::as_str).collect()),
        )
    }
}

/// Both emitted tables plus the rows dropped on the way
#[derive(Debug, Clone, Default)]
pub struct CatalogTables {
    pub descriptors: DescriptorTable,
    pub objects: ObjectTable,
    pub unresolved: Vec<UnresolvedSource>,
}

fn render_tsv<'a, I>(header: &[&str], rows: I) -> String
where
    I: Iterator<Item = Vec<&'a str>>,
{
    let mut out = header.join("\t");
    out.push('\n');
    for row in rows {
        for (column, value) in header.iter().zip(&row) {
            if value.contains(['\t', '\n', '\r']) {
                warn!(column = %column, "Field contains a tab or line break; output row will not round-trip");
            }
        }
        out.push_str(&row.join("\t"));
        out.push('\n');
    }
    out
}

/// Build the descriptor and object tables.
///
/// Objects whose source does not resolve to a descriptor are dropped and
/// reported in [`CatalogTables::unresolved`].
pub fn emit(descriptors: &DescriptorRegistry, catalog: &ReconciledCatalog) -> CatalogTables {
    let mut objects = ObjectTable::default();
    let mut unresolved = Vec::new();

    for object in catalog.iter() {
        if !descriptors.contains(&object.source_id) {
            warn!(
                object_id = %object.object_id,
                source_id = %object.source_id,
                "Dropping object whose source has no descriptor"
            );
            unresolved.push(UnresolvedSource {
                object_id: object.object_id.clone(),
                source_id: object.source_id.clone(),
            });
            continue;
        }
        objects.rows.push(CanonicalCatalogRow::from_object(object));
    }

    CatalogTables {
        descriptors: DescriptorTable {
            rows: descriptors.iter().cloned().collect(),
        },
        objects,
        unresolved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::conflation::{reconcile, SourcePriority};
    use crate::types::{OrbitClass, OrbitalElements, RawOrbitalRecord};

    fn record(source: &str, object_id: &str) -> RawOrbitalRecord {
        let mut record = RawOrbitalRecord::new(source);
        record.object_id = Some(object_id.to_string());
        record.epoch = Some("2024-06-01T00:00:00".to_string());
        record.orbit_class = Some(OrbitClass::Geo);
        record.elements = OrbitalElements {
            sma_m: Some(42_164_000.0),
            ecc: Some(0.0001),
            inc_rad: Some(0.0),
            raan_rad: Some(1.25),
            argp_rad: Some(0.5),
            mean_anom_rad: Some(3.0),
        };
        record.descriptive.insert("Name".to_string(), "GOES 16".to_string());
        record.descriptive.insert("Country".to_string(), "USA".to_string());
        record
    }

    fn registry() -> DescriptorRegistry {
        let mut registry = DescriptorRegistry::new();
        registry.insert("0", "USSTRATCOM");
        registry.insert("4", "ESA");
        registry
    }

    #[test]
    fn test_format_decimal_never_uses_exponent() {
        assert_eq!(format_decimal(Some(42_164_000.0)), "42164000");
        assert_eq!(format_decimal(Some(1.0e21)), "1000000000000000000000");
        assert_eq!(format_decimal(Some(0.0000001)), "0.0000001");
        assert_eq!(format_decimal(Some(0.25)), "0.25");
        assert_eq!(format_decimal(None), "");
        assert_eq!(format_decimal(Some(f64::NAN)), "");
    }

    #[test]
    fn test_row_follows_fixed_column_order() {
        let catalog = reconcile(vec![record("0", "41866")], &SourcePriority::new(["0"]));
        let tables = emit(&registry(), &catalog);

        let row = &tables.objects.rows[0];
        assert_eq!(row.values().len(), OBJECT_COLUMNS.len());
        assert_eq!(row.values()[0], "0");
        assert_eq!(row.get("Name"), Some("GOES 16"));
        assert_eq!(row.get("NoradId"), Some("41866"));
        assert_eq!(row.get("OrbitType"), Some("GEO"));
        assert_eq!(row.get("SMA"), Some("42164000"));
        assert_eq!(row.get("RAAN"), Some("1.25"));
        assert_eq!(row.get("Operator"), Some(""));
    }

    #[test]
    fn test_unresolved_source_rows_are_dropped() {
        let catalog = reconcile(
            vec![record("0", "1"), record("9", "2"), record("4", "3")],
            &SourcePriority::new(["0", "4"]),
        );
        let tables = emit(&registry(), &catalog);

        let ids: Vec<&str> = tables.objects.rows.iter().map(|r| r.get("NoradId").unwrap()).collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert_eq!(
            tables.unresolved,
            vec![UnresolvedSource {
                object_id: "2".to_string(),
                source_id: "9".to_string()
            }]
        );
    }

    #[test]
    fn test_tsv_rendering() {
        let catalog = reconcile(vec![record("4", "7")], &SourcePriority::new(["4"]));
        let tables = emit(&registry(), &catalog);

        assert_eq!(tables.descriptors.to_tsv(), "Code\tName\n0\tUSSTRATCOM\n4\tESA\n");

        let objects = tables.objects.to_tsv();
        let lines: Vec<&str> = objects.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], OBJECT_COLUMNS.join("\t"));
        assert_eq!(lines[1].split('\t').count(), OBJECT_COLUMNS.len());
        assert!(lines[1].starts_with("4\tGOES 16\tUSA\t\t7\t"));
    }
}
