//! Tab-delimited catalog loader.
//!
//! A header row names the fields; every following row becomes a [`RawRow`]
//! keyed by those names. Rows shorter than the header are skipped and counted,
//! never surfaced as errors. Only a missing header fails the load.

use csv::{ReaderBuilder, StringRecordsIntoIter};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::constants::{CANONICAL_OPERATOR_NAME, DESCRIPTOR_COLUMNS, LEGACY_OPERATOR_CODE, LEGACY_OPERATOR_MARKER};
use crate::error::{CatalogError, Result};
use crate::pipeline::processing::catalog::DescriptorRegistry;

/// Header tokens in file order plus a name lookup
#[derive(Debug)]
pub struct HeaderIndex {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl HeaderIndex {
    fn new(names: Vec<String>) -> Self {
        let mut positions = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            // Duplicate header tokens resolve to the first occurrence
            positions.entry(name.clone()).or_insert(i);
        }
        Self { names, positions }
    }

    pub fn width(&self) -> usize {
        self.names.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }
}

/// One data row: field name -> raw cell text
#[derive(Debug, Clone)]
pub struct RawRow {
    header: Arc<HeaderIndex>,
    values: Vec<String>,
}

impl RawRow {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.header
            .positions
            .get(field)
            .and_then(|&i| self.values.get(i))
            .map(String::as_str)
    }
}

/// Single-pass row sequence over one loaded text blob.
///
/// Consuming it drains the underlying reader; load the text again to iterate
/// a second time.
pub struct TabularRows<'a> {
    header: Arc<HeaderIndex>,
    records: StringRecordsIntoIter<&'a [u8]>,
    rows_read: usize,
    malformed_rows: usize,
}

impl<'a> TabularRows<'a> {
    pub fn header(&self) -> &HeaderIndex {
        &self.header
    }

    /// Rows yielded so far
    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    /// Rows skipped so far for being shorter than the header
    pub fn malformed_rows(&self) -> usize {
        self.malformed_rows
    }
}

impl<'a> Iterator for TabularRows<'a> {
    type Item = RawRow;

    fn next(&mut self) -> Option<RawRow> {
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(e) => {
                    warn!("Skipping unreadable row: {}", e);
                    self.malformed_rows += 1;
                    continue;
                }
            };

            let width = self.header.width();
            if record.len() < width {
                debug!(
                    "Skipping truncated row with {} of {} fields",
                    record.len(),
                    width
                );
                self.malformed_rows += 1;
                continue;
            }

            self.rows_read += 1;
            return Some(RawRow {
                header: Arc::clone(&self.header),
                values: record.iter().take(width).map(str::to_string).collect(),
            });
        }
    }
}

/// Load a tab-delimited text blob with a header row.
///
/// `context` names the blob in errors and logs (usually its location).
pub fn load_rows<'a>(text: &'a str, context: &str) -> Result<TabularRows<'a>> {
    let mut records = ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .has_headers(false)
        .from_reader(text.as_bytes())
        .into_records();

    let header_record = match records.next() {
        Some(record) => record?,
        None => {
            return Err(CatalogError::MissingHeader {
                context: context.to_string(),
            })
        }
    };

    let names: Vec<String> = header_record.iter().map(|t| t.trim().to_string()).collect();
    if names.iter().all(|n| n.is_empty()) {
        return Err(CatalogError::MissingHeader {
            context: context.to_string(),
        });
    }

    debug!("Loaded header for {} with {} columns", context, names.len());
    Ok(TabularRows {
        header: Arc::new(HeaderIndex::new(names)),
        records,
        rows_read: 0,
        malformed_rows: 0,
    })
}

/// Apply the historical operator rename for descriptor `"0"`.
pub fn canonical_descriptor_name(code: &str, name: &str) -> String {
    if code == LEGACY_OPERATOR_CODE && name.to_uppercase().contains(LEGACY_OPERATOR_MARKER) {
        CANONICAL_OPERATOR_NAME.to_string()
    } else {
        name.to_string()
    }
}

/// Load a `Code\tName` descriptor table.
pub fn load_descriptors(text: &str, context: &str) -> Result<DescriptorRegistry> {
    let rows = load_rows(text, context)?;
    for column in DESCRIPTOR_COLUMNS {
        if !rows.header().contains(column) {
            return Err(CatalogError::MissingColumn {
                column: column.to_string(),
            });
        }
    }

    let mut registry = DescriptorRegistry::new();
    for row in rows {
        let code = row.get("Code").unwrap_or("").trim();
        if code.is_empty() {
            debug!("Skipping descriptor row without a code");
            continue;
        }
        let name = canonical_descriptor_name(code, row.get("Name").unwrap_or(""));
        registry.insert(code, name);
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_keyed_by_header() {
        let text = "NoradId\tName\tEpoch\n25544\tISS (ZARYA)\t2024-06-01T00:00:00\n";
        let rows: Vec<RawRow> = load_rows(text, "test").unwrap().collect();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("NoradId"), Some("25544"));
        assert_eq!(rows[0].get("Name"), Some("ISS (ZARYA)"));
        assert_eq!(rows[0].get("Missing"), None);
    }

    #[test]
    fn test_short_rows_are_skipped_and_counted() {
        let text = "A\tB\tC\n1\t2\t3\n4\t5\n6\t7\t8\t9\n";
        let mut rows = load_rows(text, "test").unwrap();
        let collected: Vec<RawRow> = rows.by_ref().collect();

        assert_eq!(collected.len(), 2);
        assert_eq!(collected[1].get("C"), Some("8"));
        assert_eq!(rows.rows_read(), 2);
        assert_eq!(rows.malformed_rows(), 1);
    }

    #[test]
    fn test_empty_cells_are_preserved() {
        let text = "A\tB\tC\n1\t\t3\n";
        let rows: Vec<RawRow> = load_rows(text, "test").unwrap().collect();
        assert_eq!(rows[0].get("B"), Some(""));
    }

    #[test]
    fn test_quotes_are_not_interpreted() {
        let text = "Name\tCountry\n\"Quoted\" sat\tUS\n";
        let rows: Vec<RawRow> = load_rows(text, "test").unwrap().collect();
        assert_eq!(rows[0].get("Name"), Some("\"Quoted\" sat"));
    }

    #[test]
    fn test_missing_header_fails_the_load() {
        let err = load_rows("", "empty").err().unwrap();
        assert!(matches!(err, CatalogError::MissingHeader { .. }));
    }

    #[test]
    fn test_descriptor_rename_rule() {
        let text = "Code\tName\n0\tUSSPACECOM\n4\tESA\n";
        let registry = load_descriptors(text, "descriptors").unwrap();

        assert_eq!(registry.resolve("0"), Some("USSTRATCOM"));
        assert_eq!(registry.resolve("4"), Some("ESA"));
    }

    #[test]
    fn test_descriptor_rename_is_case_insensitive_and_code_specific() {
        assert_eq!(canonical_descriptor_name("0", "uSSpace Command"), "USSTRATCOM");
        assert_eq!(canonical_descriptor_name("1", "USSPACECOM"), "USSPACECOM");
        assert_eq!(canonical_descriptor_name("0", "CelesTrak"), "CelesTrak");
    }

    #[test]
    fn test_descriptor_table_requires_code_and_name() {
        let err = load_descriptors("Id\tLabel\n0\tX\n", "descriptors").err().unwrap();
        assert!(matches!(err, CatalogError::MissingColumn { ref column } if column == "Code"));
    }
}
