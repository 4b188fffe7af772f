//! Reconciliation of per-source records into one record per object.
//!
//! A streaming fold: every incoming record is compared only against the
//! current champion for its object id. Ordering is
//!
//! 1. source priority (listed sources in list order, then all unlisted),
//! 2. later parsed epoch (an unparsable epoch is the earliest possible),
//! 3. first seen.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use indexmap::map::Entry;
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::{debug, trace};

use crate::pipeline::processing::quality_gate::{self, Validity, ValidityIssue};
use crate::types::RawOrbitalRecord;

// `%.f` also matches a missing fraction
const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse an epoch string to an instant. Offset-less timestamps are UTC.
pub fn parse_epoch(epoch: &str) -> Option<DateTime<Utc>> {
    let epoch = epoch.trim();
    if epoch.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(epoch) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(epoch, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(epoch, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Ordered list of preferred source ids, most preferred first
#[derive(Debug, Clone, Default)]
pub struct SourcePriority {
    ranks: HashMap<String, usize>,
}

impl SourcePriority {
    pub fn new<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ranks = HashMap::new();
        for source in sources {
            let next = ranks.len();
            ranks.entry(source.into()).or_insert(next);
        }
        Self { ranks }
    }

    /// Lower is better. Every unlisted source shares the rank after the list.
    pub fn rank(&self, source_id: &str) -> usize {
        self.ranks.get(source_id).copied().unwrap_or(self.ranks.len())
    }
}

/// The winning record for one object id
#[derive(Debug, Clone, Serialize)]
pub struct ReconciledObject {
    pub object_id: String,
    pub source_id: String,
    pub record: RawOrbitalRecord,
    #[serde(skip)]
    parsed_epoch: Option<DateTime<Utc>>,
    #[serde(skip)]
    rank: usize,
}

/// What happened to a record offered to the reconciler
#[derive(Debug, Clone, PartialEq)]
pub enum OfferOutcome {
    /// First valid record for its object id
    Created,
    /// Beat the previous champion
    Replaced,
    /// Lost to, or tied with, the current champion
    Retained,
    MissingObjectId,
    Invalid(Vec<ValidityIssue>),
}

/// Counters over one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    pub offered: usize,
    pub created: usize,
    pub replaced: usize,
    pub retained: usize,
    pub missing_object_id: usize,
    pub invalid: usize,
}

/// Streaming best-record-per-key reduction
pub struct Reconciler<'p> {
    priority: &'p SourcePriority,
    objects: IndexMap<String, ReconciledObject>,
    stats: ReconcileStats,
}

impl<'p> Reconciler<'p> {
    pub fn new(priority: &'p SourcePriority) -> Self {
        Self {
            priority,
            objects: IndexMap::new(),
            stats: ReconcileStats::default(),
        }
    }

    /// Compare a challenger against a champion; `Greater` means the challenger wins.
    fn compare(challenger: (usize, Option<DateTime<Utc>>), champion: &ReconciledObject) -> Ordering {
        champion
            .rank
            .cmp(&challenger.0)
            .then_with(|| challenger.1.cmp(&champion.parsed_epoch))
    }

    pub fn offer(&mut self, record: RawOrbitalRecord) -> OfferOutcome {
        self.stats.offered += 1;

        let object_id = match record.object_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                self.stats.missing_object_id += 1;
                return OfferOutcome::MissingObjectId;
            }
        };

        if let Validity::Invalid(issues) = quality_gate::assess(&record) {
            trace!(object_id = %object_id, source_id = %record.source_id, ?issues, "Rejected invalid record");
            self.stats.invalid += 1;
            return OfferOutcome::Invalid(issues);
        }

        let rank = self.priority.rank(&record.source_id);
        let parsed_epoch = record.epoch.as_deref().and_then(parse_epoch);

        let champion = match self.objects.entry(object_id) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let object_id = entry.key().clone();
                entry.insert(ReconciledObject {
                    object_id,
                    source_id: record.source_id.clone(),
                    record,
                    parsed_epoch,
                    rank,
                });
                self.stats.created += 1;
                return OfferOutcome::Created;
            }
        };

        if Self::compare((rank, parsed_epoch), champion) == Ordering::Greater {
            debug!(
                object_id = %champion.object_id,
                from = %champion.source_id,
                to = %record.source_id,
                "Replacing champion"
            );
            champion.source_id = record.source_id.clone();
            champion.record = record;
            champion.parsed_epoch = parsed_epoch;
            champion.rank = rank;
            self.stats.replaced += 1;
            OfferOutcome::Replaced
        } else {
            self.stats.retained += 1;
            OfferOutcome::Retained
        }
    }

    pub fn finish(self) -> ReconciledCatalog {
        ReconciledCatalog {
            objects: self.objects,
            stats: self.stats,
        }
    }
}

/// Finalized result, ordered by first appearance of each object id
#[derive(Debug, Clone, Default)]
pub struct ReconciledCatalog {
    objects: IndexMap<String, ReconciledObject>,
    stats: ReconcileStats,
}

impl ReconciledCatalog {
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReconciledObject> {
        self.objects.values()
    }

    pub fn get(&self, object_id: &str) -> Option<&ReconciledObject> {
        self.objects.get(object_id)
    }

    pub fn stats(&self) -> &ReconcileStats {
        &self.stats
    }
}

/// Reduce a record stream to one champion per object id
pub fn reconcile<I>(records: I, priority: &SourcePriority) -> ReconciledCatalog
where
    I: IntoIterator<Item = RawOrbitalRecord>,
{
    let mut reconciler = Reconciler::new(priority);
    for record in records {
        reconciler.offer(record);
    }
    reconciler.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrbitalElements;

    fn record(source: &str, object_id: &str, epoch: &str) -> RawOrbitalRecord {
        let mut record = RawOrbitalRecord::new(source);
        record.object_id = Some(object_id.to_string());
        record.epoch = Some(epoch.to_string());
        record.elements = OrbitalElements {
            sma_m: Some(6_790_000.0),
            ecc: Some(0.001),
            inc_rad: Some(0.9),
            raan_rad: Some(1.0),
            argp_rad: Some(2.0),
            mean_anom_rad: Some(3.0),
        };
        record
    }

    fn tagged(source: &str, object_id: &str, epoch: &str, tag: &str) -> RawOrbitalRecord {
        let mut r = record(source, object_id, epoch);
        r.descriptive.insert("Name".to_string(), tag.to_string());
        r
    }

    #[test]
    fn test_parse_epoch_formats() {
        assert!(parse_epoch("2024-06-01T12:30:00Z").is_some());
        assert!(parse_epoch("2024-06-01T12:30:00.123456").is_some());
        assert!(parse_epoch("2024-06-01 12:30:00").is_some());
        assert_eq!(parse_epoch("2024-06-01T12:30:00"), parse_epoch("2024-06-01T12:30:00.000"));
        assert!(parse_epoch("2024-06-01").is_some());
        assert!(parse_epoch("24153.5").is_none());
        assert!(parse_epoch("").is_none());
        assert_eq!(
            parse_epoch("2024-06-01T00:00:00+02:00"),
            parse_epoch("2024-05-31T22:00:00")
        );
    }

    #[test]
    fn test_example_scenario_later_epoch_of_top_source_wins() {
        let priority = SourcePriority::new(["0", "4"]);
        let catalog = reconcile(
            vec![
                tagged("0", "25544", "2024-01-01", "early"),
                tagged("4", "25544", "2024-12-01", "other-source"),
                tagged("0", "25544", "2024-06-01", "late"),
            ],
            &priority,
        );

        assert_eq!(catalog.len(), 1);
        let winner = catalog.get("25544").unwrap();
        assert_eq!(winner.source_id, "0");
        assert_eq!(winner.record.descriptive_field("Name"), "late");
    }

    #[test]
    fn test_priority_dominates_recency() {
        let priority = SourcePriority::new(["0", "4"]);
        for records in [
            vec![record("4", "1", "2030-01-01"), record("0", "1", "2000-01-01")],
            vec![record("0", "1", "2000-01-01"), record("4", "1", "2030-01-01")],
        ] {
            let catalog = reconcile(records, &priority);
            assert_eq!(catalog.get("1").unwrap().source_id, "0");
        }
    }

    #[test]
    fn test_listed_source_beats_unlisted() {
        let priority = SourcePriority::new(["4"]);
        let catalog = reconcile(
            vec![record("9", "1", "2030-01-01"), record("4", "1", "2000-01-01")],
            &priority,
        );
        assert_eq!(catalog.get("1").unwrap().source_id, "4");
    }

    #[test]
    fn test_unlisted_sources_tie_break_on_recency() {
        let priority = SourcePriority::new(["0"]);
        let catalog = reconcile(
            vec![record("8", "1", "2024-06-01"), record("9", "1", "2024-01-01")],
            &priority,
        );
        assert_eq!(catalog.get("1").unwrap().source_id, "8");
    }

    #[test]
    fn test_exact_tie_keeps_first_seen() {
        let priority = SourcePriority::new(["0"]);
        let catalog = reconcile(
            vec![
                tagged("0", "1", "2024-06-01", "first"),
                tagged("0", "1", "2024-06-01", "second"),
            ],
            &priority,
        );
        assert_eq!(catalog.get("1").unwrap().record.descriptive_field("Name"), "first");
        assert_eq!(catalog.stats().retained, 1);
    }

    #[test]
    fn test_unparsable_epoch_loses_to_parsable() {
        let priority = SourcePriority::new(Vec::<String>::new());
        let catalog = reconcile(
            vec![
                tagged("0", "1", "not-a-date", "garbled"),
                tagged("0", "1", "1990-01-01", "old"),
            ],
            &priority,
        );
        assert_eq!(catalog.get("1").unwrap().record.descriptive_field("Name"), "old");
    }

    #[test]
    fn test_invalid_and_keyless_records_never_participate() {
        let priority = SourcePriority::new(["0"]);
        let mut zero_sma = record("0", "1", "2030-01-01");
        zero_sma.elements.sma_m = Some(0.0);
        let mut nan_inc = record("0", "2", "2030-01-01");
        nan_inc.elements.inc_rad = Some(f64::NAN);
        let keyless = record("0", "  ", "2030-01-01");

        let mut reconciler = Reconciler::new(&priority);
        assert!(matches!(reconciler.offer(zero_sma), OfferOutcome::Invalid(_)));
        assert!(matches!(reconciler.offer(nan_inc), OfferOutcome::Invalid(_)));
        assert_eq!(reconciler.offer(keyless), OfferOutcome::MissingObjectId);
        assert_eq!(reconciler.offer(record("0", "1", "2000-01-01")), OfferOutcome::Created);

        let catalog = reconciler.finish();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("1").unwrap().record.epoch.as_deref(), Some("2000-01-01"));
        assert_eq!(catalog.stats().invalid, 2);
        assert_eq!(catalog.stats().missing_object_id, 1);
    }

    #[test]
    fn test_output_order_is_first_seen_key_order() {
        let priority = SourcePriority::new(["0"]);
        let catalog = reconcile(
            vec![
                record("4", "300", "2024-01-01"),
                record("4", "100", "2024-01-01"),
                record("0", "300", "2024-01-01"),
                record("4", "200", "2024-01-01"),
            ],
            &priority,
        );
        let ids: Vec<&str> = catalog.iter().map(|o| o.object_id.as_str()).collect();
        assert_eq!(ids, vec!["300", "100", "200"]);
    }

    #[test]
    fn test_duplicate_priority_entries_keep_first_rank() {
        let priority = SourcePriority::new(["4", "0", "4"]);
        assert_eq!(priority.rank("4"), 0);
        assert_eq!(priority.rank("0"), 1);
        assert_eq!(priority.rank("x"), 2);
        assert_eq!(priority.rank("y"), priority.rank("x"));
    }
}
