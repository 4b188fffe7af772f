use chrono::{DateTime, Utc};
use proptest::prelude::*;
use std::cmp::Reverse;
use std::collections::BTreeMap;

use rso_catalog::constants::EARTH_RADIUS_M;
use rso_catalog::pipeline::processing::catalog::{emit, DescriptorRegistry};
use rso_catalog::pipeline::processing::conflation::{parse_epoch, reconcile, SourcePriority};
use rso_catalog::pipeline::processing::normalize::sma_from_mean_motion;
use rso_catalog::pipeline::processing::quality_gate::is_valid;
use rso_catalog::types::{OrbitalElements, RawOrbitalRecord};

/// "0".."2" can be listed in a priority; "7" and "8" never are
const SOURCES: [&str; 5] = ["0", "1", "2", "7", "8"];

fn record(position: usize, source: &str, object_id: u8, day: Option<u32>, valid: bool) -> RawOrbitalRecord {
    let mut record = RawOrbitalRecord::new(source);
    record.object_id = Some(object_id.to_string());
    record.epoch = Some(match day {
        Some(day) => format!("2024-01-{:02}", day + 1),
        None => "not-an-epoch".to_string(),
    });
    record.elements = OrbitalElements {
        sma_m: Some(7_000_000.0),
        ecc: Some(0.01),
        inc_rad: Some(1.0),
        raan_rad: Some(1.0),
        argp_rad: Some(1.0),
        mean_anom_rad: Some(1.0),
    };
    if !valid {
        if position % 2 == 0 {
            record.elements.sma_m = Some(0.0);
        } else {
            record.elements.inc_rad = Some(f64::NAN);
        }
    }
    // The name tags each record with its arrival position
    record.descriptive.insert("Name".to_string(), position.to_string());
    record
}

/// Few objects, sources and days so that rank and epoch ties are common
fn arb_records() -> impl Strategy<Value = Vec<RawOrbitalRecord>> {
    prop::collection::vec(
        (
            0..SOURCES.len(),
            1u8..5,
            prop::option::weighted(0.8, 0u32..4),
            prop::bool::weighted(0.85),
        ),
        1..24,
    )
    .prop_map(|draws| {
        draws
            .into_iter()
            .enumerate()
            .map(|(i, (source, object_id, day, valid))| record(i, SOURCES[source], object_id, day, valid))
            .collect()
    })
}

fn arb_priority() -> impl Strategy<Value = Vec<&'static str>> {
    (Just(vec!["0", "1", "2"]).prop_shuffle(), 0..=3usize).prop_map(|(order, listed)| order[..listed].to_vec())
}

/// Winning arrival position per object id, chosen by a global minimum over
/// (rank, newest epoch first, arrival) instead of a streaming fold
fn expected_winners(records: &[RawOrbitalRecord], priority: &SourcePriority) -> BTreeMap<String, usize> {
    let mut best: BTreeMap<String, (usize, Reverse<Option<DateTime<Utc>>>, usize)> = BTreeMap::new();
    for (position, record) in records.iter().enumerate().filter(|(_, r)| is_valid(r)) {
        let key = (
            priority.rank(&record.source_id),
            Reverse(record.epoch.as_deref().and_then(parse_epoch)),
            position,
        );
        let object_id = record.object_id.clone().unwrap_or_default();
        best.entry(object_id)
            .and_modify(|current| {
                if key < *current {
                    *current = key;
                }
            })
            .or_insert(key);
    }
    best.into_iter().map(|(id, (_, _, position))| (id, position)).collect()
}

fn descriptors() -> DescriptorRegistry {
    let mut descriptors = DescriptorRegistry::new();
    for code in SOURCES {
        descriptors.insert(code, format!("Source {code}"));
    }
    descriptors
}

proptest! {
    #[test]
    fn winner_has_best_rank_then_latest_epoch_then_first_arrival(
        records in arb_records(),
        listed in arb_priority(),
    ) {
        let priority = SourcePriority::new(listed);
        let expected = expected_winners(&records, &priority);
        let catalog = reconcile(records, &priority);

        prop_assert_eq!(catalog.len(), expected.len());
        for (object_id, position) in expected {
            let winner = catalog.get(&object_id);
            prop_assert!(winner.is_some());
            let winner = winner.unwrap();
            let position = position.to_string();
            prop_assert_eq!(winner.record.descriptive_field("Name"), position.as_str());
        }
    }

    #[test]
    fn arrival_order_only_decides_exact_ties(
        (records, shuffled) in arb_records().prop_flat_map(|r| (Just(r.clone()), Just(r).prop_shuffle())),
        listed in arb_priority(),
    ) {
        let priority = SourcePriority::new(listed);
        let original = reconcile(records, &priority);
        let reordered = reconcile(shuffled, &priority);

        prop_assert_eq!(original.len(), reordered.len());
        for object in original.iter() {
            let other = reordered.get(&object.object_id);
            prop_assert!(other.is_some());
            let other = other.unwrap();
            prop_assert_eq!(priority.rank(&object.source_id), priority.rank(&other.source_id));
            prop_assert_eq!(
                object.record.epoch.as_deref().and_then(parse_epoch),
                other.record.epoch.as_deref().and_then(parse_epoch)
            );
        }
    }

    #[test]
    fn invalid_records_never_win_and_never_claim_a_row(
        records in arb_records(),
        listed in arb_priority(),
    ) {
        let priority = SourcePriority::new(listed);
        let mut first_seen_valid: Vec<String> = Vec::new();
        for record in records.iter().filter(|r| is_valid(r)) {
            let object_id = record.object_id.clone().unwrap_or_default();
            if !first_seen_valid.contains(&object_id) {
                first_seen_valid.push(object_id);
            }
        }

        let catalog = reconcile(records, &priority);
        let order: Vec<String> = catalog.iter().map(|o| o.object_id.clone()).collect();
        prop_assert_eq!(order, first_seen_valid);
        prop_assert!(catalog.iter().all(|o| is_valid(&o.record)));
    }

    #[test]
    fn reconciling_the_same_input_twice_is_byte_identical(
        records in arb_records(),
        listed in arb_priority(),
    ) {
        let priority = SourcePriority::new(listed);
        let first = emit(&descriptors(), &reconcile(records.clone(), &priority));
        let second = emit(&descriptors(), &reconcile(records, &priority));

        prop_assert_eq!(first.objects.to_tsv(), second.objects.to_tsv());
        prop_assert_eq!(first.descriptors.to_tsv(), second.descriptors.to_tsv());
    }

    #[test]
    fn low_earth_mean_motion_lands_in_low_earth_orbit(n in 14.0f64..15.0) {
        let sma = sma_from_mean_motion(n);
        prop_assert!(sma.is_some());
        let altitude_km = (sma.unwrap() - EARTH_RADIUS_M) / 1000.0;
        prop_assert!((400.0..=1000.0).contains(&altitude_km), "n={} altitude={}", n, altitude_km);
    }

    #[test]
    fn non_positive_mean_motion_leaves_sma_unset(n in -20.0f64..=0.0) {
        prop_assert_eq!(sma_from_mean_motion(n), None);
    }
}

#[test]
fn geostationary_mean_motion_gives_geostationary_radius() {
    let geo = sma_from_mean_motion(1.00273790935).unwrap();
    assert!((geo / 1000.0 - 42_164.0).abs() < 5.0);
}
