use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use crate::app::ports::CatalogSourcePort;
use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};
use crate::metrics::CatalogMetrics;
use crate::pipeline::processing::catalog::{emit, CatalogTables, DescriptorRegistry, UnresolvedSource};
use crate::pipeline::processing::conflation::{OfferOutcome, ReconcileStats, Reconciler};
use crate::pipeline::processing::parser::{load_descriptors, load_rows};
use crate::storage::CatalogStore;

/// Raw text (or the fetch error) for one configured location
#[derive(Debug)]
pub struct FetchedLocation {
    pub source_id: String,
    pub location: String,
    pub result: Result<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Fetch,
    /// No normalizer is registered for the location's source
    Normalize,
    Load,
}

/// A location whose contribution is missing from the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFailure {
    pub source_id: String,
    pub location: String,
    pub stage: FailureStage,
    pub reason: String,
}

/// Per-source diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub source_id: String,
    pub locations_attempted: usize,
    pub locations_failed: usize,
    pub rows_loaded: usize,
    pub malformed_rows: usize,
    pub invalid_records: usize,
    pub keyless_records: usize,
    pub accepted_candidates: usize,
    pub objects_won: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorOrigin {
    Table,
    Declared,
}

/// Summary of one run, written next to the tables
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub descriptor_origin: DescriptorOrigin,
    pub descriptors: usize,
    pub sources: Vec<SourceReport>,
    pub failures: Vec<SourceFailure>,
    pub reconciliation: ReconcileStats,
    pub reconciled_objects: usize,
    pub emitted_objects: usize,
    pub unresolved: Vec<UnresolvedSource>,
    pub descriptor_table_sha256: String,
    pub object_table_sha256: String,
}

/// Result of a complete pipeline run
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub tables: CatalogTables,
    pub descriptor_tsv: String,
    pub object_tsv: String,
    pub report: RunReport,
}

/// Everything the synchronous core produces from fetched text
#[derive(Debug)]
pub struct ReconciledRun {
    pub tables: CatalogTables,
    pub sources: Vec<SourceReport>,
    pub failures: Vec<SourceFailure>,
    pub stats: ReconcileStats,
    pub reconciled_objects: usize,
}

pub fn sha256_hex(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

fn skipped(source_id: String, location: String, stage: FailureStage, error: CatalogError) -> SourceFailure {
    warn!(source_id = %source_id, location = %location, ?stage, "Source location skipped: {}", error);
    SourceFailure {
        source_id,
        location,
        stage,
        reason: error.to_string(),
    }
}

/// Load, normalize, filter, reconcile and emit already-fetched locations.
///
/// Locations are consumed in the given order, which fixes the first-seen
/// order of objects. Fetch, normalizer and load failures are recorded, never
/// raised.
pub fn reconcile_fetched(
    config: &CatalogConfig,
    descriptors: &DescriptorRegistry,
    fetched: Vec<FetchedLocation>,
) -> ReconciledRun {
    let priority = config.priority();
    let normalizers = config.normalization_registry();
    let mut reconciler = Reconciler::new(&priority);
    let mut failures = Vec::new();

    // Configured sources report in configuration order, strays after them
    let mut reports: IndexMap<String, SourceReport> = config
        .sources
        .iter()
        .map(|s| {
            let report = SourceReport {
                source_id: s.id.clone(),
                ..SourceReport::default()
            };
            (s.id.clone(), report)
        })
        .collect();

    for fetched_location in fetched {
        let FetchedLocation {
            source_id,
            location,
            result,
        } = fetched_location;
        let report = reports.entry(source_id.clone()).or_insert_with(|| SourceReport {
            source_id: source_id.clone(),
            ..SourceReport::default()
        });
        report.locations_attempted += 1;

        let text = match result {
            Ok(text) => text,
            Err(e) => {
                CatalogMetrics::record_fetch_failure(&source_id);
                report.locations_failed += 1;
                failures.push(skipped(source_id, location, FailureStage::Fetch, e));
                continue;
            }
        };
        CatalogMetrics::record_fetch_success(&source_id, text.len());

        let normalizer = match normalizers.normalizer_for(&source_id) {
            Ok(normalizer) => normalizer,
            Err(e) => {
                report.locations_failed += 1;
                failures.push(skipped(source_id, location, FailureStage::Normalize, e));
                continue;
            }
        };

        let mut rows = match load_rows(&text, &location) {
            Ok(rows) => rows,
            Err(e) => {
                CatalogMetrics::record_load_failure(&source_id);
                report.locations_failed += 1;
                failures.push(skipped(source_id, location, FailureStage::Load, e));
                continue;
            }
        };

        let (mut invalid, mut keyless) = (0, 0);
        for row in rows.by_ref() {
            match reconciler.offer(normalizer.normalize(&row)) {
                OfferOutcome::Created | OfferOutcome::Replaced | OfferOutcome::Retained => {
                    report.accepted_candidates += 1
                }
                OfferOutcome::MissingObjectId => keyless += 1,
                OfferOutcome::Invalid(_) => invalid += 1,
            }
        }
        report.rows_loaded += rows.rows_read();
        report.malformed_rows += rows.malformed_rows();
        report.invalid_records += invalid;
        report.keyless_records += keyless;
        CatalogMetrics::record_rows(&source_id, rows.rows_read(), rows.malformed_rows());
        CatalogMetrics::record_rejections(&source_id, invalid, keyless);

        debug!(
            source_id = %source_id,
            location = %location,
            rows = rows.rows_read(),
            malformed = rows.malformed_rows(),
            invalid,
            keyless,
            "Loaded location"
        );
    }

    let catalog = reconciler.finish();
    for object in catalog.iter() {
        if let Some(report) = reports.get_mut(&object.source_id) {
            report.objects_won += 1;
        }
    }

    let tables = emit(descriptors, &catalog);
    CatalogMetrics::record_reconciliation(catalog.len(), catalog.stats().replaced, tables.unresolved.len());

    ReconciledRun {
        tables,
        sources: reports.into_values().collect(),
        failures,
        stats: catalog.stats().clone(),
        reconciled_objects: catalog.len(),
    }
}

pub struct Pipeline {
    config: CatalogConfig,
    fetcher: Arc<dyn CatalogSourcePort>,
}

impl Pipeline {
    pub fn new(config: CatalogConfig, fetcher: Arc<dyn CatalogSourcePort>) -> Self {
        Self { config, fetcher }
    }

    /// Fetch every configured location concurrently; results come back in
    /// configuration order regardless of completion order.
    pub async fn fetch_all(&self) -> Vec<FetchedLocation> {
        let targets: Vec<(String, String)> = self
            .config
            .sources
            .iter()
            .flat_map(|s| s.locations.iter().map(move |l| (s.id.clone(), l.clone())))
            .collect();

        let mut tasks = JoinSet::new();
        for (i, (_, location)) in targets.iter().enumerate() {
            let fetcher = Arc::clone(&self.fetcher);
            let location = location.clone();
            tasks.spawn(async move { (i, fetcher.fetch(&location).await) });
        }

        let mut results: Vec<Option<Result<String>>> = (0..targets.len()).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((i, result)) => results[i] = Some(result),
                Err(e) => warn!("Fetch task did not complete: {}", e),
            }
        }

        targets
            .into_iter()
            .zip(results)
            .map(|((source_id, location), result)| {
                let result = result.unwrap_or_else(|| {
                    Err(CatalogError::Fetch {
                        location: location.clone(),
                        message: "fetch task aborted".to_string(),
                    })
                });
                FetchedLocation {
                    source_id,
                    location,
                    result,
                }
            })
            .collect()
    }

    /// Descriptor table if configured and loadable, else the declared sources
    async fn load_descriptor_registry(&self) -> (DescriptorRegistry, DescriptorOrigin) {
        let Some(location) = self.config.descriptor_table.as_deref() else {
            return (self.config.declared_descriptors(), DescriptorOrigin::Declared);
        };

        let loaded = match self.fetcher.fetch(location).await {
            Ok(text) => load_descriptors(&text, location),
            Err(e) => Err(e),
        };
        match loaded {
            Ok(registry) => {
                info!("Loaded {} descriptors from {}", registry.len(), location);
                (registry, DescriptorOrigin::Table)
            }
            Err(e) => {
                warn!(
                    "Descriptor table {} unavailable ({}); using configured source names",
                    location, e
                );
                (self.config.declared_descriptors(), DescriptorOrigin::Declared)
            }
        }
    }

    /// Run the complete pipeline and return tables plus report
    #[instrument(skip(self), fields(sources = self.config.sources.len()))]
    pub async fn run(&self) -> PipelineResult {
        let started_at = Utc::now();
        let timer = Instant::now();
        info!("Starting catalog reconciliation");

        let ((descriptors, descriptor_origin), fetched) =
            tokio::join!(self.load_descriptor_registry(), self.fetch_all());

        let run = reconcile_fetched(&self.config, &descriptors, fetched);

        let descriptor_tsv = run.tables.descriptors.to_tsv();
        let object_tsv = run.tables.objects.to_tsv();

        if !run.failures.is_empty() {
            let failed: Vec<String> = run
                .failures
                .iter()
                .map(|f| format!("{}:{}", f.source_id, f.location))
                .collect();
            warn!(
                "Partial catalog: {} location(s) contributed nothing: {}",
                failed.len(),
                failed.join(", ")
            );
        }

        let duration_secs = timer.elapsed().as_secs_f64();
        CatalogMetrics::record_run_duration(duration_secs);

        let report = RunReport {
            started_at,
            duration_secs,
            descriptor_origin,
            descriptors: descriptors.len(),
            sources: run.sources,
            failures: run.failures,
            reconciliation: run.stats,
            reconciled_objects: run.reconciled_objects,
            emitted_objects: run.tables.objects.rows.len(),
            unresolved: run.tables.unresolved.clone(),
            descriptor_table_sha256: sha256_hex(&descriptor_tsv),
            object_table_sha256: sha256_hex(&object_tsv),
        };

        info!(
            "Reconciled {} objects, emitted {} ({} unresolved) in {:.3}s",
            report.reconciled_objects,
            report.emitted_objects,
            report.unresolved.len(),
            duration_secs
        );

        PipelineResult {
            tables: run.tables,
            descriptor_tsv,
            object_tsv,
            report,
        }
    }

    /// Run and persist the tables and report through `store`
    pub async fn run_with_store(&self, store: &dyn CatalogStore) -> Result<PipelineResult> {
        let result = self.run().await;
        store.save(&result).await?;
        Ok(result)
    }
}
