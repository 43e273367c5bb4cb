//! One reconciliation run over a pair of files

use tracing::{info, warn};

use crate::config::SyncConfig;
use crate::csl::load_records;
use crate::error::{Result, SyncError};
use crate::reconcile::{ReconcileReport, Reconciler};
use crate::tei::TeiDocument;

/// Outcome of [`run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub report: ReconcileReport,
    /// Whether the target file was rewritten
    pub written: bool,
}

/// Load both inputs, reconcile, and write the target back if it changed.
///
/// Nothing is written when any step before the write fails, when the pass
/// changed nothing, or when `dry_run` is set.
pub fn run(config: &SyncConfig) -> Result<RunSummary> {
    config.validate()?;

    let records = load_records(&config.source_path).map_err(|source| SyncError::Source {
        path: config.source_path.clone(),
        source,
    })?;
    let mut document =
        TeiDocument::load(&config.target_path).map_err(|source| SyncError::Target {
            path: config.target_path.clone(),
            source,
        })?;

    info!("Starting date and note transfer process...");
    let report = Reconciler::new(config.reconcile_options()).reconcile(&records, &mut document)?;

    let stats = report.stats();
    info!(
        "Processed {} records: {} matched, {} skipped, {} dates and {} notes written",
        stats.records, stats.matched, stats.skipped, stats.dates_written, stats.notes_written
    );

    if !report.changed {
        info!("No updates were necessary.");
        return Ok(RunSummary {
            report,
            written: false,
        });
    }

    if config.dry_run {
        warn!(
            "Dry run: changes to '{}' were not written.",
            config.target_path.display()
        );
        return Ok(RunSummary {
            report,
            written: false,
        });
    }

    document
        .save(&config.target_path)
        .map_err(|source| SyncError::Write {
            path: config.target_path.clone(),
            source,
        })?;
    info!(
        "Successfully updated XML file: {}",
        config.target_path.display()
    );

    Ok(RunSummary {
        report,
        written: true,
    })
}
