//! Ingestion Pipeline - One-time bulk load of the source CSV into the store
//!
//! Runs once per process start. Ingestion is best-effort over the whole
//! batch: a bad row degrades completeness, never aborts the pipeline.

use crate::decoder::RecordDecoder;
use crate::error::Result;
use crate::store::PostStore;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info, warn};

/// Counts observed over one ingestion pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestionReport {
    /// Data rows read from the source file, including rows that failed.
    pub records_found: u64,
    /// Rows actually written to the store.
    pub records_inserted: u64,
    /// Rows dropped: decode failures, insert faults, duplicate Post_IDs.
    pub records_skipped: u64,
}

/// Ensure the schema, then bulk-load `csv_path` unless the store already
/// holds data.
///
/// When `has_data()` is true the file is not even opened: the on-disk store
/// is authoritative and is never re-diffed against the source. Inserts run
/// strictly sequentially so a failure stays attributable to a single record.
/// The `has_data()`-then-ingest sequence is not transactional; a single
/// ingesting process per store instance is assumed at startup.
pub fn run(store: &PostStore, csv_path: &Path) -> Result<IngestionReport> {
    store.ensure_schema()?;

    if store.has_data()? {
        info!("Posts table already populated, skipping CSV import");
        return Ok(IngestionReport::default());
    }

    let file = File::open(csv_path)?;
    let decoder = RecordDecoder::new(BufReader::new(file))?;
    info!("Importing posts from {}", csv_path.display());

    let mut report = IngestionReport::default();
    for result in decoder {
        report.records_found += 1;
        match result {
            Ok(post) => match store.insert_if_absent(&post) {
                Ok(true) => report.records_inserted += 1,
                Ok(false) => {
                    report.records_skipped += 1;
                    debug!("Skipping duplicate Post_ID {}", post.post_id);
                }
                Err(e) => {
                    report.records_skipped += 1;
                    warn!("Failed to insert post {}: {}", post.post_id, e);
                }
            },
            Err(e) => {
                report.records_skipped += 1;
                warn!("Skipping row: {}", e);
            }
        }
    }

    info!(
        "CSV import complete: {} rows found, {} inserted, {} skipped",
        report.records_found, report.records_inserted, report.records_skipped
    );
    Ok(report)
}
