//! Mapping trace collection
//!
//! A [`TraceCollector`] placed in the [`Context`](crate::Context) records
//! every dispatch decision, cache hit and skipped property of the calls that
//! carry it. It is a diagnostics aid; mapping results do not depend on it.
//!
//! # Examples
//!
//! ```
//! use graphmap_core::trace::{TraceCollector, TraceOperation};
//!
//! let trace = TraceCollector::new();
//! trace.record("author", TraceOperation::CacheHit, Some("Person"), Some("PersonDto"), "object cache");
//! trace.record("title", TraceOperation::ShortCircuit, Some("string"), Some("string"), "");
//!
//! let summary = trace.summary();
//! assert_eq!(summary.total_records, 2);
//! assert_eq!(summary.count(TraceOperation::CacheHit), 1);
//! ```
//!
//! Copyright (c) 2025 Graphmap Team
//! Licensed under the Apache-2.0 license

pub mod reporting;
pub mod types;


pub use reporting::{render_report, summarize, to_json};
pub use types::{TraceLog, TraceOperation, TraceRecord, TraceSummary};

use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;

/// Shared, thread-safe trace sink
#[derive(Debug, Clone, Default)]
pub struct TraceCollector {
    log: Arc<Mutex<TraceLog>>,
}

impl TraceCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record
    pub fn record(
        &self,
        path: &str,
        operation: TraceOperation,
        source_type: Option<&str>,
        target_type: Option<&str>,
        detail: impl Into<String>,
    ) {
        let record = TraceRecord {
            path: path.to_string(),
            operation,
            source_type: source_type.map(str::to_string),
            target_type: target_type.map(str::to_string),
            detail: detail.into(),
            timestamp: Utc::now(),
        };
        log::trace!(
            "{} at '{}': {} -> {} {}",
            record.operation,
            record.path,
            record.source_type.as_deref().unwrap_or("?"),
            record.target_type.as_deref().unwrap_or("?"),
            record.detail
        );
        self.log.lock().records.push(record);
    }

    /// Mark the end of the traced work
    pub fn finish(&self) {
        self.log.lock().end_time = Some(Utc::now());
    }

    /// Snapshot of all records
    pub fn records(&self) -> Vec<TraceRecord> {
        self.log.lock().records.clone()
    }

    /// Records for one property path
    pub fn records_at(&self, path: &str) -> Vec<TraceRecord> {
        self.log
            .lock()
            .records
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    pub fn summary(&self) -> TraceSummary {
        summarize(&self.log.lock())
    }

    pub fn report(&self) -> String {
        let log = self.log.lock();
        render_report(&log, &summarize(&log))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        to_json(&self.log.lock())
    }

    pub fn clear(&self) {
        *self.log.lock() = TraceLog::default();
    }
}
