//! Core types for mapping traces

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// What happened at a point of the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TraceOperation {
    /// A transformer produced the value
    Transformed,
    /// A transformer declined the value
    Refused,
    /// The object cache returned an existing target
    CacheHit,
    /// A preset mapping supplied an existing target
    PresetHit,
    /// A scalar was coerced without dispatch
    ShortCircuit,
    /// A lazy proxy was returned in place of a populated target
    LazyProxy,
    /// A constructor parameter fell back to its default
    DefaultApplied,
    /// A target property could not be written and was skipped
    Skipped,
}

impl fmt::Display for TraceOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Record of a single mapping step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceRecord {
    /// Property path of the affected value
    pub path: String,
    pub operation: TraceOperation,
    pub source_type: Option<String>,
    pub target_type: Option<String>,
    /// Transformer name, refusal reason or other free-form detail
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}

/// Complete audit trail of one or more mapping calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceLog {
    pub records: Vec<TraceRecord>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

impl Default for TraceLog {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            start_time: Utc::now(),
            end_time: None,
        }
    }
}

/// Summary statistics of a trace
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceSummary {
    pub total_records: usize,
    pub by_operation: HashMap<TraceOperation, usize>,
    /// Number of distinct property paths touched
    pub affected_paths: usize,
    /// Transformer name to the number of values it produced
    pub transformers_used: HashMap<String, usize>,
    pub most_common_operation: Option<TraceOperation>,
}

impl TraceSummary {
    pub fn count(&self, operation: TraceOperation) -> usize {
        self.by_operation.get(&operation).copied().unwrap_or(0)
    }
}
