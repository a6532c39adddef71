//! Summaries and human-readable reports of mapping traces

use super::types::{TraceLog, TraceOperation, TraceSummary};
use std::collections::{HashMap, HashSet};

/// Compute summary statistics of a trace
pub fn summarize(log: &TraceLog) -> TraceSummary {
    let mut by_operation: HashMap<TraceOperation, usize> = HashMap::new();
    let mut transformers_used: HashMap<String, usize> = HashMap::new();
    let mut paths = HashSet::new();

    for record in &log.records {
        *by_operation.entry(record.operation).or_insert(0) += 1;
        paths.insert(record.path.as_str());
        if record.operation == TraceOperation::Transformed {
            *transformers_used.entry(record.detail.clone()).or_insert(0) += 1;
        }
    }

    // Ties resolve to the operation declared first so summaries are stable
    let most_common_operation = by_operation
        .iter()
        .max_by(|(a_op, a), (b_op, b)| a.cmp(b).then((**b_op as u8).cmp(&(**a_op as u8))))
        .map(|(op, _)| *op);

    TraceSummary {
        total_records: log.records.len(),
        by_operation,
        affected_paths: paths.len(),
        transformers_used,
        most_common_operation,
    }
}

/// Render a trace as a report grouped by operation
pub fn render_report(log: &TraceLog, summary: &TraceSummary) -> String {
    let mut report = String::new();

    report.push_str("=== Mapping Trace Report ===\n\n");
    report.push_str(&format!("Total Records: {}\n", summary.total_records));
    report.push_str(&format!("Affected Paths: {}\n", summary.affected_paths));
    if let Some(op) = summary.most_common_operation {
        report.push_str(&format!("Most Common Operation: {}\n", op));
    }
    report.push('\n');

    let mut operations: Vec<_> = summary.by_operation.iter().collect();
    operations.sort_by_key(|(op, _)| **op as u8);

    for (op, count) in operations {
        report.push_str(&format!("--- {} ({}) ---\n", op, count));
        let matching: Vec<_> = log.records.iter().filter(|r| r.operation == *op).collect();
        for record in matching.iter().take(5) {
            let path = if record.path.is_empty() { "<root>" } else { &record.path };
            report.push_str(&format!(
                "  - {}: {} -> {} ({})\n",
                path,
                record.source_type.as_deref().unwrap_or("?"),
                record.target_type.as_deref().unwrap_or("?"),
                record.detail
            ));
        }
        if matching.len() > 5 {
            report.push_str(&format!("    ... and {} more\n", matching.len() - 5));
        }
        report.push('\n');
    }

    report
}

/// Serialize a trace to pretty JSON
pub fn to_json(log: &TraceLog) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(log)
}
