//! Aggregate statistics over parsed return-order records.
//!
//! Produces the key/value rows for the spreadsheet's `Summary` sheet and
//! the textual context handed to the LLM for the findings narrative.

use std::collections::BTreeMap;
use std::fmt;

use crate::record::ParsedRecord;

/// Aggregate statistics for one batch of return orders.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSummary {
    /// Number of records, parseable cost or not.
    pub total_returns: usize,
    /// Sum over parseable costs; 0.0 when none parsed.
    pub total_cost: f64,
    /// Mean over parseable costs only; 0.0 when none parsed.
    pub average_cost: f64,
    /// Records whose `approved_flag` is the literal `Yes` (case-sensitive).
    pub approved_count: usize,
    /// Category frequencies, count descending then name ascending.
    pub category_counts: Vec<(String, usize)>,
    /// Return-reason frequencies, same ordering.
    pub reason_counts: Vec<(String, usize)>,
    /// Store frequencies, same ordering.
    pub store_counts: Vec<(String, usize)>,
}

/// Computes the aggregate summary for a batch of records.
#[must_use]
pub fn summarize(records: &[ParsedRecord]) -> ReportSummary {
    let costs: Vec<f64> = records
        .iter()
        .filter_map(|r| r.get("cost").and_then(coerce_cost))
        .collect();
    let total_cost: f64 = costs.iter().sum();
    let average_cost = if costs.is_empty() {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        {
            total_cost / costs.len() as f64
        }
    };

    ReportSummary {
        total_returns: records.len(),
        total_cost,
        average_cost,
        approved_count: records
            .iter()
            .filter(|r| r.get("approved_flag") == Some("Yes"))
            .count(),
        category_counts: frequency_table(records, "category"),
        reason_counts: frequency_table(records, "return_reason"),
        store_counts: frequency_table(records, "store_name"),
    }
}

/// Parses a cost string, treating unparseable values as missing.
#[must_use]
pub fn coerce_cost(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok()
}

/// Counts distinct values of `field` across the records, ordered by count
/// descending then value ascending. Records missing the field are skipped.
fn frequency_table(records: &[ParsedRecord], field: &str) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for record in records {
        if let Some(value) = record.get(field) {
            *counts.entry(value.to_string()).or_insert(0) += 1;
        }
    }
    let mut table: Vec<(String, usize)> = counts.into_iter().collect();
    table.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    table
}

impl ReportSummary {
    /// Key/value rows for the `Summary` sheet. Also the canonical source
    /// for the [`fmt::Display`] rendering.
    #[must_use]
    pub fn rows(&self) -> Vec<(String, String)> {
        let mut rows = vec![
            ("Total Returns".to_string(), self.total_returns.to_string()),
            ("Total Cost".to_string(), format!("{:.2}", self.total_cost)),
            (
                "Average Cost".to_string(),
                format!("{:.2}", self.average_cost),
            ),
            (
                "Approved Count".to_string(),
                self.approved_count.to_string(),
            ),
        ];
        for (value, count) in &self.category_counts {
            rows.push((format!("By Category: {value}"), count.to_string()));
        }
        for (value, count) in &self.reason_counts {
            rows.push((format!("By Return Reason: {value}"), count.to_string()));
        }
        for (value, count) in &self.store_counts {
            rows.push((format!("By Store: {value}"), count.to_string()));
        }
        rows
    }
}

impl fmt::Display for ReportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in self.rows() {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{key}: {value}")?;
            first = false;
        }
        Ok(())
    }
}
