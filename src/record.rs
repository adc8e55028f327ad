//! Tolerant parsing of return-order text into structured records.
//!
//! Upstream tools exchange return orders as plain text in two layouts:
//!
//! - **Block**: one `key: value` line per field, records separated by blank
//!   lines. This is the projection the data agent emits.
//! - **Inline**: one record per line, fields separated by `", "` with `:`
//!   between key and value. This is the shape of insert confirmations and
//!   pasted single-line data.
//!
//! The parser never fails: lines that do not carry a separator are skipped,
//! unknown keys pass through untouched, and cost values stay strings until a
//! consumer decides how to coerce them.

/// Canonical field names in their output column order.
pub const CANONICAL_FIELDS: [&str; 8] = [
    "order_id",
    "product",
    "category",
    "return_reason",
    "cost",
    "approved_flag",
    "store_name",
    "date",
];

/// A single parsed record preserving field insertion order.
///
/// Later inserts of an existing key overwrite its value in place, so a record
/// behaves like an ordered map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRecord {
    fields: Vec<(String, String)>,
}

impl ParsedRecord {
    /// Inserts a field, overwriting the value if the key already exists.
    pub fn insert(&mut self, key: String, value: String) {
        if let Some(slot) = self.fields.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.fields.push((key, value));
        }
    }

    /// Returns the value for `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns `true` when no fields were parsed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of parsed fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Iterates fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Input layout detected by [`RecordFormat::detect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    /// `key: value` lines, blank-line separated records.
    Block,
    /// One record per line, `", "` separated `key: value` pairs.
    Inline,
}

impl RecordFormat {
    /// Sniffs the layout of `raw`.
    ///
    /// A line counts as inline when splitting it on `", "` yields at least
    /// two segments that each carry a colon. Block values containing a
    /// single comma (`return_reason: cracked, scratched`) therefore stay
    /// block, while a timestamp inside a line-per-record dump can still
    /// force inline detection. That residual ambiguity is inherent to
    /// sniffing untyped text.
    #[must_use]
    pub fn detect(raw: &str) -> Self {
        let inline = raw.lines().any(|line| {
            line.split(", ")
                .filter(|segment| segment.contains(':'))
                .count()
                >= 2
        });
        if inline { Self::Inline } else { Self::Block }
    }
}

/// Parses `raw` into records, sniffing the layout first.
///
/// Returns an empty vector when no line carries a recognizable field. This
/// function never fails.
#[must_use]
pub fn parse(raw: &str) -> Vec<ParsedRecord> {
    match RecordFormat::detect(raw) {
        RecordFormat::Block => parse_blocks(raw),
        RecordFormat::Inline => parse_inline(raw),
    }
}

fn parse_blocks(raw: &str) -> Vec<ParsedRecord> {
    let mut records = Vec::new();
    let mut current = ParsedRecord::default();
    for chunk in raw.split("\n\n") {
        for line in chunk.lines() {
            if let Some((key, value)) = line.split_once(": ") {
                current.insert(normalize_key(key), value.trim().to_string());
            }
        }
        if !current.is_empty() {
            records.push(std::mem::take(&mut current));
        }
    }
    records
}

fn parse_inline(raw: &str) -> Vec<ParsedRecord> {
    let mut records = Vec::new();
    for line in raw.lines() {
        let mut record = ParsedRecord::default();
        for segment in line.split(", ") {
            if let Some((key, value)) = segment.split_once(':') {
                record.insert(normalize_key(key), value.trim().to_string());
            }
        }
        if !record.is_empty() {
            records.push(record);
        }
    }
    records
}

/// Normalizes a field key to its canonical snake_case name.
///
/// Lowercases, trims, maps spaces and hyphens to underscores, then applies
/// the synonym table (`price` and `amount` become `cost`, `store` becomes
/// `store_name`, and so on). Unknown keys pass through normalized but
/// otherwise untouched.
#[must_use]
pub fn normalize_key(key: &str) -> String {
    let canonical: String = key
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect();
    match canonical.as_str() {
        "price" | "amount" => "cost".to_string(),
        "reason" => "return_reason".to_string(),
        "approved" | "approval" => "approved_flag".to_string(),
        "store" => "store_name".to_string(),
        "item" => "product".to_string(),
        _ => canonical,
    }
}
