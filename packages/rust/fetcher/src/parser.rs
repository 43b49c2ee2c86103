//! CSV report tokenization.
//!
//! CCADB reports are plain CSV with a header row. PEM blocks arrive inside
//! quoted fields and span many lines, so the reader must tolerate embedded
//! newlines — the `csv` crate handles that out of the box.

use std::collections::HashMap;

use cabundler_shared::{CaBundlerError, Result};

/// One report row: column name → raw field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow(HashMap<String, String>);

impl ReportRow {
    /// Look up a column value by header name.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.0.get(column).map(String::as_str)
    }

    /// Build a row from explicit column/value pairs.
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

/// Parse a full CSV report into ordered rows keyed by header name.
pub fn parse_report(text: &str) -> Result<Vec<ReportRow>> {
    let mut reader = csv::Reader::from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| CaBundlerError::parse(format!("invalid CSV header row: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.is_empty() {
        return Err(CaBundlerError::parse("report has no header row"));
    }

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record
            .map_err(|e| CaBundlerError::parse(format!("invalid CSV at row {}: {e}", i + 1)))?;

        let fields = headers
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect();
        rows.push(ReportRow(fields));
    }

    tracing::debug!(rows = rows.len(), columns = headers.len(), "parsed report");
    Ok(rows)
}
