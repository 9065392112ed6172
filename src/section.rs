//! Wire format between the collector and the monitoring server.
//!
//! A section is a header line followed by one compact JSON object per
//! namespace. The header declares `;` (ASCII 59) as field separator; it cannot
//! occur in the JSON since Kubernetes names exclude it.

use std::io::Write;
use tracing::warn;

use crate::error::{CollectorError, RecordError};
use crate::types::NamespaceRecord;

pub const SECTION_HEADER: &str = "<<<kubernetes_namespaces:sep(59)>>>";

pub fn encode_record(record: &NamespaceRecord) -> Result<String, serde_json::Error> {
    serde_json::to_string(record)
}

/// Write the header and one line per record, empty namespaces included
pub fn write_section<W: Write>(mut out: W, records: &[NamespaceRecord]) -> Result<(), CollectorError> {
    writeln!(out, "{}", SECTION_HEADER)?;
    for record in records {
        let line = encode_record(record).map_err(std::io::Error::from)?;
        writeln!(out, "{}", line)?;
    }
    out.flush()?;
    Ok(())
}

/// Strictly decode one record line
pub fn parse_record(line: &str) -> Result<NamespaceRecord, RecordError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(RecordError::Empty);
    }
    Ok(serde_json::from_str(line)?)
}

/// Decode all record lines in arrival order. Header and blank lines are
/// ignored; lines that fail to decode are logged and skipped.
pub fn parse_section(text: &str) -> Vec<NamespaceRecord> {
    let mut records = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("<<<") {
            continue;
        }
        match parse_record(line) {
            Ok(record) => records.push(record),
            Err(e) => warn!("skipping section line {}: {}", index + 1, e),
        }
    }
    records
}
