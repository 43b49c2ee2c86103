//! Per-record extraction, normalization, and formatting.
//!
//! Each pass is a small pure function: strip the quote pair the CSV source
//! wraps around the PEM field, resolve the common name across its two
//! candidate columns, repair a spurious blank line after the BEGIN marker,
//! and render the fixed four-line block used in every bundle.

use std::sync::LazyLock;

use regex::Regex;

use cabundler_shared::{CaBundlerError, CertificateRecord, Result};
use cabundler_fetcher::ReportRow;

/// Column holding the quoted PEM block.
const PEM_COLUMN: &str = "PEM Info";

/// Common-name candidate columns, evaluated in priority order.
const COMMON_NAME_COLUMNS: [&str; 2] = [
    "Common Name or Certificate Name",
    "Certificate Subject Common Name",
];

const SERIAL_COLUMN: &str = "Certificate Serial Number";
const ISSUER_ORG_COLUMN: &str = "Certificate Issuer Organization";
const SIGNATURE_HASH_COLUMN: &str = "Signature Hash Algorithm";

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Turn a raw report row into a [`CertificateRecord`].
///
/// Fails with a malformed-record error if the PEM column is missing or too
/// short, or if both common-name columns are empty. Missing serial number,
/// issuer organization, or signature algorithm are tolerated as empty.
pub fn normalize(row: &ReportRow) -> Result<CertificateRecord> {
    let raw_pem = row
        .get(PEM_COLUMN)
        .ok_or_else(|| CaBundlerError::malformed_record(format!("missing '{PEM_COLUMN}' column")))?;

    let pem = repair_pem_header(strip_quote_pair(raw_pem)?);
    let common_name = resolve_common_name(row)?;

    Ok(CertificateRecord {
        pem,
        common_name,
        issuer_org: row.get(ISSUER_ORG_COLUMN).unwrap_or_default().to_string(),
        serial_number: row.get(SERIAL_COLUMN).unwrap_or_default().to_string(),
        signature_hash_algorithm: row
            .get(SIGNATURE_HASH_COLUMN)
            .unwrap_or_default()
            .to_string(),
    })
}

/// Remove exactly one leading and one trailing character from the PEM field.
///
/// The report wraps the PEM block in an extra quote pair. No assumption is
/// made about which character the source uses; whatever single character
/// encloses the value is dropped.
fn strip_quote_pair(raw: &str) -> Result<&str> {
    let mut chars = raw.chars();
    let (Some(first), Some(last)) = (chars.next(), chars.next_back()) else {
        return Err(CaBundlerError::malformed_record(format!(
            "'{PEM_COLUMN}' value too short to hold a quoted PEM block: {raw:?}"
        )));
    };
    Ok(&raw[first.len_utf8()..raw.len() - last.len_utf8()])
}

/// Collapse a spurious blank line directly after the BEGIN marker.
///
/// Some report entries carry one extra line terminator after
/// `-----BEGIN CERTIFICATE-----`, in bare or carriage-return-prefixed form.
/// All four variants collapse to a single `\n`. Idempotent.
pub fn repair_pem_header(pem: &str) -> String {
    static BLANK_AFTER_BEGIN: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"-----BEGIN CERTIFICATE-----(?:\r\n\r\n|\r\n\n|\n\r\n|\n\n)")
            .expect("valid regex")
    });

    BLANK_AFTER_BEGIN
        .replace_all(pem, "-----BEGIN CERTIFICATE-----\n")
        .into_owned()
}

/// First non-empty value among the common-name candidate columns.
fn resolve_common_name(row: &ReportRow) -> Result<String> {
    COMMON_NAME_COLUMNS
        .iter()
        .filter_map(|col| row.get(col))
        .find(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            CaBundlerError::malformed_record(format!(
                "no usable common name in any of {COMMON_NAME_COLUMNS:?}"
            ))
        })
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Render the fixed block for one record: common name, issuer organization,
/// serial number, PEM, then a blank separator line.
///
/// Empty optional fields render as empty lines rather than being omitted, so
/// the line structure is constant for downstream line-oriented tooling.
pub fn format_block(record: &CertificateRecord) -> String {
    format!(
        "{}\n{}\n{}\n{}\n\n",
        record.common_name, record.issuer_org, record.serial_number, record.pem
    )
}

/// Filesystem-safe per-record file name: common name with non-word
/// characters removed, a 1-based sequence number, and the `.pem` extension.
pub fn record_file_name(common_name: &str, seq: usize) -> String {
    static NON_WORD: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\W").expect("valid regex"));

    format!("{}_{seq}.pem", NON_WORD.replace_all(common_name, ""))
}
