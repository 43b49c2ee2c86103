//! Core domain types for certificate bundles.

use std::collections::BTreeSet;

// ---------------------------------------------------------------------------
// CertificateRecord
// ---------------------------------------------------------------------------

/// One certificate entry from a CCADB report, after normalization.
///
/// Only the common name is mandatory: a record without a usable name cannot
/// be filed or reported. A missing serial number or issuer organization is
/// tolerated and renders as an empty line in the formatted block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRecord {
    /// PEM-armored certificate text, quote pair stripped and header repaired.
    pub pem: String,
    /// Certificate common name (required).
    pub common_name: String,
    /// Issuer organization, empty if the report omitted it.
    pub issuer_org: String,
    /// Certificate serial number, empty if the report omitted it.
    pub serial_number: String,
    /// Reported signature hash algorithm (e.g. "SHA256WithRSA").
    pub signature_hash_algorithm: String,
}

// ---------------------------------------------------------------------------
// WeakHashPolicy
// ---------------------------------------------------------------------------

/// The set of signature hash algorithms considered too weak to trust.
///
/// Certificates signed with one of these are excluded from the `strong_`
/// bundle variants. Newer TLS stacks reject them outright ("CA signature
/// digest algorithm too weak"), so shipping them in a strong bundle would
/// defeat its purpose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeakHashPolicy {
    algorithms: BTreeSet<String>,
}

impl WeakHashPolicy {
    /// Build a policy from an explicit list of algorithm names.
    pub fn new(algorithms: impl IntoIterator<Item = String>) -> Self {
        Self {
            algorithms: algorithms.into_iter().collect(),
        }
    }

    /// Whether a record's reported signature algorithm is in the weak set.
    pub fn is_weak(&self, record: &CertificateRecord) -> bool {
        self.algorithms.contains(&record.signature_hash_algorithm)
    }
}

impl Default for WeakHashPolicy {
    fn default() -> Self {
        Self::new(["SHA1WithRSA".to_string()])
    }
}

// ---------------------------------------------------------------------------
// Feed / strength partitioning
// ---------------------------------------------------------------------------

/// Which certificate report a bundle is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    Intermediate,
    Root,
}

impl Feed {
    /// File-name stem for this feed's bundle.
    pub fn stem(self) -> &'static str {
        match self {
            Feed::Intermediate => "intermediate",
            Feed::Root => "root",
        }
    }
}

impl std::fmt::Display for Feed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.stem())
    }
}

/// Whether a bundle includes every certificate or only strongly-signed ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strength {
    /// Every certificate in the feed.
    All,
    /// Certificates whose signature algorithm is not in the weak set.
    StrongOnly,
}

impl Strength {
    /// File-name prefix: empty for `All`, `strong_` for `StrongOnly`.
    pub fn prefix(self) -> &'static str {
        match self {
            Strength::All => "",
            Strength::StrongOnly => "strong_",
        }
    }
}

/// File name for a single-feed bundle, e.g. `strong_root_bundle.pem`.
pub fn bundle_file_name(feed: Feed, strength: Strength) -> String {
    format!("{}{}_bundle.pem", strength.prefix(), feed.stem())
}

/// File name for the combined intermediate+root bundle.
pub fn combined_file_name(strength: Strength) -> String {
    format!("{}intermediate_root_bundle.pem", strength.prefix())
}
