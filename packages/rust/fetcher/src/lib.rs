//! HTTP retrieval and CSV parsing of CCADB certificate reports.
//!
//! The fetcher turns a report URL into an ordered sequence of [`ReportRow`]s.
//! Any network failure, non-success status, or structural CSV problem is
//! fatal — there is no partial-report recovery.

pub mod parser;

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info, instrument};

use cabundler_shared::{CaBundlerError, Result};

pub use parser::ReportRow;

/// User-Agent string for report requests.
const USER_AGENT: &str = concat!("cabundler/", env!("CARGO_PKG_VERSION"));

/// HTTP client wrapper for downloading certificate reports.
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Create a fetcher with transport defaults (30s timeout, limited redirects).
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CaBundlerError::Fetch(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Download a certificate report and parse it into rows.
    #[instrument(skip(self))]
    pub async fn fetch_report(&self, url: &str) -> Result<Vec<ReportRow>> {
        debug!(url, "downloading report");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CaBundlerError::Fetch(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CaBundlerError::Fetch(format!("{url}: HTTP {status}")));
        }

        // The report is CSV text regardless of what content-type the
        // endpoint negotiates.
        let body = response
            .text()
            .await
            .map_err(|e| CaBundlerError::Fetch(format!("{url}: body read failed: {e}")))?;

        let rows = parser::parse_report(&body)?;
        info!(url, rows = rows.len(), "report downloaded");

        Ok(rows)
    }
}
