//! Bundle build driver: fetch → normalize → filter → format → write.
//!
//! One build produces six files under the output directory: a bundle per
//! feed (intermediate, root), a combined intermediate+root bundle, and the
//! same trio restricted to strongly-signed certificates. The combined files
//! are the byte-exact concatenation of the intermediate content followed by
//! the root content.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument};

use cabundler_fetcher::Fetcher;
use cabundler_shared::{
    AppConfig, CaBundlerError, Feed, Result, Strength, WeakHashPolicy, bundle_file_name,
    combined_file_name,
};

use crate::record;

// ---------------------------------------------------------------------------
// Configuration & result
// ---------------------------------------------------------------------------

/// Runtime build configuration — merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Intermediate-certificates report endpoint.
    pub intermediate_url: String,
    /// Root-certificates report endpoint.
    pub root_url: String,
    /// Directory the bundle files are written into.
    pub output_dir: PathBuf,
    /// Also write one `.pem` file per certificate.
    pub individual_files: bool,
    /// Signature algorithms excluded from the `strong_` bundles.
    pub policy: WeakHashPolicy,
}

impl From<&AppConfig> for BuildConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            intermediate_url: config.feeds.intermediate_url.clone(),
            root_url: config.feeds.root_url.clone(),
            output_dir: PathBuf::from(&config.output.dir),
            individual_files: config.output.individual_files,
            policy: WeakHashPolicy::new(config.policy.weak_hash_algorithms.iter().cloned()),
        }
    }
}

/// One written bundle file.
#[derive(Debug, Clone)]
pub struct BundleOutput {
    /// Absolute or config-relative path of the written file.
    pub path: PathBuf,
    /// Number of certificate records in the file.
    pub records: usize,
    /// Strength mode the file belongs to.
    pub strength: Strength,
}

/// Summary of a completed build.
#[derive(Debug)]
pub struct BuildResult {
    /// Output directory holding the bundle files.
    pub output_dir: PathBuf,
    /// The six written bundles, in write order.
    pub bundles: Vec<BundleOutput>,
    /// Total elapsed time.
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for reporting build status.
///
/// Purely observational: implementations must not affect bundle content.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called for every certificate folded into a bundle.
    fn record_processed(&self, common_name: &str, current: usize);
    /// Called when the build completes.
    fn done(&self, result: &BuildResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn record_processed(&self, _common_name: &str, _current: usize) {}
    fn done(&self, _result: &BuildResult) {}
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Run a full bundle build.
///
/// For each strength mode, fetches both feeds, accumulates their formatted
/// blobs, and writes the per-feed and combined bundle files. Any fetch,
/// parse, or malformed-record failure aborts the whole build; files already
/// written by earlier completed steps are left in place.
#[instrument(skip_all, fields(output_dir = %config.output_dir.display()))]
pub async fn build_bundles(
    config: &BuildConfig,
    fetcher: &Fetcher,
    progress: &dyn ProgressReporter,
) -> Result<BuildResult> {
    let start = Instant::now();

    std::fs::create_dir_all(&config.output_dir)
        .map_err(|e| CaBundlerError::io(&config.output_dir, e))?;

    let mut bundles = Vec::with_capacity(6);

    for strength in [Strength::All, Strength::StrongOnly] {
        let mut combined = String::new();
        let mut combined_records = 0;

        for feed in [Feed::Intermediate, Feed::Root] {
            let url = match feed {
                Feed::Intermediate => &config.intermediate_url,
                Feed::Root => &config.root_url,
            };

            progress.phase(&format!("Fetching {feed} certificates"));
            let (blob, records) = build_feed(config, fetcher, url, strength, progress).await?;

            let path = config.output_dir.join(bundle_file_name(feed, strength));
            write_bundle(&path, &blob)?;
            bundles.push(BundleOutput {
                path,
                records,
                strength,
            });

            combined.push_str(&blob);
            combined_records += records;
        }

        // Concatenation of the two feed blobs, in feed order.
        let path = config.output_dir.join(combined_file_name(strength));
        write_bundle(&path, &combined)?;
        bundles.push(BundleOutput {
            path,
            records: combined_records,
            strength,
        });
    }

    let result = BuildResult {
        output_dir: config.output_dir.clone(),
        bundles,
        elapsed: start.elapsed(),
    };

    progress.done(&result);

    info!(
        bundles = result.bundles.len(),
        elapsed_ms = result.elapsed.as_millis(),
        "bundle build complete"
    );

    Ok(result)
}

/// Fetch one feed and fold its rows into a single formatted blob.
///
/// Returns the blob and the number of records it contains. Weak-signed
/// records are skipped entirely in strong-only mode: not formatted, not
/// written as individual files, not counted.
async fn build_feed(
    config: &BuildConfig,
    fetcher: &Fetcher,
    url: &str,
    strength: Strength,
    progress: &dyn ProgressReporter,
) -> Result<(String, usize)> {
    let rows = fetcher.fetch_report(url).await?;

    let mut blob = String::new();
    let mut kept = 0;

    for row in &rows {
        let record = record::normalize(row)?;

        if strength == Strength::StrongOnly && config.policy.is_weak(&record) {
            debug!(common_name = %record.common_name, "weak signature hash, skipping");
            continue;
        }

        kept += 1;
        progress.record_processed(&record.common_name, kept);

        let block = record::format_block(&record);

        if config.individual_files {
            let path = config
                .output_dir
                .join(record::record_file_name(&record.common_name, kept));
            write_bundle(&path, &block)?;
        }

        blob.push_str(&block);
    }

    info!(url, rows = rows.len(), kept, ?strength, "feed processed");
    Ok((blob, kept))
}

/// Write a bundle file, overwriting any existing file of the same name.
fn write_bundle(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).map_err(|e| CaBundlerError::io(path, e))?;
    debug!(path = %path.display(), bytes = content.len(), "wrote bundle file");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const HEADER: &str = "Common Name or Certificate Name,Certificate Subject Common Name,Certificate Serial Number,Certificate Issuer Organization,Signature Hash Algorithm,PEM Info";

    fn report_row(cn: &str, serial: &str, algo: &str, body: &str) -> String {
        format!(
            "{cn},,{serial},Test Org,{algo},\"'-----BEGIN CERTIFICATE-----\n{body}\n-----END CERTIFICATE-----'\"",
        )
    }

    fn intermediate_report() -> String {
        format!(
            "{HEADER}\n{}\n{}\n",
            report_row("Inter One", "01", "SHA256WithRSA", "MIIAAA"),
            report_row("Inter Two", "02", "SHA1WithRSA", "MIIBBB"),
        )
    }

    fn root_report() -> String {
        format!(
            "{HEADER}\n{}\n",
            report_row("Root One", "03", "SHA384WithECDSA", "MIICCC"),
        )
    }

    async fn mock_feeds(server: &MockServer, intermediate: &str, root: &str) {
        Mock::given(method("GET"))
            .and(path("/intermediate"))
            .respond_with(ResponseTemplate::new(200).set_body_string(intermediate))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/root"))
            .respond_with(ResponseTemplate::new(200).set_body_string(root))
            .mount(server)
            .await;
    }

    fn test_config(server: &MockServer, output_dir: &Path) -> BuildConfig {
        BuildConfig {
            intermediate_url: format!("{}/intermediate", server.uri()),
            root_url: format!("{}/root", server.uri()),
            output_dir: output_dir.to_path_buf(),
            individual_files: false,
            policy: WeakHashPolicy::default(),
        }
    }

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "cabundler-{tag}-{}-{:?}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn count_records(content: &str) -> usize {
        content.matches("-----BEGIN CERTIFICATE-----").count()
    }

    #[tokio::test]
    async fn writes_all_six_bundle_files() {
        let server = MockServer::start().await;
        mock_feeds(&server, &intermediate_report(), &root_report()).await;

        let out = temp_dir("six-files");
        let config = test_config(&server, &out);
        let fetcher = Fetcher::new().unwrap();

        let result = build_bundles(&config, &fetcher, &SilentProgress).await.unwrap();

        assert_eq!(result.bundles.len(), 6);
        for name in [
            "intermediate_bundle.pem",
            "root_bundle.pem",
            "intermediate_root_bundle.pem",
            "strong_intermediate_bundle.pem",
            "strong_root_bundle.pem",
            "strong_intermediate_root_bundle.pem",
        ] {
            assert!(out.join(name).exists(), "missing {name}");
        }

        let _ = std::fs::remove_dir_all(&out);
    }

    #[tokio::test]
    async fn all_bundle_keeps_every_row_in_order() {
        let server = MockServer::start().await;
        mock_feeds(&server, &intermediate_report(), &root_report()).await;

        let out = temp_dir("row-order");
        let config = test_config(&server, &out);
        let fetcher = Fetcher::new().unwrap();

        build_bundles(&config, &fetcher, &SilentProgress).await.unwrap();

        let content = std::fs::read_to_string(out.join("intermediate_bundle.pem")).unwrap();
        assert_eq!(count_records(&content), 2);
        // Source row order is preserved.
        let one = content.find("Inter One").unwrap();
        let two = content.find("Inter Two").unwrap();
        assert!(one < two);

        let _ = std::fs::remove_dir_all(&out);
    }

    #[tokio::test]
    async fn strong_bundle_excludes_weak_signatures() {
        let server = MockServer::start().await;
        mock_feeds(&server, &intermediate_report(), &root_report()).await;

        let out = temp_dir("strong-filter");
        let config = test_config(&server, &out);
        let fetcher = Fetcher::new().unwrap();

        let result = build_bundles(&config, &fetcher, &SilentProgress).await.unwrap();

        let strong = std::fs::read_to_string(out.join("strong_intermediate_bundle.pem")).unwrap();
        assert_eq!(count_records(&strong), 1);
        assert!(strong.contains("Inter One"));
        assert!(!strong.contains("Inter Two"));

        // The root feed has no weak entries: strong and all content match.
        let root_all = std::fs::read_to_string(out.join("root_bundle.pem")).unwrap();
        let root_strong = std::fs::read_to_string(out.join("strong_root_bundle.pem")).unwrap();
        assert_eq!(root_all, root_strong);

        // Strong counts never exceed all counts.
        let all_counts: usize = result
            .bundles
            .iter()
            .filter(|b| b.strength == Strength::All)
            .map(|b| b.records)
            .sum();
        let strong_counts: usize = result
            .bundles
            .iter()
            .filter(|b| b.strength == Strength::StrongOnly)
            .map(|b| b.records)
            .sum();
        assert!(strong_counts <= all_counts);

        let _ = std::fs::remove_dir_all(&out);
    }

    #[tokio::test]
    async fn combined_bundle_is_exact_concatenation() {
        let server = MockServer::start().await;
        mock_feeds(&server, &intermediate_report(), &root_report()).await;

        let out = temp_dir("concat-law");
        let config = test_config(&server, &out);
        let fetcher = Fetcher::new().unwrap();

        build_bundles(&config, &fetcher, &SilentProgress).await.unwrap();

        for prefix in ["", "strong_"] {
            let inter =
                std::fs::read_to_string(out.join(format!("{prefix}intermediate_bundle.pem")))
                    .unwrap();
            let root =
                std::fs::read_to_string(out.join(format!("{prefix}root_bundle.pem"))).unwrap();
            let combined =
                std::fs::read_to_string(out.join(format!("{prefix}intermediate_root_bundle.pem")))
                    .unwrap();
            assert_eq!(combined, format!("{inter}{root}"), "prefix {prefix:?}");
        }

        let _ = std::fs::remove_dir_all(&out);
    }

    #[tokio::test]
    async fn weak_record_with_blank_header_line() {
        // The CSV quotes the doubled newline inside the PEM field; the all
        // bundle carries the repaired block, the strong bundle drops it.
        let report = format!(
            "{HEADER}\nTest CA,,01,Test Org,SHA1WithRSA,\"'-----BEGIN CERTIFICATE-----\n\nMIIB\n-----END CERTIFICATE-----'\"\n"
        );

        let server = MockServer::start().await;
        mock_feeds(&server, &report, &root_report()).await;

        let out = temp_dir("blank-header");
        let config = test_config(&server, &out);
        let fetcher = Fetcher::new().unwrap();

        build_bundles(&config, &fetcher, &SilentProgress).await.unwrap();

        let all = std::fs::read_to_string(out.join("intermediate_bundle.pem")).unwrap();
        assert!(all.starts_with(
            "Test CA\nTest Org\n01\n-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n\n"
        ));

        let strong = std::fs::read_to_string(out.join("strong_intermediate_bundle.pem")).unwrap();
        assert!(!strong.contains("Test CA"));

        let _ = std::fs::remove_dir_all(&out);
    }

    #[tokio::test]
    async fn missing_common_name_aborts_the_build() {
        // Second row has both name columns empty: stop-the-build condition.
        let report = format!(
            "{HEADER}\n{}\n,,02,Test Org,SHA256WithRSA,\"'x'\"\n",
            report_row("Good CA", "01", "SHA256WithRSA", "MIIAAA"),
        );

        let server = MockServer::start().await;
        mock_feeds(&server, &report, &root_report()).await;

        let out = temp_dir("no-name");
        let config = test_config(&server, &out);
        let fetcher = Fetcher::new().unwrap();

        let err = build_bundles(&config, &fetcher, &SilentProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, CaBundlerError::MalformedRecord { .. }));
        // The failing feed's bundle never hits disk.
        assert!(!out.join("intermediate_bundle.pem").exists());

        let _ = std::fs::remove_dir_all(&out);
    }

    #[tokio::test]
    async fn failing_feed_aborts_without_partial_bundle() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/intermediate"))
            .respond_with(ResponseTemplate::new(200).set_body_string(intermediate_report()))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/root"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let out = temp_dir("feed-failure");
        let config = test_config(&server, &out);
        let fetcher = Fetcher::new().unwrap();

        let err = build_bundles(&config, &fetcher, &SilentProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, CaBundlerError::Fetch(_)));
        // Root and combined bundles never hit disk; the already-completed
        // intermediate bundle may remain (no cross-file atomicity).
        assert!(!out.join("root_bundle.pem").exists());
        assert!(!out.join("intermediate_root_bundle.pem").exists());
        assert!(out.join("intermediate_bundle.pem").exists());

        let _ = std::fs::remove_dir_all(&out);
    }

    #[tokio::test]
    async fn individual_files_are_written_when_enabled() {
        let server = MockServer::start().await;
        mock_feeds(&server, &intermediate_report(), &root_report()).await;

        let out = temp_dir("individual");
        let mut config = test_config(&server, &out);
        config.individual_files = true;
        let fetcher = Fetcher::new().unwrap();

        build_bundles(&config, &fetcher, &SilentProgress).await.unwrap();

        assert!(out.join("InterOne_1.pem").exists());
        assert!(out.join("InterTwo_2.pem").exists());
        assert!(out.join("RootOne_1.pem").exists());

        let content = std::fs::read_to_string(out.join("InterOne_1.pem")).unwrap();
        assert!(content.starts_with("Inter One\nTest Org\n01\n"));

        let _ = std::fs::remove_dir_all(&out);
    }

    #[test]
    fn build_config_from_app_config() {
        let app = AppConfig::default();
        let build = BuildConfig::from(&app);

        assert!(build.intermediate_url.contains("PublicAllIntermediateCertsWithPEMCSV"));
        assert!(build.root_url.contains("IncludedCACertificateReportPEMCSV"));
        assert_eq!(build.output_dir, PathBuf::from("ca_bundle"));
        assert!(!build.individual_files);
    }
}
