//! Application configuration for cabundler.
//!
//! User config lives at `~/.cabundler/cabundler.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CaBundlerError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "cabundler.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".cabundler";

// ---------------------------------------------------------------------------
// Config structs (matching cabundler.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Certificate report endpoints.
    #[serde(default)]
    pub feeds: FeedsConfig,

    /// Bundle output settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// Signature-strength policy.
    #[serde(default)]
    pub policy: PolicyConfig,
}

/// `[feeds]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedsConfig {
    /// CSV report of all publicly disclosed intermediate certificates.
    #[serde(default = "default_intermediate_url")]
    pub intermediate_url: String,

    /// CSV report of root certificates included in the Mozilla program.
    #[serde(default = "default_root_url")]
    pub root_url: String,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            intermediate_url: default_intermediate_url(),
            root_url: default_root_url(),
        }
    }
}

fn default_intermediate_url() -> String {
    "https://ccadb.my.salesforce-sites.com/mozilla/PublicAllIntermediateCertsWithPEMCSV".into()
}
fn default_root_url() -> String {
    "https://ccadb.my.salesforce-sites.com/mozilla/IncludedCACertificateReportPEMCSV".into()
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory the bundle files are written into.
    #[serde(default = "default_output_dir")]
    pub dir: String,

    /// Also write one `.pem` file per certificate.
    #[serde(default)]
    pub individual_files: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            individual_files: false,
        }
    }
}

fn default_output_dir() -> String {
    "ca_bundle".into()
}

/// `[policy]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Signature hash algorithms excluded from the `strong_` bundles.
    #[serde(default = "default_weak_hash_algorithms")]
    pub weak_hash_algorithms: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            weak_hash_algorithms: default_weak_hash_algorithms(),
        }
    }
}

fn default_weak_hash_algorithms() -> Vec<String> {
    vec!["SHA1WithRSA".into()]
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.cabundler/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CaBundlerError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.cabundler/cabundler.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CaBundlerError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| CaBundlerError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| CaBundlerError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| CaBundlerError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CaBundlerError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
