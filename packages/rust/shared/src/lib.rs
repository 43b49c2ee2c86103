//! Shared types, error model, and configuration for cabundler.
//!
//! This crate is the foundation depended on by all other cabundler crates.
//! It provides:
//! - [`CaBundlerError`] — the unified error type
//! - Domain types ([`CertificateRecord`], [`WeakHashPolicy`], [`Feed`], [`Strength`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, FeedsConfig, OutputConfig, PolicyConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from,
};
pub use error::{CaBundlerError, Result};
pub use types::{
    CertificateRecord, Feed, Strength, WeakHashPolicy, bundle_file_name, combined_file_name,
};
