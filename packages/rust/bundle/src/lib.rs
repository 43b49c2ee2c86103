//! Certificate bundle construction.
//!
//! Turns CCADB report rows into formatted bundle files: per-record
//! normalization and formatting in [`record`], the multi-output build
//! driver in [`builder`].

pub mod builder;
pub mod record;

pub use builder::{
    BuildConfig, BuildResult, BundleOutput, ProgressReporter, SilentProgress, build_bundles,
};
pub use record::{format_block, normalize, record_file_name, repair_pem_header};
