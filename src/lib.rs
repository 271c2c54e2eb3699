//! Metastrip - build-time stripper for `import.meta.DEBUG` guards
//!
//! Libraries ship development-only assertions and diagnostics behind a single
//! read-only marker, `import.meta.DEBUG`. Metastrip resolves that marker per
//! package at build time, rewrites it to a literal boolean, and eliminates the
//! branch the literal makes unreachable - so production artifacts carry no
//! trace of debug-only code or its strings, while unconfigured builds pass
//! files through untouched.

pub mod config;
pub mod error;
pub mod fold;
pub mod fs;
pub mod manifest;
pub mod pipeline;
pub mod resolve;
pub mod rewrite;
pub mod scan;

// Re-exports for convenience
pub use config::{BuildConfig, BuildMode, FileConfig};
pub use error::{MetastripError, MetastripResult};
pub use manifest::PackageBoundary;
pub use pipeline::{
    check_tree, transform_source, transform_tree, BuildOptions, BuildReport, CheckReport,
    FileOutcome,
};
pub use resolve::{resolve_debug, Resolution, ResolveReason};
pub use rewrite::{find_markers, MarkerScan};
