//! Condition Resolver
//!
//! Decides, per source file, whether the development condition is active:
//!
//! - package named in the override set        -> `Some(true)`
//! - else global mode is production           -> `Some(false)`
//! - else global mode is development          -> `Some(true)`
//! - else (unspecified, no override applies)  -> `None`
//!
//! `None` means the marker is left unrewritten and the file passes through.
//! Resolution depends only on the immutable [`BuildConfig`] and the file's
//! enclosing package, so files can be resolved concurrently in any order.

use std::path::Path;

use crate::config::{BuildConfig, BuildMode};
use crate::manifest::{self, PackageBoundary};

/// Why a file resolved the way it did (used by `explain` and verbose output)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveReason {
    /// The enclosing package is in the development-override set
    Overridden,
    /// The global build mode decided the value
    GlobalMode,
    /// Global mode is unspecified and no override applies
    Unspecified,
}

impl ResolveReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolveReason::Overridden => "package override",
            ResolveReason::GlobalMode => "global mode",
            ResolveReason::Unspecified => "unspecified",
        }
    }
}

/// Outcome of resolving one source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The enclosing package, when one was found
    pub package: Option<PackageBoundary>,
    /// The value `import.meta.DEBUG` rewrites to; `None` = leave unrewritten
    pub value: Option<bool>,
    /// How the value was decided
    pub reason: ResolveReason,
}

/// Resolve the debug condition for one source file.
///
/// Walks up from `file` to the nearest enclosing `package.json` (bounded by
/// `root`), then applies the override set and global mode. Never errors:
/// ambiguous boundaries fail open to `None`.
pub fn resolve_debug(file: &Path, root: &Path, config: &BuildConfig) -> Resolution {
    let package = manifest::find_enclosing(file, root);

    if let Some(name) = package.as_ref().and_then(|p| p.name.as_deref()) {
        if config.is_development(name) {
            return Resolution {
                package,
                value: Some(true),
                reason: ResolveReason::Overridden,
            };
        }
    }

    let (value, reason) = match config.mode {
        BuildMode::Production => (Some(false), ResolveReason::GlobalMode),
        BuildMode::Development => (Some(true), ResolveReason::GlobalMode),
        BuildMode::Unspecified => (None, ResolveReason::Unspecified),
    };

    Resolution {
        package,
        value,
        reason,
    }
}
