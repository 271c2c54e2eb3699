//! Configuration for metastrip
//!
//! Implements the configuration hierarchy:
//! 1. CLI flags (highest priority)
//! 2. Environment variables (METASTRIP_*)
//! 3. Project config (metastrip.toml at the source root)
//! 4. Built-in defaults (lowest priority)
//!
//! The merged result is a [`BuildConfig`], fixed once per invocation and
//! never mutated after construction. Every file resolves against the same
//! value, so concurrent processing needs no coordination.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MetastripError, MetastripResult};

/// File name of the project configuration
pub const CONFIG_FILE: &str = "metastrip.toml";

/// Process-wide build mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// `import.meta.DEBUG` resolves to `true` everywhere
    Development,
    /// `import.meta.DEBUG` resolves to `false` unless a package is overridden
    Production,
    /// The marker is left unrewritten; files pass through untouched
    #[default]
    Unspecified,
}

impl BuildMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildMode::Development => "development",
            BuildMode::Production => "production",
            BuildMode::Unspecified => "unspecified",
        }
    }
}

impl std::fmt::Display for BuildMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildMode {
    type Err = MetastripError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(BuildMode::Development),
            "production" | "prod" => Ok(BuildMode::Production),
            "unspecified" => Ok(BuildMode::Unspecified),
            _ => Err(MetastripError::InvalidMode {
                value: s.to_string(),
            }),
        }
    }
}

/// Project configuration as read from `metastrip.toml`
///
/// All fields are optional; an absent file behaves like an empty one.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Global build mode (`development` | `production` | `unspecified`)
    #[serde(default)]
    pub mode: Option<BuildMode>,

    /// Package names forced into development mode regardless of `mode`
    #[serde(default)]
    pub development: Vec<String>,

    /// Output directory, relative to the source root
    #[serde(default)]
    pub out: Option<PathBuf>,

    /// Extra glob patterns excluded from the walk (on top of hidden files
    /// and the output directory, which are always skipped)
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Non-fatal configuration warning surfaced to CLI users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub key: String,
    pub file: PathBuf,
}

impl FileConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> MetastripResult<Self> {
        let (config, _warnings) = Self::load_with_warnings(path)?;
        Ok(config)
    }

    /// Load configuration and collect non-fatal warnings (unknown keys).
    pub fn load_with_warnings(path: &Path) -> MetastripResult<(Self, Vec<ConfigWarning>)> {
        let content = fs::read_to_string(path)?;

        let mut unknown_paths: Vec<String> = Vec::new();
        let deserializer = toml::de::Deserializer::new(&content);

        let config: Self = serde_ignored::deserialize(deserializer, |path| {
            unknown_paths.push(path.to_string());
        })
        .map_err(|e| MetastripError::InvalidConfig {
            file: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let warnings = unknown_paths
            .into_iter()
            .map(|key| ConfigWarning {
                key,
                file: path.to_path_buf(),
            })
            .collect();

        Ok((config, warnings))
    }

    /// Load from `<root>/metastrip.toml`, or defaults when absent.
    pub fn load_or_default(root: &Path) -> MetastripResult<Self> {
        let path = root.join(CONFIG_FILE);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Immutable build configuration, merged from all layers.
///
/// Computed once before any file processing begins (never a runtime-mutable
/// global) and passed by reference into each file's resolution call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// Global build mode
    pub mode: BuildMode,
    /// Package names explicitly placed into development mode
    development: BTreeSet<String>,
}

impl BuildConfig {
    /// Construct directly (tests, embedding).
    pub fn new(mode: BuildMode, development: impl IntoIterator<Item = String>) -> Self {
        Self {
            mode,
            development: development.into_iter().collect(),
        }
    }

    /// Merge CLI flags, `METASTRIP_MODE`, and the project config.
    ///
    /// Development overrides are additive across layers: a package named on
    /// the command line AND in metastrip.toml is still just overridden.
    pub fn merge(
        cli_mode: Option<BuildMode>,
        cli_development: &[String],
        file: &FileConfig,
    ) -> MetastripResult<Self> {
        let env_mode = match std::env::var("METASTRIP_MODE") {
            Ok(value) => Some(BuildMode::from_str(&value)?),
            Err(_) => None,
        };

        let mode = cli_mode
            .or(env_mode)
            .or(file.mode)
            .unwrap_or_default();

        let development: BTreeSet<String> = cli_development
            .iter()
            .chain(file.development.iter())
            .cloned()
            .collect();

        Ok(Self { mode, development })
    }

    /// Is this package name in the development-override set?
    pub fn is_development(&self, package: &str) -> bool {
        self.development.contains(package)
    }

    /// Overridden package names, sorted (for reporting).
    pub fn development_packages(&self) -> impl Iterator<Item = &str> {
        self.development.iter().map(String::as_str)
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self::new(BuildMode::Unspecified, [])
    }
}
