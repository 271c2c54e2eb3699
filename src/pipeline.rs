//! Build pipeline
//!
//! Composes the resolver, rewriter, and eliminator linearly per file, and
//! mirrors a source tree into the output directory. Files are independent:
//! the walk collects paths first, then rayon processes them in parallel
//! against the read-only [`BuildConfig`] - no shared mutable state, no
//! coordination, order irrelevant.

use std::path::{Component, Path, PathBuf};

use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;
use rayon::prelude::*;
use serde::Serialize;

use crate::config::{BuildConfig, CONFIG_FILE};
use crate::error::{MetastripError, MetastripResult};
use crate::fold;
use crate::fs::{atomic_write, hash_content, hash_file};
use crate::resolve::resolve_debug;
use crate::rewrite::find_markers;
use crate::scan::tokenize;

/// Extensions treated as JavaScript sources
pub const JS_EXTENSIONS: &[&str] = &["js", "mjs", "cjs", "jsx"];

/// What happened to one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOutcome {
    /// Non-JavaScript (or non-UTF-8) file copied through unchanged
    Copied,
    /// No marker present, or no condition resolved - passed through intact
    Unchanged,
    /// Reassignment guard tripped; file treated as ordinary code
    Opaque,
    /// Marker substituted and guarded branches eliminated
    Rewritten { occurrences: usize, folded: usize },
}

impl FileOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            FileOutcome::Copied => "copied",
            FileOutcome::Unchanged => "unchanged",
            FileOutcome::Opaque => "opaque",
            FileOutcome::Rewritten { .. } => "rewritten",
        }
    }
}

/// Per-file result, path relative to the source root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

/// Aggregate result of a build
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub files: Vec<FileReport>,
}

impl BuildReport {
    pub fn rewritten(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Rewritten { .. }))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Unchanged))
    }

    pub fn copied(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Copied))
    }

    pub fn opaque(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Opaque))
    }

    fn count(&self, f: impl Fn(&FileOutcome) -> bool) -> usize {
        self.files.iter().filter(|r| f(&r.outcome)).count()
    }
}

/// Inputs to a build, fixed before any file is touched
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub source: PathBuf,
    pub out: PathBuf,
    pub config: BuildConfig,
    pub exclude: Vec<String>,
    pub dry_run: bool,
}

/// Result of `check`: differences between the out dir and a fresh build
#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    /// Expected outputs absent from the out dir
    pub missing: Vec<PathBuf>,
    /// Outputs whose content no longer matches
    pub stale: Vec<PathBuf>,
    /// Files in the out dir with no source counterpart
    pub orphaned: Vec<PathBuf>,
    /// Total files compared
    pub checked: usize,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.stale.is_empty() && self.orphaned.is_empty()
    }
}

/// Transform one source string against a resolved debug value.
///
/// `None` (unspecified) passes the file through byte-identical so it stays
/// valid in environments with no support for the construct.
pub fn transform_source(src: &str, value: Option<bool>) -> (String, FileOutcome) {
    let tokens = tokenize(src);
    let scan = find_markers(src, &tokens);

    if scan.is_empty() {
        return (src.to_string(), FileOutcome::Unchanged);
    }
    if scan.reassigned {
        return (src.to_string(), FileOutcome::Opaque);
    }
    let Some(value) = value else {
        return (src.to_string(), FileOutcome::Unchanged);
    };

    let outcome = fold::apply(src, value);
    (
        outcome.output,
        FileOutcome::Rewritten {
            occurrences: outcome.occurrences,
            folded: outcome.folded,
        },
    )
}

/// Is this a JavaScript source by extension?
pub fn is_js(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| JS_EXTENSIONS.contains(&e))
        .unwrap_or(false)
}

/// Collect every file under `source`, excluding hidden entries, the out
/// directory, the metastrip config itself, and any configured patterns.
///
/// Gitignore rules are deliberately NOT applied: `node_modules` is almost
/// always gitignored but is exactly where dependency packages live, and the
/// nested-package overrides have to reach them.
pub fn collect_files(
    source: &Path,
    out: &Path,
    exclude: &[String],
) -> MetastripResult<Vec<PathBuf>> {
    let mut overrides = OverrideBuilder::new(source);
    for pattern in exclude {
        overrides
            .add(&format!("!{pattern}"))
            .map_err(|e| MetastripError::InvalidExclude {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
    }
    let overrides = overrides
        .build()
        .map_err(|e| MetastripError::InvalidExclude {
            pattern: exclude.join(", "),
            message: e.to_string(),
        })?;

    let walker = WalkBuilder::new(source)
        .standard_filters(false)
        .hidden(true)
        .overrides(overrides)
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            // unreadable entries are skipped, not fatal
            Err(_) => continue,
        };
        let path = entry.path();
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        if path.starts_with(out) {
            continue;
        }
        if path.file_name().is_some_and(|n| n == CONFIG_FILE) && path.parent() == Some(source) {
            continue;
        }
        files.push(path.to_path_buf());
    }
    files.sort();
    Ok(files)
}

/// Transform the whole tree under `options.source` into `options.out`.
pub fn transform_tree(options: &BuildOptions) -> MetastripResult<BuildReport> {
    if !options.source.is_dir() {
        return Err(MetastripError::SourceNotFound {
            path: options.source.clone(),
        });
    }

    let files = collect_files(&options.source, &options.out, &options.exclude)?;

    let mut reports = files
        .par_iter()
        .map(|path| {
            let (rel, dest) = destination(path, options)?;
            let content = produce(path, &options.source, &options.config)?;
            if !options.dry_run {
                atomic_write(&dest, &content.bytes)?;
            }
            Ok(FileReport {
                path: rel,
                outcome: content.outcome,
            })
        })
        .collect::<MetastripResult<Vec<_>>>()?;

    reports.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(BuildReport { files: reports })
}

/// Compare the out dir against a fresh in-memory build.
pub fn check_tree(options: &BuildOptions) -> MetastripResult<CheckReport> {
    if !options.source.is_dir() {
        return Err(MetastripError::SourceNotFound {
            path: options.source.clone(),
        });
    }

    let files = collect_files(&options.source, &options.out, &options.exclude)?;

    enum State {
        Ok,
        Missing,
        Stale,
    }

    let results = files
        .par_iter()
        .map(|path| {
            let (rel, dest) = destination(path, options)?;
            let content = produce(path, &options.source, &options.config)?;
            let state = if !dest.is_file() {
                State::Missing
            } else if hash_content(&content.bytes) != hash_file(&dest)? {
                State::Stale
            } else {
                State::Ok
            };
            Ok((rel, dest, state))
        })
        .collect::<MetastripResult<Vec<(PathBuf, PathBuf, State)>>>()?;

    let mut report = CheckReport {
        checked: results.len(),
        ..Default::default()
    };
    let mut expected: Vec<PathBuf> = Vec::with_capacity(results.len());
    for (rel, dest, state) in results {
        match state {
            State::Missing => report.missing.push(rel),
            State::Stale => report.stale.push(rel),
            State::Ok => {}
        }
        expected.push(dest);
    }
    report.missing.sort();
    report.stale.sort();

    if options.out.is_dir() {
        let walker = WalkBuilder::new(&options.out)
            .standard_filters(false)
            .hidden(true)
            .build();
        for entry in walker {
            let Ok(entry) = entry else { continue };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let path = entry.into_path();
            if !expected.contains(&path) {
                let rel = path.strip_prefix(&options.out).unwrap_or(&path);
                report.orphaned.push(rel.to_path_buf());
            }
        }
        report.orphaned.sort();
    }

    Ok(report)
}

struct Produced {
    bytes: Vec<u8>,
    outcome: FileOutcome,
}

/// Produce the output bytes for one source file.
fn produce(path: &Path, source: &Path, config: &BuildConfig) -> MetastripResult<Produced> {
    let raw = std::fs::read(path)?;

    if !is_js(path) {
        return Ok(Produced {
            bytes: raw,
            outcome: FileOutcome::Copied,
        });
    }

    // Fail open: a .js file that is not UTF-8 is copied through untouched.
    let Ok(text) = std::str::from_utf8(&raw) else {
        return Ok(Produced {
            bytes: raw,
            outcome: FileOutcome::Copied,
        });
    };

    let resolution = resolve_debug(path, source, config);
    let (output, outcome) = transform_source(text, resolution.value);
    Ok(Produced {
        bytes: output.into_bytes(),
        outcome,
    })
}

/// Relative path and destination for a collected file, with a traversal
/// guard: a computed destination must stay inside the out root.
fn destination(path: &Path, options: &BuildOptions) -> MetastripResult<(PathBuf, PathBuf)> {
    let rel = path
        .strip_prefix(&options.source)
        .unwrap_or(path)
        .to_path_buf();
    if rel.is_absolute() || rel.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(MetastripError::PathEscape {
            path: rel,
            root: options.out.clone(),
        });
    }
    let dest = options.out.join(&rel);
    Ok((rel, dest))
}
