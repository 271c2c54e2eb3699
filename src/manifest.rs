//! Package manifest discovery
//!
//! A source file belongs to the package of its nearest ancestor
//! `package.json`. Nested packages (a dependency bundling another) resolve
//! independently against their own nearest manifest.
//!
//! Manifest problems are never errors here: a manifest that cannot be read
//! or parsed, or that has no `name`, still marks a package boundary - it
//! just has no identity the override set could name.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// File name that marks a package boundary
pub const MANIFEST_FILE: &str = "package.json";

/// The package enclosing a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageBoundary {
    /// Path to the manifest that defines the boundary
    pub manifest_path: PathBuf,
    /// The manifest's `name` field, when present and parseable
    pub name: Option<String>,
}

impl PackageBoundary {
    /// Directory the package occupies
    pub fn root(&self) -> &Path {
        self.manifest_path.parent().unwrap_or(Path::new(""))
    }
}

/// Only the `name` field matters; everything else in the manifest is opaque.
#[derive(Debug, Deserialize)]
struct ManifestName {
    #[serde(default)]
    name: Option<String>,
}

/// Find the nearest enclosing manifest, walking up from `file`.
///
/// The walk is bounded by `root`: the build never consults manifests above
/// the tree it was pointed at. Returns `None` when no manifest exists in the
/// ancestry ("no package").
pub fn find_enclosing(file: &Path, root: &Path) -> Option<PackageBoundary> {
    let mut dir = file.parent();
    while let Some(d) = dir {
        let candidate = d.join(MANIFEST_FILE);
        if candidate.is_file() {
            return Some(PackageBoundary {
                name: read_name(&candidate),
                manifest_path: candidate,
            });
        }
        if d == root || !d.starts_with(root) {
            break;
        }
        dir = d.parent();
    }
    None
}

fn read_name(path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    let parsed: ManifestName = serde_json::from_str(&content).ok()?;
    parsed.name
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_find_enclosing_direct_parent() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"name": "app"}"#).unwrap();
        let file = dir.path().join("src.js");
        fs::write(&file, "").unwrap();

        let boundary = find_enclosing(&file, dir.path()).unwrap();

        assert_eq!(boundary.name.as_deref(), Some("app"));
        assert_eq!(boundary.root(), dir.path());
    }

    #[test]
    fn test_find_enclosing_walks_up() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"name": "app"}"#).unwrap();
        let nested = dir.path().join("src/util");
        fs::create_dir_all(&nested).unwrap();
        let file = nested.join("deep.js");
        fs::write(&file, "").unwrap();

        let boundary = find_enclosing(&file, dir.path()).unwrap();

        assert_eq!(boundary.name.as_deref(), Some("app"));
    }

    #[test]
    fn test_find_enclosing_prefers_nearest() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"name": "app"}"#).unwrap();
        let dep = dir.path().join("node_modules/lib-a");
        fs::create_dir_all(&dep).unwrap();
        fs::write(dep.join("package.json"), r#"{"name": "lib-a"}"#).unwrap();
        let file = dep.join("index.js");
        fs::write(&file, "").unwrap();

        let boundary = find_enclosing(&file, dir.path()).unwrap();

        assert_eq!(boundary.name.as_deref(), Some("lib-a"));
    }

    #[test]
    fn test_find_enclosing_no_manifest() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("loose.js");
        fs::write(&file, "").unwrap();

        assert_eq!(find_enclosing(&file, dir.path()), None);
    }

    #[test]
    fn test_find_enclosing_stops_at_root() {
        // A manifest above the build root must not be consulted.
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"name": "outer"}"#).unwrap();
        let root = dir.path().join("web");
        fs::create_dir_all(&root).unwrap();
        let file = root.join("main.js");
        fs::write(&file, "").unwrap();

        assert_eq!(find_enclosing(&file, &root), None);
    }

    #[test]
    fn test_malformed_manifest_is_anonymous_boundary() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("package.json"), "{not json").unwrap();
        let file = dir.path().join("a.js");
        fs::write(&file, "").unwrap();

        let boundary = find_enclosing(&file, dir.path()).unwrap();

        assert_eq!(boundary.name, None);
    }

    #[test]
    fn test_manifest_without_name_is_anonymous() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"private": true}"#).unwrap();
        let file = dir.path().join("a.js");
        fs::write(&file, "").unwrap();

        let boundary = find_enclosing(&file, dir.path()).unwrap();

        assert_eq!(boundary.name, None);
    }
}
