//! Common test utilities for metastrip CLI tests.
//!
//! `TestEnv` is an isolated source tree in a temp directory plus helpers to
//! run the metastrip binary against it.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output};

use tempfile::TempDir;

/// Result of running a metastrip CLI command
#[derive(Debug)]
pub struct TestResult {
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl TestResult {
    pub fn combined_output(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

/// Isolated source tree with CLI execution helpers.
pub struct TestEnv {
    pub root: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            root: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// Path relative to the tree root
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.path().join(relative)
    }

    /// Write a source file, creating parent directories
    pub fn file(&self, relative: &str, content: &str) -> &Self {
        let full = self.path(relative);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create directories");
        }
        std::fs::write(&full, content).expect("Failed to write file");
        self
    }

    /// Write a `package.json` with the given name into a directory
    pub fn manifest(&self, dir: &str, name: &str) -> &Self {
        let relative = if dir.is_empty() {
            "package.json".to_string()
        } else {
            format!("{dir}/package.json")
        };
        self.file(&relative, &format!(r#"{{"name": "{name}"}}"#))
    }

    /// Read a file from the default output directory (`dist`)
    pub fn read_out(&self, relative: &str) -> String {
        let full = self.path(&format!("dist/{relative}"));
        std::fs::read_to_string(&full)
            .unwrap_or_else(|e| panic!("Failed to read output {relative}: {e}"))
    }

    pub fn out_exists(&self, relative: &str) -> bool {
        self.path(&format!("dist/{relative}")).exists()
    }

    /// Run metastrip from the tree root
    pub fn run(&self, args: &[&str]) -> TestResult {
        self.run_with_env(args, &[])
    }

    /// Run metastrip with extra environment variables
    pub fn run_with_env(&self, args: &[&str], env_vars: &[(&str, &str)]) -> TestResult {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_metastrip"));
        cmd.current_dir(self.root.path())
            .args(args)
            .env_remove("METASTRIP_MODE");

        for (key, value) in env_vars {
            cmd.env(key, value);
        }

        let output = cmd.output().expect("Failed to execute metastrip");
        to_result(output)
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

fn to_result(output: Output) -> TestResult {
    TestResult {
        success: output.status.success(),
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    }
}

/// Parse the last non-empty stdout line as a JSON object.
pub fn last_json_line(result: &TestResult) -> serde_json::Value {
    let line = result
        .stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .next_back()
        .unwrap_or_else(|| panic!("no stdout lines; stderr:\n{}", result.stderr));
    serde_json::from_str(line).unwrap_or_else(|e| panic!("bad JSON line '{line}': {e}"))
}

/// Assert a file under `dist/` has exactly this content.
pub fn assert_out_eq(env: &TestEnv, relative: &str, expected: &str) {
    let actual = env.read_out(relative);
    assert_eq!(
        actual, expected,
        "output {relative} mismatch\n--- actual ---\n{actual}\n--- expected ---\n{expected}"
    );
}

/// Assert a path stayed byte-identical between source and output.
pub fn assert_passthrough(env: &TestEnv, relative: &str) {
    let source = std::fs::read_to_string(env.path(relative)).expect("read source");
    assert_out_eq(env, relative, &source);
}
