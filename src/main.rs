//! metastrip CLI - statically strip `import.meta.DEBUG` branches
//!
//! Usage: metastrip <COMMAND>
//!
//! Commands:
//!   build    Transform a source tree into the output directory
//!   check    Verify the output directory matches a fresh build
//!   diff     Preview what a build would change, without writing
//!   explain  Show how the debug condition resolves for one file

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use similar::TextDiff;

use metastrip::{
    check_tree, transform_source, transform_tree, BuildConfig, BuildMode, BuildOptions,
    FileConfig, FileOutcome, resolve_debug,
};

/// metastrip - build-time elimination of import.meta.DEBUG branches
#[derive(Parser, Debug)]
#[command(name = "metastrip")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output format for CI
    #[arg(long, default_value = "false")]
    json: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Transform a source tree into the output directory
    Build {
        #[command(flatten)]
        args: BuildArgs,

        /// Dry run - report outcomes without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Verify the output directory matches a fresh build (exits non-zero on drift)
    Check {
        #[command(flatten)]
        args: BuildArgs,
    },

    /// Preview what a build would change, without writing
    Diff {
        #[command(flatten)]
        args: BuildArgs,
    },

    /// Show how the debug condition resolves for one file
    Explain {
        /// Source file to explain
        file: PathBuf,

        #[command(flatten)]
        args: BuildArgs,
    },
}

/// Arguments shared by every tree-level command
#[derive(Parser, Debug)]
struct BuildArgs {
    /// Source tree root
    #[arg(short, long, default_value = ".")]
    source: PathBuf,

    /// Output directory (defaults to metastrip.toml `out`, then "dist")
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Build mode: development | production | unspecified
    #[arg(short, long)]
    mode: Option<BuildMode>,

    /// Package name to force into development mode (repeatable)
    #[arg(short, long)]
    development: Vec<String>,

    /// Glob pattern to exclude from the walk (repeatable)
    #[arg(long)]
    exclude: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { args, dry_run } => cmd_build(&args, dry_run, cli.json, cli.verbose),
        Commands::Check { args } => cmd_check(&args, cli.json),
        Commands::Diff { args } => cmd_diff(&args, cli.json),
        Commands::Explain { file, args } => cmd_explain(&file, &args, cli.json),
    }
}

/// Merge CLI args with metastrip.toml and the environment into build options.
fn load_options(args: &BuildArgs, dry_run: bool, json: bool) -> Result<BuildOptions> {
    let config_path = args.source.join(metastrip::config::CONFIG_FILE);
    let (file_config, warnings) = if config_path.exists() {
        FileConfig::load_with_warnings(&config_path)?
    } else {
        (FileConfig::default(), Vec::new())
    };

    if !json {
        for warning in &warnings {
            eprintln!(
                "⚠ Unknown key '{}' in {}",
                warning.key,
                warning.file.display()
            );
        }
    }

    let config = BuildConfig::merge(args.mode, &args.development, &file_config)?;

    let out = args
        .out
        .clone()
        .or(file_config.out)
        .unwrap_or_else(|| PathBuf::from("dist"));
    let out = if out.is_absolute() {
        out
    } else {
        args.source.join(out)
    };

    let mut exclude = args.exclude.clone();
    exclude.extend(file_config.exclude);

    Ok(BuildOptions {
        source: args.source.clone(),
        out,
        config,
        exclude,
        dry_run,
    })
}

fn cmd_build(args: &BuildArgs, dry_run: bool, json: bool, verbose: u8) -> Result<()> {
    let options = load_options(args, dry_run, json)?;

    if !json {
        println!("🧹 Metastrip Build");
        println!("Source: {}", options.source.display());
        println!("Out: {}", options.out.display());
        println!("Mode: {}", options.config.mode);
        let overrides: Vec<&str> = options.config.development_packages().collect();
        if !overrides.is_empty() {
            println!("Development overrides: {}", overrides.join(", "));
        }
        if dry_run {
            println!("Option: Dry run");
        }
        println!();
    }

    let report = transform_tree(&options)?;

    if json {
        let output = serde_json::json!({
            "event": "build",
            "mode": options.config.mode.as_str(),
            "dry_run": dry_run,
            "files": report.files.len(),
            "rewritten": report.rewritten(),
            "unchanged": report.unchanged(),
            "copied": report.copied(),
            "opaque": report.opaque(),
        });
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    if verbose > 0 {
        for file in &report.files {
            match file.outcome {
                FileOutcome::Rewritten {
                    occurrences,
                    folded,
                } => println!(
                    "  ~ {} ({} markers, {} branches folded)",
                    file.path.display(),
                    occurrences,
                    folded
                ),
                FileOutcome::Opaque => println!("  ! {} (marker reassigned)", file.path.display()),
                FileOutcome::Unchanged => println!("  = {}", file.path.display()),
                FileOutcome::Copied => println!("  + {}", file.path.display()),
            }
        }
        println!();
    }

    println!("📊 Build Results:");
    println!("  ~ Rewritten: {} files", report.rewritten());
    println!("  = Unchanged: {} files", report.unchanged());
    println!("  + Copied: {} files", report.copied());
    if report.opaque() > 0 {
        println!("  ! Opaque (marker reassigned): {} files", report.opaque());
    }
    println!();

    Ok(())
}

fn cmd_check(args: &BuildArgs, json: bool) -> Result<()> {
    let options = load_options(args, true, json)?;

    if !json {
        println!("🩺 Metastrip Check");
        println!("Source: {}", options.source.display());
        println!("Out: {}", options.out.display());
        println!();
    }

    let report = check_tree(&options)?;

    if json {
        let output = serde_json::json!({
            "event": "check",
            "checked": report.checked,
            "missing": report.missing.len(),
            "stale": report.stale.len(),
            "orphaned": report.orphaned.len(),
            "clean": report.is_clean(),
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        if !report.missing.is_empty() {
            println!("📁 Missing outputs ({}):", report.missing.len());
            for path in &report.missing {
                println!("  + {}", path.display());
            }
            println!();
        }
        if !report.stale.is_empty() {
            println!("📝 Stale outputs ({}):", report.stale.len());
            for path in &report.stale {
                println!("  ~ {}", path.display());
            }
            println!();
        }
        if !report.orphaned.is_empty() {
            println!("👻 Orphaned outputs ({}):", report.orphaned.len());
            for path in &report.orphaned {
                println!("  - {}", path.display());
            }
            println!();
        }

        if report.is_clean() {
            println!("🟢 Output is up to date ({} files checked)", report.checked);
        } else {
            println!(
                "🔴 Output is out of date - run 'metastrip build' ({} missing, {} stale, {} orphaned)",
                report.missing.len(),
                report.stale.len(),
                report.orphaned.len()
            );
        }
    }

    if !report.is_clean() {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_diff(args: &BuildArgs, json: bool) -> Result<()> {
    let options = load_options(args, true, json)?;

    if !json {
        println!("📊 Metastrip Diff");
        println!("Source: {}", options.source.display());
        println!();
    }

    let files = metastrip::pipeline::collect_files(&options.source, &options.out, &options.exclude)?;

    let mut changed = 0usize;
    let mut unchanged = 0usize;

    for path in &files {
        if !metastrip::pipeline::is_js(path) {
            continue;
        }
        let Ok(text) = std::fs::read_to_string(path) else {
            continue;
        };
        let resolution = resolve_debug(path, &options.source, &options.config);
        let (output, _) = transform_source(&text, resolution.value);

        let rel = path.strip_prefix(&options.source).unwrap_or(path);
        if output == text {
            unchanged += 1;
            continue;
        }
        changed += 1;

        if json {
            let event = serde_json::json!({
                "event": "file_diff",
                "path": rel.display().to_string(),
            });
            println!("{}", serde_json::to_string(&event)?);
        } else {
            println!("~ {}", rel.display());
            let diff = TextDiff::from_lines(&text, &output);
            print!(
                "{}",
                diff.unified_diff()
                    .context_radius(2)
                    .header("source", "built")
            );
            println!();
        }
    }

    if json {
        let output = serde_json::json!({
            "event": "diff",
            "changed": changed,
            "unchanged": unchanged,
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Summary: {changed} changed, {unchanged} unchanged");
    }

    Ok(())
}

fn cmd_explain(file: &Path, args: &BuildArgs, json: bool) -> Result<()> {
    use anyhow::Context;

    let options = load_options(args, true, json)?;

    // Canonicalize so the boundary walk sees file and root on the same stem.
    let root = options
        .source
        .canonicalize()
        .with_context(|| format!("source not found: {}", options.source.display()))?;
    let file = file
        .canonicalize()
        .with_context(|| format!("file not found: {}", file.display()))?;

    let resolution = resolve_debug(&file, &root, &options.config);
    let (markers, reassigned) = match std::fs::read_to_string(&file) {
        Ok(text) => {
            let tokens = metastrip::scan::tokenize(&text);
            let scan = metastrip::find_markers(&text, &tokens);
            (scan.sites.len(), scan.reassigned)
        }
        Err(_) => (0, false),
    };

    let value = match resolution.value {
        Some(true) => "true",
        Some(false) => "false",
        None => "unresolved (left as-is)",
    };

    if json {
        let output = serde_json::json!({
            "event": "explain",
            "file": file.display().to_string(),
            "package": resolution.package.as_ref().and_then(|p| p.name.clone()),
            "manifest": resolution
                .package
                .as_ref()
                .map(|p| p.manifest_path.display().to_string()),
            "value": resolution.value,
            "reason": resolution.reason.as_str(),
            "markers": markers,
            "reassigned": reassigned,
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("🔍 Explain: {}", file.display());
        match &resolution.package {
            Some(package) => {
                println!(
                    "  Package: {}",
                    package.name.as_deref().unwrap_or("(anonymous)")
                );
                println!("  Manifest: {}", package.manifest_path.display());
            }
            None => println!("  Package: none (no package.json up to the build root)"),
        }
        println!("  Mode: {}", options.config.mode);
        println!("  import.meta.DEBUG -> {value} ({})", resolution.reason.as_str());
        println!("  Markers in file: {markers}");
        if reassigned {
            println!("  ! Marker is reassigned - file will pass through untouched");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_build() {
        let cli = Cli::try_parse_from(["metastrip", "build"]).unwrap();
        assert!(matches!(cli.command, Commands::Build { .. }));
    }

    #[test]
    fn test_cli_parse_build_with_args() {
        let cli = Cli::try_parse_from([
            "metastrip",
            "build",
            "--source",
            "web",
            "--mode",
            "production",
            "--development",
            "lib-a",
            "--development",
            "lib-b",
            "--dry-run",
        ])
        .unwrap();

        if let Commands::Build { args, dry_run } = cli.command {
            assert_eq!(args.source, PathBuf::from("web"));
            assert_eq!(args.mode, Some(BuildMode::Production));
            assert_eq!(args.development, vec!["lib-a", "lib-b"]);
            assert!(dry_run);
        } else {
            panic!("Expected Build command");
        }
    }

    #[test]
    fn test_cli_parse_invalid_mode_rejected() {
        assert!(Cli::try_parse_from(["metastrip", "build", "--mode", "release"]).is_err());
    }

    #[test]
    fn test_cli_parse_check() {
        let cli = Cli::try_parse_from(["metastrip", "check", "--out", "build"]).unwrap();
        if let Commands::Check { args } = cli.command {
            assert_eq!(args.out, Some(PathBuf::from("build")));
        } else {
            panic!("Expected Check command");
        }
    }

    #[test]
    fn test_cli_parse_explain() {
        let cli = Cli::try_parse_from(["metastrip", "explain", "src/app.js"]).unwrap();
        if let Commands::Explain { file, .. } = cli.command {
            assert_eq!(file, PathBuf::from("src/app.js"));
        } else {
            panic!("Expected Explain command");
        }
    }

    #[test]
    fn test_cli_json_flag() {
        let cli = Cli::try_parse_from(["metastrip", "--json", "build"]).unwrap();
        assert!(cli.json);
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::try_parse_from(["metastrip", "-vv", "build"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
