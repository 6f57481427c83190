//! `dep-diff` — report dependencies added by dependency-file diffs.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]).
//! 2. Load the depfile config ([`config::load_config`]).
//! 3. Read each patch input and split it per file ([`patch::split_patches`]).
//! 4. Pick each file's ecosystem (`--ecosystem` or [`detector::detect_ecosystem`]).
//! 5. Run the matching analyzer ([`analyzer::analyzer_for`]).
//! 6. Render the requested report ([`report`]).
//! 7. Exit `0`, or `1` if any patch could not be read to the end.

mod cli;

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, ReportFormat};
use dep_diff::analyzer::{analyzer_for, Analyzer};
use dep_diff::config::load_config;
use dep_diff::detector::detect_ecosystem;
use dep_diff::models::{Ecosystem, FileDependencies};
use dep_diff::patch::split_patches;
use dep_diff::report;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = load_config(&cwd, cli.config.as_deref())?;
    let forced = cli.ecosystem.as_deref().map(Ecosystem::from_name);

    let inputs = if cli.patches.is_empty() {
        vec![PathBuf::from("-")]
    } else {
        cli.patches.clone()
    };

    let mut results = Vec::new();
    let mut scan_failed = false;

    for input in &inputs {
        let text = read_input(input)?;

        for file_patch in split_patches(&text) {
            let path = file_patch.path.or_else(|| fallback_path(input));
            let ecosystem = match (forced, &path) {
                (Some(ecosystem), _) => ecosystem,
                (None, Some(path)) => detect_ecosystem(path, &config),
                (None, None) => {
                    tracing::warn!(
                        input = %input.display(),
                        "patch has no file headers; pass --ecosystem to choose an analyzer"
                    );
                    Ecosystem::None
                }
            };

            let Some(analyzer) = analyzer_for(ecosystem) else {
                continue;
            };

            let dependencies = match analyzer.analyze(file_patch.body.as_bytes()) {
                Ok(deps) => deps,
                Err(err) => {
                    tracing::error!(input = %input.display(), "{err}");
                    scan_failed = true;
                    err.partial
                }
            };

            tracing::debug!(
                input = %input.display(),
                ecosystem = %ecosystem,
                count = dependencies.len(),
                "analyzed patch"
            );

            results.push(FileDependencies {
                path,
                ecosystem,
                dependencies,
            });
        }
    }

    match cli.report {
        ReportFormat::Terminal => report::terminal::render(&results, cli.quiet),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
    }

    if scan_failed {
        std::process::exit(1);
    }

    Ok(())
}

/// Read a patch input. Bytes that are not UTF-8 are replaced, not rejected.
fn read_input(input: &Path) -> Result<String> {
    let bytes = if input == Path::new("-") {
        let mut bytes = Vec::new();
        std::io::stdin()
            .read_to_end(&mut bytes)
            .context("failed to read patch from stdin")?;
        bytes
    } else {
        std::fs::read(input).with_context(|| format!("failed to read patch {}", input.display()))?
    };
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Name a headerless patch after its input file, minus a `.diff`/`.patch`
/// extension, so `go.sum.diff` is detected as `go.sum`.
fn fallback_path(input: &Path) -> Option<PathBuf> {
    if input == Path::new("-") {
        return None;
    }
    match input.extension().and_then(|e| e.to_str()) {
        Some("diff" | "patch") => Some(input.with_extension("")),
        _ => Some(input.to_path_buf()),
    }
}
