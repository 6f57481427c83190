use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "dep-diff",
    about = "Extract added dependencies from diffs of lock, checksum and requirements files",
    version
)]
pub struct Cli {
    /// Patch files to scan; reads stdin when none are given or for `-`
    pub patches: Vec<PathBuf>,

    /// Treat every patch as this ecosystem (npm, go, pypi, none) instead of
    /// detecting it from the file path
    #[arg(short, long, value_name = "NAME")]
    pub ecosystem: Option<String>,

    /// Config file [default: ./.dep-diff/config.toml, fallback ~/.config/dep-diff/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Report format
    #[arg(long, default_value = "terminal", value_name = "FORMAT")]
    pub report: ReportFormat,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print summary line
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum ReportFormat {
    Terminal,
    Json,
}
