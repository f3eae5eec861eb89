#![deny(unsafe_code)]

//! srcimport CLI — import files from another project, GitHub, or the web.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use srcimport_config::AppConfig;
use srcimport_core::pipeline::{ImportOptions, StdinPrompt, run_import};
use srcimport_core::provider::{
    GitHubFileProvider, HttpFileProvider, LocalFileProvider, ProviderRegistry, build_http_client,
};
use srcimport_core::{FileOutcome, GitHubAuth};

/// Import file(s) from another project, GitHub, or a public website.
#[derive(Parser)]
#[command(name = "srcimport", version, about, long_about = None)]
struct Cli {
    /// Input file paths or URLs (https://… or github:user@repo/REF/path/to/file).
    ///
    /// If the GH_TOKEN or GITHUB_TOKEN environment variable is defined, it
    /// is used to access GitHub.
    #[arg(short, long = "input-files", required = true, num_args = 1..)]
    input: Vec<String>,

    /// Output folder or file path. The current folder is used if omitted.
    #[arg(short, long, default_value = ".")]
    output_path: PathBuf,

    /// Output file prefix, used when the output path is a folder.
    #[arg(short = 'p', long)]
    output_prefix: Option<String>,

    /// Overwrite without confirmation, even if the destination is newer.
    #[arg(short, long)]
    force_overwrite: bool,

    /// [C#] Change the namespace. A name ending with '.' is prepended
    /// to the existing name instead of replacing it.
    #[arg(long)]
    namespace: Option<String>,

    /// [C#] Change top-level type visibility to `internal`.
    #[arg(long)]
    internal: bool,

    /// Network timeout in seconds (overrides the config file).
    #[arg(long)]
    timeout: Option<u64>,

    /// Path to a TOML configuration file.
    #[arg(long, default_value = "srcimport.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log errors only.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up tracing subscriber with verbosity level
    let filter = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    if cli.input.iter().any(|input| input.trim().is_empty()) {
        anyhow::bail!("empty input file path or url");
    }

    let mut config = load_config(&cli.config).await?;
    if let Some(timeout) = cli.timeout {
        if timeout == 0 {
            anyhow::bail!("--timeout must be non-zero");
        }
        config.network.timeout_secs = timeout;
    }

    let namespace = cli.namespace.filter(|n| !n.trim().is_empty());

    let client = build_http_client(&config.network)?;
    let auth = GitHubAuth::from_env(&config.github);

    let mut registry = ProviderRegistry::new();
    registry.register(Box::new(LocalFileProvider));
    registry.register(Box::new(HttpFileProvider::new(client.clone())));
    registry.register(Box::new(GitHubFileProvider::new(
        client,
        auth,
        &config.github,
    )));

    let options = ImportOptions {
        output_path: cli.output_path,
        output_prefix: cli.output_prefix,
        force_overwrite: cli.force_overwrite,
        namespace,
        make_types_internal: cli.internal,
    };

    let summary = run_import(&cli.input, &options, &registry, &StdinPrompt).await?;

    println!(
        "{} file(s): {} written, {} overwritten, {} up to date, {} skipped",
        summary.total(),
        summary.count(FileOutcome::Written),
        summary.count(FileOutcome::Overwritten),
        summary.count(FileOutcome::UpToDate),
        summary.count(FileOutcome::Skipped),
    );

    Ok(())
}

async fn load_config(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        Ok(AppConfig::load(path).await?)
    } else {
        info!(path = %path.display(), "Config file not found, using defaults");
        Ok(AppConfig::default())
    }
}
