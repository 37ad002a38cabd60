//! Refreshes the bundled Vulkan registry from a Vulkan-Headers checkout.
//!
//! ```bash
//! update ../Vulkan-Headers
//! update ../Vulkan-Headers --target /tmp/registry --no-manifest
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use vulkan_object::{Synchronizer, DEFAULT_API};

/// Copy `registry/` of a Vulkan-Headers checkout into the bundled registry
/// and record its header version.
#[derive(Parser, Debug)]
#[command(name = "update")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Root of the Vulkan-Headers checkout
    #[arg(value_name = "VULKAN_HEADERS")]
    source: PathBuf,

    /// Registry directory to replace (default: the bundled registry)
    #[arg(long, value_name = "DIR")]
    target: Option<PathBuf>,

    /// Manifest whose version line follows the registry version
    #[arg(long, value_name = "FILE", conflicts_with = "no_manifest")]
    manifest: Option<PathBuf>,

    /// Leave the manifest untouched
    #[arg(long)]
    no_manifest: bool,

    /// API to validate the registry against
    #[arg(long, default_value = DEFAULT_API)]
    api: String,
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut synchronizer = match &cli.target {
        Some(target) => Synchronizer::new(target),
        None => Synchronizer::bundled(),
    }
    .with_api(cli.api);
    if !cli.no_manifest {
        let manifest = cli
            .manifest
            .unwrap_or_else(|| PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml")));
        synchronizer = synchronizer.with_manifest(manifest);
    }

    let report = synchronizer
        .sync(&cli.source)
        .with_context(|| {
            format!(
                "failed to update {} from {}",
                synchronizer.target().display(),
                cli.source.display()
            )
        })?;

    println!("Updated {} to Vulkan {}", report.target.display(), report.version);
    if !report.manifest_updated && !cli.no_manifest {
        println!("Manifest version was not updated");
    }
    Ok(())
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
