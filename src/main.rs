mod cli;
mod config;
mod error;
mod executor;
mod filter;
mod manifest;
mod models;
mod orchestrator;
mod output;
mod policy;
mod registry;
mod selector;
mod source;

use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::Cli;
use config::RunConfig;
use manifest::ManifestClient;
use orchestrator::Orchestrator;
use output::print_summary;
use registry::RegistryClient;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli).await {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("warn,pkgprune={}", level))),
        )
        .init();
}

/// Returns whether every delete succeeded.
async fn run(cli: &Cli) -> Result<bool> {
    let config = RunConfig::from_cli(cli)?;

    tracing::debug!(policy = ?config.policy, dry_run = config.dry_run, "resolved configuration");

    let client = RegistryClient::new(&cli.api_url, &config.token)?;
    let manifests = if config.protect_platform_images {
        Some(ManifestClient::new(&cli.container_registry_url, &config.token)?)
    } else {
        None
    };

    let report = Orchestrator::new(&config, &client, manifests.as_ref())
        .run()
        .await
        .context("retention run failed")?;

    print_summary(&report);

    Ok(report.is_success())
}
