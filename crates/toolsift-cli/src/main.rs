#![deny(unsafe_code)]

//! Toolsift CLI — query a tool catalog the way an agent would.

mod catalog;
mod output;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use toolsift_config::AppConfig;
use toolsift_core::ToolLoader;

use crate::catalog::Catalog;

/// Toolsift — relevance-ranked, token-budgeted tool selection.
#[derive(Parser)]
#[command(name = "toolsift", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, default_value = "toolsift.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Select tools from a catalog for a query.
    Search {
        /// Natural-language query.
        query: String,

        /// TOML file with one `[[tools]]` table per tool.
        #[arg(long)]
        catalog: PathBuf,

        /// Maximum number of returned tools, essentials included.
        #[arg(long)]
        limit: Option<usize>,

        /// Token budget for the returned descriptors.
        #[arg(long)]
        max_tokens: Option<usize>,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Index a catalog and print its statistics.
    Stats {
        /// TOML file with one `[[tools]]` table per tool.
        #[arg(long)]
        catalog: PathBuf,
    },

    /// Validate and display configuration.
    Config {
        /// Show the resolved configuration.
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, from_file) = load_config(&cli.config).await?;

    // RUST_LOG wins, then -v, then the configured level.
    let filter = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if !from_file {
        info!(path = %cli.config.display(), "Config file not found, using defaults");
    }

    match cli.command {
        Commands::Search {
            query,
            catalog,
            limit,
            max_tokens,
            json,
        } => cmd_search(config, &catalog, &query, limit, max_tokens, json).await?,
        Commands::Stats { catalog } => cmd_stats(config, &catalog).await?,
        Commands::Config { show } => cmd_config(&config, &cli.config, from_file, show)?,
    }

    Ok(())
}

async fn cmd_search(
    config: AppConfig,
    catalog_path: &Path,
    query: &str,
    limit: Option<usize>,
    max_tokens: Option<usize>,
    json: bool,
) -> Result<()> {
    let limit = limit
        .unwrap_or(config.selector.essential_tools.len() + config.selector.max_layer2_tools);
    let max_tokens = max_tokens.unwrap_or(config.selector.max_tokens);

    let loader = build_loader(config, catalog_path).await?;
    debug!(query, limit, max_tokens, "searching catalog");
    let result = loader.search(query, limit, max_tokens)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", output::render_result(&result));
    }
    Ok(())
}

async fn cmd_stats(config: AppConfig, catalog_path: &Path) -> Result<()> {
    let loader = build_loader(config, catalog_path).await?;
    print!("{}", output::render_stats(&loader.stats()));
    Ok(())
}

fn cmd_config(config: &AppConfig, path: &Path, from_file: bool, show: bool) -> Result<()> {
    if show {
        let toml_str = toml::to_string_pretty(config).context("failed to render configuration")?;
        println!("{toml_str}");
    } else if from_file {
        println!("Configuration at '{}' is valid.", path.display());
    } else {
        println!(
            "No configuration at '{}'; defaults are valid.",
            path.display()
        );
    }
    Ok(())
}

async fn build_loader(config: AppConfig, catalog_path: &Path) -> Result<ToolLoader> {
    let catalog = Catalog::load(catalog_path).await?;
    let loader = ToolLoader::new(config.selector)?;
    loader.register_tools(catalog.tools)?;
    Ok(loader)
}

/// Load the config file if it exists, else defaults. The flag reports which.
async fn load_config(path: &Path) -> Result<(AppConfig, bool)> {
    if tokio::fs::try_exists(path).await.unwrap_or(false) {
        let config = AppConfig::load(path)
            .await
            .with_context(|| format!("failed to load config '{}'", path.display()))?;
        Ok((config, true))
    } else {
        Ok((AppConfig::default(), false))
    }
}
