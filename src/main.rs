use anyhow::{Context, Result};
use astra::Server;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::db::Database;
use crate::domain::catalog::process_repository;
use crate::domain::query::CatalogIndex;
use crate::router::respond;
use crate::scraper::run_marketplace_scrape;
use crate::state::AppState;

mod auth;
mod config;
mod contact;
mod db;
mod domain;
mod errors;
mod responses;
mod router;
mod scraper;
mod state;
mod templates;
mod whatsapp;

#[cfg(test)]
mod tests;

#[derive(Parser)]
#[command(name = "propiedades")]
#[command(about = "Marketplace scraper, listing catalog and web app")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape listing pages into the raw repository
    Scrape {
        /// JSON array of listing URLs or {link, id, ciudad, tipo_operacion} objects
        #[arg(long)]
        links: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Build the catalog document from the raw repository
    Process {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Run the web app
    Serve {
        #[arg(long)]
        addr: Option<String>,
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("Failed to load configuration")?;

    match cli.command {
        Commands::Scrape {
            links,
            output,
            limit,
        } => {
            let output = output.unwrap_or_else(|| config.repository_path.clone());
            let summary = run_marketplace_scrape(&config, &links, &output, limit)
                .with_context(|| format!("Scrape from {} failed", links.display()))?;
            info!(
                attempted = summary.attempted,
                scraped = summary.scraped,
                failed = summary.failed,
                "scrape finished"
            );
        }
        Commands::Process { input, output } => {
            let input = input.unwrap_or_else(|| config.repository_path.clone());
            let output = output.unwrap_or_else(|| config.catalog_path.clone());
            process_repository(&input, &output).context("Catalog processing failed")?;
        }
        Commands::Serve { addr, catalog } => serve(config, addr, catalog)?,
    }

    Ok(())
}

fn serve(config: AppConfig, addr: Option<String>, catalog: Option<PathBuf>) -> Result<()> {
    let db = Database::new(config.database_path.clone());
    db.init_schema().context("Database initialization failed")?;

    let catalog_path = catalog.unwrap_or_else(|| config.catalog_path.clone());
    let index = if catalog_path.exists() {
        CatalogIndex::load(&catalog_path)
            .with_context(|| format!("Failed to load catalog {}", catalog_path.display()))?
    } else {
        warn!(path = %catalog_path.display(), "catalog not found, serving an empty one");
        CatalogIndex::empty()
    };
    info!(listings = index.len(), "catalog loaded");

    let addr = addr.unwrap_or_else(|| config.bind_addr());
    let addr: SocketAddr = addr
        .parse()
        .with_context(|| format!("Invalid listen address {addr}"))?;
    let max_workers = config.max_workers;

    let state = AppState::new(db, index, config);
    if state.whatsapp.is_none() {
        info!("whatsapp credentials not set, contact requests stay pending");
    }

    info!(%addr, max_workers, "starting server");
    Server::bind(&addr)
        .max_workers(max_workers)
        .serve(move |req, _info| respond(req, &state))
        .context("Server ended with error")?;

    info!("server shut down cleanly");
    Ok(())
}
