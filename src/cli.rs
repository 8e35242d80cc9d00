//! CLI domain: clap definitions and command routing only.
//! Each subcommand dispatches to one catalog operation and formats a short
//! human summary of what happened.

use crate::aggregator;
use crate::catalog::{CatalogWriter, FrameRecord};
use crate::config::WxcatConfig;
use crate::error::CatalogError;
use crate::latest;
use crate::sweeper::{self, SweepOptions};
use crate::types::{self, GeoBounds, ProductId};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// wxcat - weather-product metadata catalog tools
#[derive(Parser)]
#[command(name = "wxcat")]
#[command(about = "Metadata catalog for a weather-product image pipeline")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (overrides default wxcat.toml lookup)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Silence all logging
    #[arg(long, default_value = "false")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record one rendered frame in the catalog
    Record {
        /// Product id of the frame
        #[arg(long)]
        product: ProductId,

        /// Run the frame belongs to (YYYYMMDDHHMM, UTC)
        #[arg(long)]
        run: String,

        /// Frame image filename, unique within the run
        #[arg(long)]
        file: String,

        /// Time the frame is valid for (YYYYMMDDHHMM, UTC)
        #[arg(long)]
        valid: String,

        /// Georeference corners as "lat,lon/lat,lon"; omit for none
        #[arg(long)]
        gis: Option<String>,

        /// Seconds before the next frame is expected
        #[arg(long, default_value_t = 300)]
        reload: u64,

        /// Catalog root (defaults to the configured root)
        #[arg(long)]
        base: Option<PathBuf>,
    },
    /// Purge runs and frame directories past retention
    Sweep {
        /// Retention in hours (defaults to the configured retention)
        #[arg(long)]
        hours: Option<u64>,

        /// Catalog root (defaults to the configured root)
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Merge per-module product-type documents into one tree
    Aggregate {
        /// Directory containing the product modules
        #[arg(long)]
        modules: PathBuf,

        /// Target root for the merged documents
        #[arg(long)]
        target: PathBuf,
    },
    /// Refresh a product's "latest" run symlink
    Latest {
        /// Product id to refresh
        #[arg(long)]
        product: ProductId,

        /// Catalog root (defaults to the configured root)
        #[arg(long)]
        base: Option<PathBuf>,
    },
}

/// Execute a parsed command against the loaded configuration.
pub fn execute(cli: &Cli, config: &WxcatConfig) -> Result<String, CatalogError> {
    match &cli.command {
        Commands::Record {
            product,
            run,
            file,
            valid,
            gis,
            reload,
            base,
        } => {
            let root = base.clone().unwrap_or_else(|| config.catalog.root.clone());
            let writer =
                CatalogWriter::new(&root).with_lock_options(config.lock_options()?);
            let record = FrameRecord {
                product_id: *product,
                run_time: types::parse_stamp(run)?,
                filename: file.clone(),
                valid_time: types::parse_stamp(valid)?,
                gis_info: parse_gis(gis.as_deref())?,
                reload_interval: *reload,
            };
            writer.record_frame(&record)?;
            Ok(format!(
                "Recorded {} for product {} run {}",
                file, product, run
            ))
        }
        Commands::Sweep { hours, root } => {
            let root = root.clone().unwrap_or_else(|| config.catalog.root.clone());
            let options = SweepOptions {
                retention: hours
                    .map(|h| chrono::Duration::hours(h as i64))
                    .unwrap_or_else(|| config.sweep_options().retention),
                ..config.sweep_options()
            };
            let report = sweeper::sweep(&root, &options)?;
            Ok(format!(
                "Purged {} runs, deleted {} garbage files, kept {} runs",
                report.purged_runs, report.deleted_garbage, report.kept_runs
            ))
        }
        Commands::Aggregate { modules, target } => {
            let written = aggregator::aggregate(modules, target)?;
            Ok(format!("Merged {} product type documents", written))
        }
        Commands::Latest { product, base } => {
            let root = base.clone().unwrap_or_else(|| config.catalog.root.clone());
            match latest::refresh_latest_link(&root, *product)? {
                Some(link) => Ok(format!("Refreshed {}", link.display())),
                None => Ok(format!("No published runs for product {}", product)),
            }
        }
    }
}

fn parse_gis(gis: Option<&str>) -> Result<GeoBounds, CatalogError> {
    let gis = match gis {
        Some(gis) => gis,
        None => return Ok(GeoBounds::none()),
    };
    match gis.split_once('/') {
        Some((southwest, northeast)) => Ok(GeoBounds::new(southwest, northeast)),
        None => Err(CatalogError::Config(format!(
            "Invalid georeference: {} (expected \"lat,lon/lat,lon\")",
            gis
        ))),
    }
}
