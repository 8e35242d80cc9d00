//! wxcat CLI Binary
//!
//! Command-line interface for the weather-product metadata catalog: frame
//! recording for producer scripts, the retention sweep, and the server-wide
//! aggregation pass.

use anyhow::Context;
use clap::Parser;
use std::process;
use tracing::{error, info};
use wxcat::cli::{execute, Cli};
use wxcat::config::WxcatConfig;
use wxcat::logging::init_logging;

fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{:#}", e);
            process::exit(1);
        }
    };

    let logging_config = build_logging_config(&cli, &config);
    if let Err(e) = init_logging(&logging_config) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    match execute(&cli, &config) {
        Ok(output) => {
            info!("Command completed successfully");
            println!("{}", output);
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<WxcatConfig> {
    WxcatConfig::load(cli.config.as_deref()).context("failed to load configuration")
}

/// Apply CLI logging flags over the configured logging section.
/// Precedence: flags override config file override defaults.
fn build_logging_config(cli: &Cli, config: &WxcatConfig) -> wxcat::logging::LoggingConfig {
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    if cli.quiet {
        logging.level = "off".to_string();
    }
    if let Some(ref level) = cli.log_level {
        logging.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        logging.format = format.clone();
    }
    logging
}
