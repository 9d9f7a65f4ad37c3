//! API Doc Extractor - Command-line tool for generating API documentation.
//!
//! This binary reads a routes JSON file exported by a framework adapter, runs
//! the strategy-based extraction pipeline over every matched route, and writes
//! Markdown documentation plus a Postman-style collection.
//!
//! # Usage
//!
//! ```bash
//! apidoc-from-routes [OPTIONS] <ROUTES_FILE>
//! ```
//!
//! # Examples
//!
//! Generate all artifacts into ./docs:
//! ```bash
//! apidoc-from-routes routes.json -c apidoc.yaml
//! ```
//!
//! Generate only the collection:
//! ```bash
//! apidoc-from-routes routes.json -f collection -o build/docs
//! ```
//!
//! Enable verbose logging:
//! ```bash
//! apidoc-from-routes routes.json -v
//! ```

use anyhow::Result;
use apidoc_from_routes::cli;
use clap::Parser;
use log::info;

fn main() -> Result<()> {
    // We need to parse args twice: once to get verbose flag, then again after logger init
    // First, do a quick parse just to check for verbose flag
    let args_for_verbose = cli::CliArgs::parse();

    // Initialize logger based on verbose flag
    let log_level = if args_for_verbose.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("API Doc Extractor starting...");

    // Now do the full parse with validation
    let args = cli::parse_args_from_parsed(args_for_verbose)?;

    // Run the main workflow
    cli::run(args)?;

    info!("Documentation extraction completed successfully");

    Ok(())
}
