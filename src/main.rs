//! OpenAPI from Routes - Command-line tool for generating API documentation.
//!
//! This binary reads a route registry snapshot (produced by a host
//! application or a build-time scan step) and emits either an OpenAPI 3.0
//! document or one of the Postman exports derived from it.
//!
//! # Usage
//!
//! ```bash
//! openapi-from-routes [OPTIONS] <REGISTRY_SNAPSHOT>
//! ```
//!
//! # Examples
//!
//! Generate YAML documentation:
//! ```bash
//! openapi-from-routes registry.yaml -o openapi.yaml
//! ```
//!
//! Export a Postman collection for one tag:
//! ```bash
//! openapi-from-routes registry.yaml -e postman --tag Users -o users.postman.json
//! ```
//!
//! Export the Postman environment variables:
//! ```bash
//! openapi-from-routes registry.yaml -e postman-environment -o environment.json
//! ```

mod assembler;
mod cli;
mod config;
mod document;
mod error;
mod operation;
mod postman;
mod registry;
mod rule_schema;
mod schema;
mod serializer;
mod type_schema;

use anyhow::Result;
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

    info!("OpenAPI from Routes starting...");

    // Now do the full parse with validation
    let args = cli::parse_args_from_parsed(args_for_verbose)?;

    // Run the main workflow
    cli::run(args)?;

    info!("Documentation generation completed successfully");

    Ok(())
}
