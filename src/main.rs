//! Command-line tool generating an OpenAPI document from a route manifest.
//!
//! # Usage
//!
//! ```bash
//! openapi-from-handlers [OPTIONS] <MANIFEST>
//! ```
//!
//! Write YAML next to the sources:
//! ```bash
//! openapi-from-handlers routes.yaml -o openapi.yaml
//! ```
//!
//! JSON with a different source tree, failing on missing handler sources and
//! malformed annotations:
//! ```bash
//! openapi-from-handlers routes.yaml -f json -s ../app/src --strict
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use openapi_from_handlers::cli;

fn main() -> Result<()> {
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("OpenAPI generator starting...");

    let args = cli::parse_args_from_parsed(args)?;
    cli::run(args)?;

    info!("OpenAPI document generation completed successfully");

    Ok(())
}
