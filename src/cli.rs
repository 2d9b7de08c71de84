use crate::generator::SpecGenerator;
use crate::manifest::RouteManifest;
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info};
use std::path::PathBuf;

/// Generate an OpenAPI document from the handlers registered in a route manifest
#[derive(Parser, Debug)]
#[command(name = "openapi-from-handlers")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Route manifest (YAML, or JSON with a .json extension)
    #[arg(value_name = "MANIFEST")]
    pub manifest_path: PathBuf,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Directory holding the crate root module; overrides the manifest
    #[arg(short = 's', long = "source-root", value_name = "DIR")]
    pub source_root: Option<PathBuf>,

    /// API title; overrides the manifest
    #[arg(long = "title")]
    pub title: Option<String>,

    /// API version; overrides the manifest
    #[arg(long = "api-version")]
    pub api_version: Option<String>,

    /// Fail on missing handler sources and malformed annotations
    #[arg(long = "strict")]
    pub strict: bool,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.manifest_path.is_file() {
        anyhow::bail!("Manifest file does not exist: {}", args.manifest_path.display());
    }

    if let Some(ref root) = args.source_root {
        if !root.is_dir() {
            anyhow::bail!("Source root is not a directory: {}", root.display());
        }
    }

    info!("Manifest: {}", args.manifest_path.display());
    info!("Output format: {:?}", args.output_format);
    match args.output_path {
        Some(ref output) => info!("Output file: {}", output.display()),
        None => info!("Output: stdout"),
    }

    Ok(args)
}

/// Load the manifest, apply overrides and render the document.
pub fn render(args: &CliArgs) -> Result<String> {
    let mut manifest = RouteManifest::load(&args.manifest_path)
        .with_context(|| format!("Failed to load manifest {}", args.manifest_path.display()))?;

    let config = &mut manifest.config;
    if let Some(root) = &args.source_root {
        config.source_root = root.clone();
    }
    if let Some(title) = &args.title {
        config.title = title.clone();
    }
    if let Some(version) = &args.api_version {
        config.version = version.clone();
    }
    if args.strict {
        config.strict_source = true;
        config.strict_annotations = true;
    }
    info!("Source root: {}", config.source_root.display());

    let generator = SpecGenerator::new(manifest.config);
    let document = generator
        .build(&manifest.routes)
        .context("Failed to build OpenAPI document")?;
    info!(
        "Built document with {} paths and {} schemas",
        document.paths.len(),
        document.components.schemas.len()
    );

    match args.output_format {
        OutputFormat::Yaml => serialize_yaml(&document),
        OutputFormat::Json => serialize_json(&document),
    }
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    let content = render(&args)?;

    if let Some(output_path) = &args.output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)?;
        info!("Successfully wrote OpenAPI document to {}", output_path.display());
    } else {
        println!("{}", content);
    }

    Ok(())
}
