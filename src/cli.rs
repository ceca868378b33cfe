use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::{debug, info};
use std::path::PathBuf;

/// OpenAPI from Routes - Generate OpenAPI documentation and Postman exports from a route registry snapshot
#[derive(Parser, Debug)]
#[command(name = "openapi-from-routes")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the route registry snapshot (YAML or JSON)
    #[arg(value_name = "REGISTRY_SNAPSHOT")]
    pub snapshot_path: PathBuf,

    /// Path to the documentation config file (YAML or JSON)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_path: Option<PathBuf>,

    /// What to export
    #[arg(short = 'e', long = "export", value_enum, default_value = "openapi")]
    pub export: ExportKind,

    /// Output format for the OpenAPI export (Postman exports are always JSON)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Only export operations carrying this tag
    #[arg(long = "tag", value_name = "TAG")]
    pub tag: Option<String>,

    /// Only export operations registered under this path template
    #[arg(long = "path", value_name = "PATH")]
    pub path: Option<String>,

    /// Only export operations using this HTTP method
    #[arg(long = "method", value_name = "METHOD")]
    pub method: Option<String>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Export targets, mirroring the documentation UI's download buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportKind {
    /// The OpenAPI 3.0 document
    Openapi,
    /// Postman Collection v2.1
    Postman,
    /// Postman environment variable export
    PostmanEnvironment,
    /// Postman globals variable export
    PostmanGlobals,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

/// Parse command line arguments
pub fn parse_args() -> Result<CliArgs> {
    let args = CliArgs::parse();
    parse_args_from_parsed(args)
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.snapshot_path.exists() {
        anyhow::bail!(
            "Registry snapshot does not exist: {}",
            args.snapshot_path.display()
        );
    }

    if !args.snapshot_path.is_file() {
        anyhow::bail!(
            "Registry snapshot is not a file: {}",
            args.snapshot_path.display()
        );
    }

    info!("Registry snapshot: {}", args.snapshot_path.display());
    info!("Export: {:?}", args.export);
    if let Some(ref config) = args.config_path {
        info!("Config file: {}", config.display());
    } else {
        info!("Config: defaults");
    }
    if let Some(ref output) = args.output_path {
        info!("Output file: {}", output.display());
    } else {
        info!("Output: stdout");
    }

    Ok(args)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    use crate::assembler::assemble;
    use crate::config::DocsConfig;
    use crate::postman::{environment, project, ExportFilter, VariableScope};
    use crate::registry::load_snapshot;
    use crate::serializer::{serialize_json, serialize_yaml, write_to_file};

    info!("Starting documentation generation...");

    // Step 1: Load configuration
    let config = match &args.config_path {
        Some(path) => DocsConfig::load(path)?,
        None => DocsConfig::default(),
    };

    // Step 2: Load the registry snapshot
    info!("Loading registry snapshot...");
    let registry = load_snapshot(&args.snapshot_path)?;
    info!(
        "Loaded {} routes and {} types",
        registry.routes.len(),
        registry.types.len()
    );

    // Step 3: Assemble the OpenAPI document
    info!("Assembling OpenAPI document...");
    let document = assemble(&registry, &config);
    info!("Document assembled: {} paths", document.paths.len());

    // Step 4: Produce the requested export
    let content = match args.export {
        ExportKind::Openapi => match args.output_format {
            OutputFormat::Yaml => serialize_yaml(&document)?,
            OutputFormat::Json => serialize_json(&document)?,
        },
        ExportKind::Postman => {
            let filter = ExportFilter {
                tag: args.tag.clone(),
                path: args.path.clone(),
                method: args.method.clone(),
            };
            let collection = project(&document, &config, &filter);
            info!("Projected {} folders", collection.item.len());
            serialize_json(&collection)?
        }
        ExportKind::PostmanEnvironment => {
            serialize_json(&environment(&config, VariableScope::Environment))?
        }
        ExportKind::PostmanGlobals => {
            serialize_json(&environment(&config, VariableScope::Globals))?
        }
    };

    // Step 5: Output to file or stdout
    if let Some(output_path) = &args.output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)?;
        info!("Successfully wrote export to {}", output_path.display());
    } else {
        println!("{}", content);
    }

    info!("Generation complete!");

    Ok(())
}
