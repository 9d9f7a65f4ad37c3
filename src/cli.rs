use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::{debug, info};
use std::path::PathBuf;

/// API Doc Extractor - Generate API documentation from exported route definitions
#[derive(Parser, Debug)]
#[command(name = "apidoc-from-routes")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the routes JSON file exported by the framework adapter
    #[arg(value_name = "ROUTES_FILE")]
    pub routes_path: PathBuf,

    /// Path to the YAML configuration file (built-in defaults when omitted)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_path: Option<PathBuf>,

    /// Path to an optional validation-rules JSON file
    #[arg(short = 'r', long = "rules", value_name = "FILE")]
    pub rules_path: Option<PathBuf>,

    /// Directory resolved against @responseFile fixture paths
    #[arg(long = "fixtures", value_name = "DIR", default_value = ".")]
    pub fixtures_dir: PathBuf,

    /// Output directory for the generated documentation
    #[arg(short = 'o', long = "output", value_name = "DIR", default_value = "docs")]
    pub output_dir: PathBuf,

    /// Which artifacts to generate
    #[arg(short = 'f', long = "format", value_enum, default_value = "all")]
    pub output_format: OutputFormat,

    /// Collection name shown in the generated collection
    #[arg(long = "name", default_value = "API Documentation")]
    pub collection_name: String,

    /// Enable verbose output (includes full error chains from strategies)
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output artifact selection
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Markdown document only
    Markdown,
    /// Postman-style collection only
    Collection,
    /// Markdown, collection, and the raw route-doc records
    All,
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.routes_path.exists() {
        anyhow::bail!("Routes file does not exist: {}", args.routes_path.display());
    }
    if let Some(ref config) = args.config_path {
        if !config.exists() {
            anyhow::bail!("Config file does not exist: {}", config.display());
        }
    }

    info!("Routes file: {}", args.routes_path.display());
    match args.config_path {
        Some(ref config) => info!("Config file: {}", config.display()),
        None => info!("Config: built-in defaults"),
    }
    info!("Output directory: {}", args.output_dir.display());
    Ok(args)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    use crate::adapter::{
        NullEnvironment, NullModelProvider, NullSerializerRegistry, StaticRuleSource,
    };
    use crate::collection::build_collection;
    use crate::config::DocsConfig;
    use crate::extractor::Extractor;
    use crate::markdown::render_markdown;
    use crate::matcher::RouteMatcher;
    use crate::route::load_routes;
    use crate::sample::SampleValueGenerator;
    use crate::serializer::{serialize_json, write_to_file};
    use crate::strategies::Collaborators;
    use std::cell::RefCell;
    use std::rc::Rc;

    info!("Starting documentation extraction...");

    // Step 1: Load configuration (fail fast on malformed config)
    let config = match &args.config_path {
        Some(path) => DocsConfig::load(path)?,
        None => DocsConfig::default(),
    };
    let groups = config.effective_routes();
    info!("Loaded configuration with {} rule group(s)", groups.len());

    // Step 2: Load route records
    let routes = load_routes(&args.routes_path)?;
    info!("Loaded {} route records", routes.len());
    if routes.is_empty() {
        anyhow::bail!("No route records found in the routes file");
    }

    // Step 3: Wire collaborators
    let rule_source = match &args.rules_path {
        Some(path) => StaticRuleSource::from_file(path)?,
        None => StaticRuleSource::default(),
    };
    let collaborators = Collaborators {
        rule_source: Rc::new(rule_source),
        model_provider: Rc::new(NullModelProvider),
        serializers: Rc::new(NullSerializerRegistry),
        environment: Rc::new(NullEnvironment),
        fixtures_dir: args.fixtures_dir.clone(),
        sampler: Rc::new(RefCell::new(SampleValueGenerator::new(config.faker_seed))),
    };

    // Step 4: Build the extractor and validate strategy references up front
    let extractor = Extractor::new(config, &collaborators, args.verbose);
    extractor.validate(&groups)?;

    // Step 5: Match routes against the rule groups
    let matcher = RouteMatcher::new(groups);
    let matched = matcher.match_routes(&routes);
    info!("Matched {} route/rule-set pairs", matched.len());
    if matched.is_empty() {
        log::warn!("No routes matched the configured rule groups");
    }

    // Step 6: Run the extraction pipeline
    let (docs, summary) = extractor.process_all(&matched);

    // Step 7: Write the requested artifacts
    if args.output_format != OutputFormat::Collection {
        let markdown = render_markdown(&docs);
        let path = args.output_dir.join("index.md");
        write_to_file(&markdown, &path)?;
        info!("Wrote Markdown documentation to {}", path.display());
    }
    if args.output_format != OutputFormat::Markdown {
        let collection = build_collection(&args.collection_name, &docs);
        let path = args.output_dir.join("collection.json");
        write_to_file(&serialize_json(&collection)?, &path)?;
        info!("Wrote collection to {}", path.display());
    }
    if args.output_format == OutputFormat::All {
        let path = args.output_dir.join("routes.json");
        write_to_file(&serialize_json(&docs)?, &path)?;
        info!("Wrote route-doc records to {}", path.display());
    }

    // Step 8: Display summary
    info!("Extraction complete!");
    info!("Summary:");
    info!("  - Routes matched: {}", matched.len());
    info!("  - Routes processed: {}", summary.processed);
    info!("  - Routes failed: {}", summary.failed.len());
    for (signature, error) in &summary.failed {
        log::warn!("  - Failed: {} ({})", signature, error);
    }

    Ok(())
}
