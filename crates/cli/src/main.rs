//! Protoscaffold CLI
//!
//! Command-line interface for generating kratos biz/data layer scaffolding
//! from protobuf service definitions.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use protoscaffold_common::{RenderOptions, ServiceDefinition};
use protoscaffold_generator::{FileOutcome, GenerationReport, LayerGenerator};
use protoscaffold_parser::{open_schema, SchemaFormat};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "protoscaffold")]
#[command(version, about = "Generate kratos biz/data layers from protobuf service definitions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a schema and display the extracted services
    #[command(after_help = "EXAMPLES:\n  \
        # Summarize a .proto file\n  \
        protoscaffold parse api/user/v1/user.proto\n\n  \
        # Dump the model of a compiled descriptor set as JSON\n  \
        protoscaffold parse api.pb --format descriptor --json")]
    Parse {
        /// Path to the .proto file or descriptor set
        schema: PathBuf,

        /// Schema format (auto-detected if not specified)
        #[arg(short, long)]
        format: Option<FormatArg>,

        /// Print the full model as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate the biz layer (entities, repo interface, use case)
    #[command(after_help = "EXAMPLES:\n  \
        protoscaffold biz api/user/v1/user.proto --target-dir internal/biz")]
    Biz {
        /// Path to the .proto file or descriptor set
        schema: PathBuf,

        /// Schema format (auto-detected if not specified)
        #[arg(short, long)]
        format: Option<FormatArg>,

        /// Generate target directory
        #[arg(short, long, default_value = "internal/biz")]
        target_dir: PathBuf,
    },

    /// Generate the data layer (repo implementation, data models)
    #[command(after_help = "EXAMPLES:\n  \
        protoscaffold data api/user/v1/user.proto \\\n    \
        --target-dir internal/data \\\n    \
        --domain-pkg internal/domain \\\n    \
        --cache-pkg github.com/redis/go-redis/v9\n\n  \
        # Options from a file, overridden by flags\n  \
        protoscaffold data api.pb --config protoscaffold.yaml --use-logger false")]
    Data {
        /// Path to the .proto file or descriptor set
        schema: PathBuf,

        /// Schema format (auto-detected if not specified)
        #[arg(short, long)]
        format: Option<FormatArg>,

        /// Generate target directory
        #[arg(short, long, default_value = "internal/data")]
        target_dir: PathBuf,

        /// Domain layer package path (for the Repo interface)
        #[arg(short, long)]
        domain_pkg: Option<String>,

        /// Proto package path (defaults to the schema's go_package)
        #[arg(short, long)]
        proto_pkg: Option<String>,

        /// Database package path (e.g. gorm.io/gorm, database/sql)
        #[arg(short = 'b', long)]
        db_pkg: Option<String>,

        /// Cache package path (e.g. github.com/redis/go-redis/v9)
        #[arg(short, long)]
        cache_pkg: Option<String>,

        /// Whether generated code uses the kratos logger
        #[arg(long)]
        use_logger: Option<bool>,

        /// YAML file with render options
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Protobuf IDL text
    Proto,
    /// Serialized FileDescriptorSet
    Descriptor,
}

impl From<FormatArg> for SchemaFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Proto => SchemaFormat::Proto,
            FormatArg::Descriptor => SchemaFormat::Descriptor,
        }
    }
}

/// Render option overrides given on the command line
#[derive(Debug, Default)]
struct OptionFlags {
    domain_pkg: Option<String>,
    proto_pkg: Option<String>,
    db_pkg: Option<String>,
    cache_pkg: Option<String>,
    use_logger: Option<bool>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Parse {
            schema,
            format,
            json,
        } => parse_command(&schema, format, json, cli.verbose)?,
        Commands::Biz {
            schema,
            format,
            target_dir,
        } => biz_command(&schema, format, &target_dir)?,
        Commands::Data {
            schema,
            format,
            target_dir,
            domain_pkg,
            proto_pkg,
            db_pkg,
            cache_pkg,
            use_logger,
            config,
        } => {
            let options = resolve_options(
                config.as_deref(),
                OptionFlags {
                    domain_pkg,
                    proto_pkg,
                    db_pkg,
                    cache_pkg,
                    use_logger,
                },
            )?;
            data_command(&schema, format, &target_dir, options)?;
        }
    }

    Ok(())
}

/// Diagnostics go to stderr; RUST_LOG wins over the verbosity flag
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_services(schema: &Path, format: Option<FormatArg>) -> Result<Vec<ServiceDefinition>> {
    let parser = open_schema(schema, format.map(SchemaFormat::from))
        .with_context(|| format!("Failed to load schema {}", schema.display()))?;
    parser
        .parse_all()
        .with_context(|| format!("Failed to parse schema {}", schema.display()))
}

fn parse_command(schema: &Path, format: Option<FormatArg>, json: bool, verbose: bool) -> Result<()> {
    let services = load_services(schema, format)?;

    if json {
        let rendered =
            serde_json::to_string_pretty(&services).context("Failed to serialize model")?;
        println!("{}", rendered);
        return Ok(());
    }

    println!("{}", "✓ Parse successful!".green().bold());
    for service in &services {
        println!("\n{}", "Service Definition:".bold());
        println!("  Name: {}", service.name.yellow());
        println!("  Package: {}", service.proto_package);
        println!("  Go package: {}", service.go_package);
        println!("  Methods: {}", service.methods.len());
        println!("  Messages: {}", service.messages.len());

        for method in &service.methods {
            println!(
                "  • {} ({} → {}, {})",
                method.name.cyan(),
                method.request_type_short,
                method.response_type_short,
                method.streaming_mode
            );
        }

        if verbose {
            println!("\n{}", "Messages:".bold());
            for message in &service.messages {
                println!("  • {}", message.name.cyan());
                for field in &message.fields {
                    println!("    {} {} = {}", field.field_type, field.name, field.number);
                }
            }
            if !service.import_paths.is_empty() {
                println!("\n{}", "Imports:".bold());
                for path in &service.import_paths {
                    println!("  {}", path);
                }
            }
        }
    }

    Ok(())
}

fn biz_command(schema: &Path, format: Option<FormatArg>, target_dir: &Path) -> Result<()> {
    println!("{} Generating biz layer from: {}", "→".cyan(), schema.display());
    let services = load_services(schema, format)?;

    let generator =
        LayerGenerator::new(RenderOptions::default()).context("Failed to create generator")?;
    let mut report = GenerationReport::default();
    for service in &services {
        report.merge(
            generator
                .generate_biz(service, target_dir)
                .with_context(|| format!("Failed to generate biz layer for {}", service.name))?,
        );
    }

    print_report(&report);
    Ok(())
}

fn data_command(
    schema: &Path,
    format: Option<FormatArg>,
    target_dir: &Path,
    options: RenderOptions,
) -> Result<()> {
    println!("{} Generating data layer from: {}", "→".cyan(), schema.display());
    let services = load_services(schema, format)?;

    let generator = LayerGenerator::new(options).context("Failed to create generator")?;
    let mut report = GenerationReport::default();
    for service in &services {
        report.merge(
            generator
                .generate_data(service, target_dir)
                .with_context(|| format!("Failed to generate data layer for {}", service.name))?,
        );
    }

    print_report(&report);
    Ok(())
}

/// Built-in defaults, then the config file, then explicit flags
fn resolve_options(config: Option<&Path>, flags: OptionFlags) -> Result<RenderOptions> {
    let mut options = match config {
        Some(path) => RenderOptions::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => RenderOptions::default(),
    };

    if let Some(domain_pkg) = flags.domain_pkg {
        options.domain_package = domain_pkg;
    }
    if let Some(proto_pkg) = flags.proto_pkg {
        options.proto_package = proto_pkg;
    }
    if let Some(db_pkg) = flags.db_pkg {
        options.db_package = db_pkg;
    }
    if let Some(cache_pkg) = flags.cache_pkg {
        options.cache_package = cache_pkg;
    }
    if let Some(use_logger) = flags.use_logger {
        options.use_logger = use_logger;
    }

    tracing::debug!(?options, "resolved render options");
    Ok(options)
}

fn print_report(report: &GenerationReport) {
    for outcome in &report.outcomes {
        match outcome {
            FileOutcome::Written(path) => {
                println!("  {} {}", "✓".green(), path.display());
            }
            FileOutcome::Skipped(path) => {
                println!("  {} {} (already exists)", "⚠".yellow(), path.display());
            }
        }
    }

    let written = report.written().count();
    let skipped = report.skipped().count();
    println!(
        "\n{}",
        format!("✓ Generation complete: {} written, {} skipped", written, skipped)
            .green()
            .bold()
    );
}
