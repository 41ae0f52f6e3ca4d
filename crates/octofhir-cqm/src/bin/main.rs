//! CQM command-line interface

use clap::{Parser, Subcommand};
use octofhir_cqm::cli::output::{self, OutputFormat};
use octofhir_cqm::cli::{annotate, complexity, inspect};
use std::path::PathBuf;

/// CQM data-criteria tool
#[derive(Parser)]
#[command(name = "cqm")]
#[command(author, version, about = "Data-criteria attribute resolution for measure logic", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short = 'f', long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    color: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Attach resolved attributes to a measure's source data criteria
    Annotate {
        /// Measure document (JSON)
        file: PathBuf,

        /// Attribute catalog (JSON); the built-in QDM catalog when omitted
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// Description substring marking negated criteria
        #[arg(long)]
        negation_marker: Option<String>,
    },

    /// Show resolution tables and attribute accesses
    Inspect {
        /// Measure document (JSON)
        file: PathBuf,
    },

    /// Count logical branches per statement
    Complexity {
        /// Measure document (JSON)
        file: PathBuf,
    },
}

fn main() {
    human_panic::setup_panic!();

    let cli = Cli::parse();

    output::setup_colors(&cli.color);

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let result = match cli.command {
        Commands::Annotate {
            file,
            catalog,
            negation_marker,
        } => {
            let config = annotate::AnnotateConfig {
                file,
                catalog,
                negation_marker,
                verbose: cli.verbose,
                output_format: cli.format,
                output_file: cli.output.clone(),
            };
            annotate::annotate(config).map(|_| ())
        }

        Commands::Inspect { file } => {
            let config = inspect::InspectConfig {
                file,
                output_format: cli.format,
                output_file: cli.output.clone(),
            };
            inspect::inspect(config).map(|_| ())
        }

        Commands::Complexity { file } => {
            let config = complexity::ComplexityConfig {
                file,
                output_format: cli.format,
                output_file: cli.output.clone(),
            };
            complexity::complexity(config).map(|_| ())
        }
    };

    if let Err(e) = result {
        eprintln!("{}", output::format_error(&e));
        std::process::exit(1);
    }
}
