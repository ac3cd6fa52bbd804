//! CLI for GraphCL Parity.
//!
//! This crate provides the `graphcl-parity` command: differential parity
//! runs against two GraphQL deployments, offline JSON comparison and
//! benchmark run summaries.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod commands;
pub mod settings;

use clap::{Args, Parser, Subcommand};
use commands::SummaryOutputs;
use graphcl_parity_adapters::queries::DEFAULT_QUERIES_FILE;
use graphcl_parity_adapters::ParityConfig;
use graphcl_parity_benchmarks::io;
use graphcl_parity_core::OutlierAggregator;
use settings::{init_logging, Settings};
use std::path::PathBuf;
use std::process::ExitCode;

/// GraphCL Parity CLI.
#[derive(Parser, Debug)]
#[command(name = "graphcl-parity")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (default: graphcl-parity.toml if present).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Endpoint overrides shared by the commands that talk to both deployments.
#[derive(Args, Debug, Clone, Default)]
pub struct EndpointArgs {
    /// GraphQL URL of the reference deployment.
    #[arg(long, value_name = "URL")]
    pub left: Option<String>,

    /// GraphQL URL of the deployment under test.
    #[arg(long, value_name = "URL")]
    pub right: Option<String>,
}

impl EndpointArgs {
    fn apply(&self, config: &mut ParityConfig) {
        if let Some(url) = &self.left {
            config.left.url = url.clone();
        }
        if let Some(url) = &self.right {
            config.right.url = url.clone();
        }
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run every query case against both deployments and compare the data.
    ///
    /// Exits non-zero if any case fails.
    Parity {
        /// Endpoint overrides.
        #[command(flatten)]
        endpoints: EndpointArgs,

        /// Query case file.
        #[arg(short, long, value_name = "FILE")]
        queries: Option<PathBuf>,

        /// Write the data of equivalent cases into this directory.
        #[arg(long, value_name = "DIR")]
        samples: Option<PathBuf>,

        /// Additional key to ignore (repeatable).
        #[arg(long = "ignore", value_name = "KEY")]
        ignore: Vec<String>,
    },

    /// Check that both deployments expose common schema types.
    Schema {
        /// Endpoint overrides.
        #[command(flatten)]
        endpoints: EndpointArgs,
    },

    /// Compare two JSON files semantically.
    ///
    /// Exits non-zero if they differ.
    Diff {
        /// Left-hand document.
        left: PathBuf,

        /// Right-hand document.
        right: PathBuf,

        /// Additional key to ignore (repeatable).
        #[arg(long = "ignore", value_name = "KEY")]
        ignore: Vec<String>,

        /// Print the comparison result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Summarize numbered benchmark run directories.
    Summarize {
        /// Directory containing `1/`, `2/`, ...
        base: PathBuf,

        /// CSV output file.
        #[arg(short, long, default_value = io::SUMMARY_CSV)]
        output: PathBuf,

        /// Also write a markdown report.
        #[arg(long, value_name = "FILE")]
        markdown: Option<PathBuf>,

        /// Also write the summaries as JSON.
        #[arg(long, value_name = "FILE")]
        json: Option<PathBuf>,

        /// Highest run number to read.
        #[arg(long)]
        max_runs: Option<usize>,

        /// IQR multiplier for outlier capping.
        #[arg(long)]
        multiplier: Option<f64>,
    },

    /// Write a sample query case file.
    InitQueries {
        /// Destination file.
        #[arg(default_value = DEFAULT_QUERIES_FILE)]
        path: PathBuf,

        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },

    /// Show the effective configuration.
    Status,
}

/// Parse arguments, set up logging and run the selected command.
pub async fn run() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);
    execute(cli).await
}

/// Run a parsed command line.
pub async fn execute(cli: Cli) -> anyhow::Result<ExitCode> {
    let settings = Settings::load(cli.config.as_deref())?;

    let success = match cli.command {
        Commands::Parity {
            endpoints,
            queries,
            samples,
            ignore,
        } => {
            let mut config = settings.parity;
            endpoints.apply(&mut config);
            if let Some(path) = queries {
                config.queries_file = path;
            }
            if samples.is_some() {
                config.sample_dir = samples;
            }
            config.ignore_keys.extend(ignore);
            commands::parity(&config).await?
        }
        Commands::Schema { endpoints } => {
            let mut config = settings.parity;
            endpoints.apply(&mut config);
            commands::schema(&config, cli.verbose).await?
        }
        Commands::Diff {
            left,
            right,
            ignore,
            json,
        } => {
            let mut ignore_keys = settings.parity.ignore_keys;
            ignore_keys.extend(ignore);
            commands::diff(&left, &right, ignore_keys, json)?
        }
        Commands::Summarize {
            base,
            output,
            markdown,
            json,
            max_runs,
            multiplier,
        } => {
            let mut config = settings.summary;
            if let Some(max_runs) = max_runs {
                config.max_runs = max_runs;
            }
            if let Some(multiplier) = multiplier {
                config.aggregator = OutlierAggregator::with_multiplier(multiplier);
            }
            let outputs = SummaryOutputs {
                csv: &output,
                markdown: markdown.as_deref(),
                json: json.as_deref(),
            };
            commands::summarize(&config, &base, outputs)?
        }
        Commands::InitQueries { path, force } => commands::init_queries(&path, force)?,
        Commands::Status => commands::status(&settings, cli.config.as_deref())?,
    };

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
