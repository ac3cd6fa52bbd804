//! Layered CLI settings.
//!
//! Sources, lowest precedence first:
//!
//! 1. built-in defaults,
//! 2. the TOML file (`--config`, else `graphcl-parity.toml` when present),
//! 3. `GRAPHCL__*` environment variables, e.g. `GRAPHCL__PARITY__SAMPLE_DIR`,
//! 4. `GRAPHQL_API1`, `GRAPHQL_API2` and `QUERIES_FILE`.
//!
//! Command-line flags are applied on top by the individual commands.

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use graphcl_parity_adapters::ParityConfig;
use graphcl_parity_benchmarks::SummaryConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Configuration file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "graphcl-parity.toml";

/// Prefix of structured environment overrides.
pub const ENV_PREFIX: &str = "GRAPHCL";

/// All settings used by the CLI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Parity and schema commands.
    pub parity: ParityConfig,
    /// Summarize command.
    pub summary: SummaryConfig,
}

impl Settings {
    /// Load settings from the process environment and `path`.
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = Self::load_layers(path, environment())?;
        settings
            .parity
            .apply_url_overrides(|name| std::env::var(name).ok());
        Ok(settings)
    }

    fn load_layers(path: Option<&Path>, environment: Environment) -> Result<Self> {
        let (file, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        debug!(file = %file.display(), required, "Loading configuration");

        // Defaults form the bottom layer so that partial tables merge into them.
        let defaults =
            Config::try_from(&Self::default()).context("Failed to encode default configuration")?;

        Config::builder()
            .add_source(defaults)
            .add_source(File::from(file.as_path()).required(required))
            .add_source(environment)
            .build()
            .with_context(|| format!("Failed to load configuration from {}", file.display()))?
            .try_deserialize()
            .context("Invalid configuration")
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}

/// Install the global tracing subscriber.
///
/// `--verbose` forces `debug`; otherwise `RUST_LOG` applies, defaulting to
/// `info`. Logs go to stderr so command output stays parseable.
pub fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
