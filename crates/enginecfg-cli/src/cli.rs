use anyhow::{Result, bail};
use clap::{Parser, Subcommand, ValueEnum};

use enginecfg_core::EnvVar;

/// Output format for CLI commands
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "enginecfg")]
#[command(
    version,
    about = "Configure environment variables on a deployed Reasoning Engine"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Google Cloud project id
    #[arg(long, global = true, env = "GOOGLE_CLOUD_PROJECT")]
    pub project: Option<String>,

    /// Engine region (e.g. us-central1)
    #[arg(long, global = true, env = "GOOGLE_CLOUD_LOCATION")]
    pub location: Option<String>,

    /// Reasoning Engine id
    #[arg(long, global = true, env = "ENGINECFG_ENGINE_ID")]
    pub engine_id: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add or update environment variables (KEY=VALUE ...)
    Set {
        #[arg(required = true, value_name = "KEY=VALUE")]
        vars: Vec<String>,
    },

    /// Remove environment variables by name
    Unset {
        #[arg(required = true, value_name = "KEY")]
        names: Vec<String>,
    },

    /// List the engine's environment variables
    List,
}

/// Parse a KEY=VALUE argument. An empty value is valid; removal goes
/// through `unset`, never through an empty string.
pub fn parse_env_pair(raw: &str) -> Result<EnvVar> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok(EnvVar::new(name, value)),
        _ => bail!("invalid environment variable '{raw}': expected KEY=VALUE"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_env_pair() {
        assert_eq!(
            parse_env_pair("LOG_LEVEL=debug").unwrap(),
            EnvVar::new("LOG_LEVEL", "debug")
        );
        // Value may itself contain '='.
        assert_eq!(
            parse_env_pair("OTEL_HEADERS=a=b").unwrap(),
            EnvVar::new("OTEL_HEADERS", "a=b")
        );
        assert_eq!(parse_env_pair("EMPTY=").unwrap(), EnvVar::new("EMPTY", ""));
    }

    #[test]
    fn test_parse_env_pair_rejects_bad_shapes() {
        assert!(parse_env_pair("NO_EQUALS").is_err());
        assert!(parse_env_pair("=value").is_err());
    }
}
