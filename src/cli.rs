//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::TagMatch;
use clap::Parser;
use std::path::PathBuf;

/// MovieDash - statistics dashboard for a movie metadata table
///
/// Loads the movie table, computes summary statistics and charts, and
/// serves them as HTML pages and a JSON API.
///
/// Examples:
///   moviedash
///   moviedash --port 8080 --data ./IMDB-Movie-Data.csv
///   moviedash --data https://example.com/movies.csv --data ./movies.csv
///   moviedash --tag-match substring
///   moviedash --print-stats --format json
///   moviedash --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Address to bind the web server to
    #[arg(long, value_name = "HOST", env = "MOVIEDASH_HOST")]
    pub host: Option<String>,

    /// Port to bind the web server to
    #[arg(short, long, value_name = "PORT", env = "MOVIEDASH_PORT")]
    pub port: Option<u16>,

    /// Dataset source to try, a file path or URL (repeat for more, tried in order)
    ///
    /// Replaces the sources from the config file. When none is usable the
    /// embedded five-movie sample is served.
    #[arg(short, long, value_name = "SOURCE")]
    pub data: Option<Vec<String>>,

    /// How genre tags match records when averaging ratings per genre
    #[arg(long, value_name = "MODE")]
    pub tag_match: Option<TagMatch>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .moviedash.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Load the dataset once, print its summary statistics and exit
    #[arg(long)]
    pub print_stats: bool,

    /// Output format for --print-stats (text, json)
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Generate a default .moviedash.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for --print-stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines (default)
    #[default]
    Text,
    /// JSON object, same shape as /api/stats
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.port == Some(0) {
            return Err("Port must be between 1 and 65535".to_string());
        }

        if let Some(ref sources) = self.data {
            if sources.iter().any(|s| s.trim().is_empty()) {
                return Err("Dataset sources must not be empty".to_string());
            }
        }

        if let Some(ref config_path) = self.config {
            if !config_path.is_file() {
                return Err(format!(
                    "Config file does not exist: {}",
                    config_path.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
