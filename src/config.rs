//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.moviedash.toml` files.

use crate::models::{RankBy, TagMatch};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".moviedash.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Dataset source settings.
    #[serde(default)]
    pub data: DataConfig,

    /// Chart rendering settings.
    #[serde(default)]
    pub charts: ChartConfig,

    /// Dashboard content settings.
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

/// Where the movie table comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Candidate sources tried in order: file paths or http(s) URLs.
    #[serde(default = "default_sources")]
    pub sources: Vec<String>,

    /// Directories searched for `file_name` after `sources` are exhausted.
    #[serde(default)]
    pub search_dirs: Vec<String>,

    /// File name looked for inside `search_dirs`.
    #[serde(default = "default_file_name")]
    pub file_name: String,

    /// Maximum directory depth when searching.
    #[serde(default = "default_search_depth")]
    pub search_depth: usize,

    /// Timeout for fetching URL sources.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_seconds: u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            search_dirs: Vec::new(),
            file_name: default_file_name(),
            search_depth: default_search_depth(),
            fetch_timeout_seconds: default_fetch_timeout(),
        }
    }
}

fn default_sources() -> Vec<String> {
    vec![
        "《Python数据分析与应用：从数据获取到可视化（第2版）》/源代码/IMDB-Movie-Data.csv",
        "IMDB-Movie-Data.csv",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_file_name() -> String {
    "IMDB-Movie-Data.csv".to_string()
}

fn default_search_depth() -> usize {
    3
}

fn default_fetch_timeout() -> u64 {
    10
}

/// Chart rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Chart width in pixels.
    #[serde(default = "default_width")]
    pub width: u32,

    /// Chart height in pixels.
    #[serde(default = "default_height")]
    pub height: u32,

    /// Number of bins for the rating and runtime histograms.
    #[serde(default = "default_bins")]
    pub histogram_bins: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            histogram_bins: default_bins(),
        }
    }
}

fn default_width() -> u32 {
    800
}

fn default_height() -> u32 {
    480
}

fn default_bins() -> usize {
    20
}

/// Dashboard content settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Rows in the top movies table.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Field the top movies table is ranked by.
    #[serde(default)]
    pub rank_by: RankBy,

    /// Rows shown by `/search` when no query is given.
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    /// How genre tags select records for per-genre mean ratings.
    #[serde(default)]
    pub tag_match: TagMatch,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            rank_by: RankBy::default(),
            search_limit: default_search_limit(),
            tag_match: TagMatch::default(),
        }
    }
}

fn default_top_n() -> usize {
    10
}

fn default_search_limit() -> usize {
    20
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only values given explicitly on the command line (or through their
    /// environment variables) override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref host) = args.host {
            self.server.host = host.clone();
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }

        // Explicit sources replace the configured list rather than extend it
        if let Some(ref sources) = args.data {
            self.data.sources = sources.clone();
        }

        if let Some(tag_match) = args.tag_match {
            self.dashboard.tag_match = tag_match;
        }
    }

    /// The socket address string the server binds.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::tests::make_args;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.data.sources.len(), 2);
        assert_eq!(config.data.sources[1], "IMDB-Movie-Data.csv");
        assert_eq!(config.charts.histogram_bins, 20);
        assert_eq!(config.dashboard.search_limit, 20);
        assert_eq!(config.dashboard.tag_match, TagMatch::Exact);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[server]
port = 8080

[data]
sources = ["data/movies.csv", "https://example.com/movies.csv"]
search_dirs = ["datasets"]

[dashboard]
top_n = 5
rank_by = "votes"
tag_match = "substring"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.data.sources[1], "https://example.com/movies.csv");
        assert_eq!(config.data.search_dirs, vec!["datasets"]);
        assert_eq!(config.data.file_name, "IMDB-Movie-Data.csv");
        assert_eq!(config.dashboard.top_n, 5);
        assert_eq!(config.dashboard.rank_by, RankBy::Votes);
        assert_eq!(config.dashboard.tag_match, TagMatch::Substring);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[charts]\nwidth = 1024\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.charts.width, 1024);
        assert_eq!(config.charts.height, 480);

        std::fs::write(&path, "[charts\nwidth = ").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_merge_with_args() {
        let mut config = Config::default();
        let mut args = make_args();
        config.merge_with_args(&args);
        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert_eq!(config.data.sources.len(), 2);

        args.port = Some(8000);
        args.host = Some("127.0.0.1".to_string());
        args.data = Some(vec!["movies.csv".to_string()]);
        args.tag_match = Some(TagMatch::Substring);
        config.merge_with_args(&args);
        assert_eq!(config.bind_address(), "127.0.0.1:8000");
        assert_eq!(config.data.sources, vec!["movies.csv"]);
        assert_eq!(config.dashboard.tag_match, TagMatch::Substring);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[data]"));
        assert!(toml_str.contains("[charts]"));
        assert!(toml_str.contains("[dashboard]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.server.port, 5000);
    }
}
