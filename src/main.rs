//! MovieDash - movie metadata statistics dashboard
//!
//! Loads a movie table, computes descriptive statistics and charts,
//! and serves them as HTML pages and a JSON API.
//!
//! Exit codes:
//!   0 - Success (clean shutdown, or stats printed)
//!   1 - Runtime error (invalid arguments, config, bind failure, etc.)

mod analysis;
mod charts;
mod cli;
mod config;
mod error;
mod loader;
mod models;
mod report;
mod server;

use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use loader::{DatasetLoader, LoaderConfig};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("MovieDash v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args).await {
        error!("MovieDash failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .moviedash.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize data sources, charts and the server address.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `RUST_LOG` takes precedence over `-v`/`-q` when set.
fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level().as_str()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

async fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    if args.print_stats {
        return print_stats(&config, args.format).await;
    }

    println!("🎬 MovieDash");
    println!("   Sources: {}", config.data.sources.join(", "));
    println!("   Tag matching: {:?}", config.dashboard.tag_match);
    println!("   Open http://{}/", config.bind_address());

    server::serve(&config).await
}

/// Handle --print-stats: load once, print the summary, exit.
async fn print_stats(config: &Config, format: OutputFormat) -> Result<()> {
    let loader = DatasetLoader::new(LoaderConfig::from(&config.data));
    let dataset = loader.load().await;
    let stats = analysis::basic_stats(&dataset);

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&stats).context("Failed to encode stats")?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            println!("📊 Dataset: {}", dataset.origin);
            println!("   Movies: {}", stats.count);
            println!("   Average rating: {:.1}", stats.mean_rating);
            println!("   Directors: {}", stats.distinct_attribution_count);
            println!("   Average runtime: {:.1} min", stats.mean_duration);
            println!("   Total votes: {}", stats.total_votes);
            println!("   Average revenue: ${:.1}M", stats.mean_revenue);
        }
    }

    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
