//! Combo-Harvest main entry point
//!
//! This is the command-line interface for the Combo-Harvest resource
//! harvester.

use clap::Parser;
use combo_harvest::browser::{ChromiumBrowser, LaunchOptions};
use combo_harvest::config::{load_config_with_hash, validate, Config};
use combo_harvest::crawler::build_http_client;
use combo_harvest::output::print_summary;
use combo_harvest::runner::{run, select_mode};
use combo_harvest::session::{run_login, SessionSnapshot, DEFAULT_LOGIN_URL};
use combo_harvest::{ConfigError, HarvestError};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Combo-Harvest: downloads course resources from megacombo pages
///
/// Run once with --login to save an authenticated session, then harvest
/// either a list of root pages (--roots-file) or everything reachable from
/// seed pages (--discover, optionally --stream).
#[derive(Parser, Debug)]
#[command(name = "combo-harvest")]
#[command(version = "1.0.0")]
#[command(about = "Harvests PDF resources from megacombo course pages", long_about = None)]
struct Cli {
    /// Path to an optional TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log in interactively and save the session, then exit
    #[arg(long)]
    login: bool,

    /// Page to open during login
    #[arg(long, value_name = "URL", requires = "login")]
    seed: Option<String>,

    /// Seed pages to discover root pages from
    #[arg(long, value_name = "SEED", num_args = 1..)]
    discover: Vec<String>,

    /// Harvest each root as soon as it is discovered
    #[arg(long)]
    stream: bool,

    /// File with one root page URL per line
    #[arg(long, value_name = "FILE")]
    roots_file: Option<PathBuf>,

    /// Output directory
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Write discovered roots to this file
    #[arg(long, value_name = "FILE")]
    save_roots: Option<PathBuf>,

    /// Maximum number of roots to process
    #[arg(long, value_name = "N")]
    max_roots: Option<usize>,

    /// Maximum number of pages to visit during discovery
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Run the browser headless (download phase only)
    #[arg(long)]
    headless: bool,

    /// Session snapshot path
    #[arg(long, value_name = "FILE")]
    session: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match load_effective_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            report_config_error(&e);
            return Ok(());
        }
    };

    if cli.login {
        handle_login(&config, &cli).await
    } else {
        handle_download(config, &cli).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("combo_harvest=info,warn"),
            1 => EnvFilter::new("combo_harvest=debug,info"),
            2 => EnvFilter::new("combo_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file (if any) and layers command-line flags on top
fn load_effective_config(cli: &Cli) -> Result<Config, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(out) = &cli.out {
        config.output.out_dir = out.clone();
    }
    if let Some(session) = &cli.session {
        config.output.session_path = session.clone();
    }
    if let Some(max_roots) = cli.max_roots {
        config.crawl.max_roots = max_roots;
    }
    if let Some(max_pages) = cli.max_pages {
        config.crawl.max_pages = max_pages;
    }
    if cli.headless {
        config.browser.headless = true;
    }

    validate(&config)?;
    Ok(config)
}

/// Prints a configuration error with its remediation and ends the run
fn report_config_error(error: &ConfigError) {
    eprintln!("❌ {}", error);
    eprintln!("   {}", error.remediation());
}

/// Handles --login: interactive sign-in, session saved, nothing else
async fn handle_login(config: &Config, cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let seed = cli.seed.as_deref().unwrap_or(DEFAULT_LOGIN_URL);
    let count = run_login(config, seed, &config.output.session_path).await?;
    println!(
        "✅ Saved login state ({} cookies) to {}",
        count,
        config.output.session_path.display()
    );
    Ok(())
}

/// Handles the download modes
async fn handle_download(config: Config, cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let session = match SessionSnapshot::load(&config.output.session_path) {
        Ok(session) => session,
        Err(HarvestError::Config(e)) => {
            report_config_error(&e);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let mode = match select_mode(cli.roots_file.clone(), cli.discover.clone(), cli.stream) {
        Ok(mode) => mode,
        Err(e) => {
            report_config_error(&e);
            return Ok(());
        }
    };
    tracing::info!("Run mode: {}", mode.name());

    let client = build_http_client(&session, config.browser.user_agent.as_deref())?;
    let browser = ChromiumBrowser::launch(LaunchOptions::for_downloads(&config.browser)).await?;
    let installed = browser.install_cookies(&session.cookies).await;
    if let Err(e) = installed {
        browser.shutdown().await;
        return Err(e.into());
    }

    let result = run(&browser, &config, client, mode, cli.save_roots.as_deref()).await;
    browser.shutdown().await;

    match result {
        Ok(summary) => {
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Run failed: {}", e);
            Err(e.into())
        }
    }
}
