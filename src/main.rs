use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::sync::Arc;

use metrics_dash::app::App;
use metrics_dash::cli::{self, Cli, Commands, ConfigCommands};
use metrics_dash::core::{DashboardConfig, Fetcher, HttpFetcher, PollLogger, TracingLogger};
use metrics_dash::utils::{self, format_card_value, format_metric_value, logging, AppConfig, SUMMARY_CARDS};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    match &cli.command {
        None => {
            let log_path = cli.log_file.clone().unwrap_or_else(logging::default_log_path);
            logging::init_file_logging(cli.verbose, &log_path)?;
        }
        Some(_) => logging::init_logging(cli.verbose),
    }

    let app_config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!("Ignoring user config: {:#}", e);
        AppConfig::default()
    });
    let config = DashboardConfig::resolve(cli.backend_url.as_deref(), &app_config)
        .context("Failed to resolve backend configuration")?;
    tracing::debug!("Using metrics endpoint {} ({})", config.metrics_url(), config.source());

    match cli.command {
        None => {
            // No command - run interactive TUI
            let mut app = App::new(Arc::new(config));
            app.run().await?;
        }
        Some(Commands::Fetch { json }) => {
            handle_fetch(&config, json).await?;
        }
        Some(Commands::Config { command }) => {
            handle_config(&config, app_config, command)?;
        }
        #[cfg(feature = "server")]
        Some(Commands::Serve { port, host }) => {
            metrics_dash::server::run(host, port).await?;
        }
    }

    Ok(())
}

async fn handle_fetch(config: &DashboardConfig, json: bool) -> Result<()> {
    let logger: Arc<dyn PollLogger> = Arc::new(TracingLogger);
    let fetcher = HttpFetcher::new(config, logger);

    let capture = fetcher
        .fetch()
        .await
        .with_context(|| format!("Failed to fetch {}", config.metrics_url()))?;

    if json {
        println!("{}", capture.sample.to_json());
        return Ok(());
    }

    println!("{}\n", "Monitoring Dashboard".bold());
    println!("Endpoint: {}", config.metrics_url());
    println!(
        "Captured: {} (HTTP {})",
        capture.captured_at.format("%H:%M:%S"),
        capture.status
    );
    if let Some(warning) = capture.warning() {
        println!("{}", warning.to_string().yellow());
    }
    println!();

    println!("{:<20} {:>15}", "Metric", "Value");
    println!("{}", "-".repeat(36));

    for card in SUMMARY_CARDS {
        println!("{:<20} {:>15}", card.label, format_card_value(card, &capture.sample));
    }

    // Anything the backend reports beyond the fixed cards
    let extras: Vec<_> = capture
        .sample
        .iter()
        .filter(|(name, _)| !SUMMARY_CARDS.iter().any(|card| card.metric == *name))
        .collect();

    for (name, value) in extras {
        println!("{:<20} {:>15}", name.dimmed(), format_metric_value(value));
    }

    Ok(())
}

fn handle_config(config: &DashboardConfig, app_config: AppConfig, command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            println!("{}\n", "metrics-dash configuration".bold());
            println!("{:<18} {}", "Version:", env!("CARGO_PKG_VERSION"));
            println!("{:<18} {}", "Built:", cli::BUILD_TIMESTAMP);
            println!("{:<18} {}", "Backend base URL:", config.backend_base_url());
            println!("{:<18} {}", "Metrics URL:", config.metrics_url());
            println!("{:<18} {}", "Source:", config.source());
            println!(
                "{:<18} {}",
                "Poll interval:",
                humantime::format_duration(utils::POLL_INTERVAL)
            );
            println!("{:<18} {} samples", "History:", utils::HISTORY_CAPACITY);

            match AppConfig::config_path() {
                Ok(path) => println!("{:<18} {}", "Config file:", path.display()),
                Err(_) => println!("{:<18} {}", "Config file:", "unavailable".dimmed()),
            }
        }
        ConfigCommands::SetBackend { url } => {
            // Validate before persisting
            let validated = DashboardConfig::new(&url)?;

            let mut updated = app_config;
            updated.backend_base_url = Some(url.trim().to_string());
            updated.save()?;

            println!("{} Backend set to {}", "✓".green(), validated.backend_base_url());
            println!("  Metrics will be fetched from {}", validated.metrics_url());
            if std::env::var(utils::BACKEND_BASE_URL_ENV).is_ok() {
                println!(
                    "  {} {} is set and takes precedence over the config file",
                    "Note:".yellow(),
                    utils::BACKEND_BASE_URL_ENV
                );
            }
        }
    }

    Ok(())
}
