/// CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::utils::BACKEND_BASE_URL_ENV;

// Build timestamp injected at compile time
pub const BUILD_TIMESTAMP: &str = env!("BUILD_TIMESTAMP");
pub const VERSION_WITH_BUILD: &str = concat!(env!("CARGO_PKG_VERSION"), " (built: ", env!("BUILD_TIMESTAMP"), ")");

#[derive(Parser)]
#[command(name = "metrics-dash")]
#[command(author, version = VERSION_WITH_BUILD, about, long_about = None)]
pub struct Cli {
    /// Backend base URL (the metrics path is appended)
    #[arg(long, global = true, env = BACKEND_BASE_URL_ENV)]
    pub backend_url: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log file used while the dashboard is running
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the metrics endpoint once and print the sample
    Fetch {
        /// Print raw JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Run the simulated metrics backend
    #[cfg(feature = "server")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "5000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the resolved configuration
    Show,

    /// Save the backend base URL to the user config file
    SetBackend {
        /// Backend base URL, e.g. http://localhost:5000
        url: String,
    },
}
