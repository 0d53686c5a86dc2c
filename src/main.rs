//! Porter - A Matrix bot collecting game server access requests.
//!
//! Community members ask for access to a game server by registering their game
//! username with the bot. The bot keeps the registrations in a JSON file, tells
//! the server owner about every new request and gives the owner the full list on
//! demand.
//!
//! # Configuration
//!
//! Create a `config.yaml` file with your settings:
//!
//! ```yaml
//! matrix:
//!   user_id: "@porter:matrix.org"
//!   password: "your-password"
//!
//! registration:
//!   admin_id: "@owner:matrix.org"
//! ```
//!
//! See [`config`] for every option.
//!
//! # Environment Variable Overrides
//!
//! Override any configuration value using environment variables with the `PORTER_` prefix:
//!
//! ```bash
//! export PORTER_MATRIX__USER_ID="@porter:matrix.org"
//! export PORTER_MATRIX__PASSWORD="your-password"
//! export PORTER_REGISTRATION__ADMIN_ID="@owner:matrix.org"
//! ```
//!
//! # Usage
//!
//! ```bash
//! porter --config config.yaml --data ./porter-data
//! ```
//!
//! # Bot Commands
//!
//! - `!porter help` - Display help information
//! - `!porter tutorial` - Links to the tutorial videos
//! - `!porter dashboard` - Link to the server dashboard
//! - `!porter register <username>` - Register your game username
//! - `!porter removeme` - Remove your registration
//! - `!porter listusers` - Receive every registration, owner only
//!
//! # Architecture
//!
//! - [`access`] - Who may run owner-only commands
//! - [`bot`] - Wires the Matrix client to the command router
//! - [`commands`] - Command parsing, routing and responses
//! - [`config`] - YAML configuration with environment variable overrides
//! - [`matrix`] - Matrix login, sync loop and message delivery
//! - [`notifications`] - Best-effort notifications to the owner
//! - [`registrations`] - The registration ledger and its JSON snapshot
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Controls logging level (default: `info`)

use clap::Parser;
use env_logger::Env;
use log::{error, info};

use crate::{bot::Bot, config::Config};

mod access;
mod bot;
mod commands;
mod config;
mod matrix;
mod notifications;
mod registrations;

/// Command-line arguments for the Porter bot.
///
/// # Examples
///
/// ```bash
/// porter --config config.yaml --data ./porter-data
/// ```
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the YAML configuration file.
    ///
    /// The configuration file should contain the Matrix account credentials.
    /// See the [`config`] module for the expected format.
    #[arg(short, long)]
    config: String,

    /// Path to the directory for storing persistent data.
    ///
    /// Created if missing. It holds `users.json`, the registrations.
    #[arg(short, long)]
    data: String,
}

/// Main entry point for the Porter bot.
///
/// 1. **Logging Setup**: `info` level by default, overridden by `RUST_LOG`
/// 2. **Argument Parsing**: command-line arguments using `clap`
/// 3. **Configuration Loading**: YAML file and `PORTER_` environment variables
/// 4. **Bot Initialization**: loads the registrations and logs in to Matrix
/// 5. **Bot Execution**: runs the Matrix sync loop
///
/// Startup failures are logged and end the process without panicking.
#[tokio::main]
async fn main() {
    // Put logger at info level by default
    let env = Env::default().filter_or("RUST_LOG", "info");
    env_logger::init_from_env(env);

    info!("Starting porter {}...", env!("CARGO_PKG_VERSION"));

    // Parse command line arguments
    let args = Args::parse();

    let config = match Config::load(&args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load config file: {}", e);
            return;
        }
    };

    // Launch bot
    let bot = match Bot::new(config, args).await {
        Ok(b) => b,
        Err(e) => {
            error!("Failed to initialize bot: {:#}", e);
            return;
        }
    };

    if let Err(e) = bot.start().await {
        error!("Bot stopped: {:#}", e);
    }
}
