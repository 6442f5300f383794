//! Logiport CLI - drive the customer portal sessions from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Check a login identifier without contacting the backend
//! logiport validate "98765 43210"
//!
//! # Admin session
//! logiport admin login
//! logiport admin status
//! logiport admin revenue
//!
//! # Client session
//! logiport client login user@example.com
//! logiport client otp send 9876543210
//! logiport client otp verify 9876543210 123456
//! logiport client change-password
//! logiport client shipments
//! ```
//!
//! Passwords not given as flags are read from stdin, one per line.
//! Tokens persist in `LOGIPORT_STATE_FILE` between runs.
//!
//! # Commands
//!
//! - `validate` - Check an email-or-mobile identifier
//! - `admin` - Admin login, logout, status and back office queries
//! - `client` - Client login (password, OTP, signup), account and data

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use logiport_portal::config::PortalConfig;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;

use commands::admin::AdminAction;
use commands::client::ClientAction;
use error::CliError;

#[derive(Parser)]
#[command(name = "logiport")]
#[command(author, version, about = "Logiport customer portal CLI")]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an email address or mobile number
    Validate {
        /// Identifier to check
        identifier: String,
    },
    /// Admin session and back office
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Client session and account
    Client {
        #[command(subcommand)]
        action: ClientAction,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &PortalConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            send_default_pii: false,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Errors and warnings become Sentry events; info and debug become breadcrumbs.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing(json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "logiport_portal=info,logiport_cli=info".into());

    // Logs go to stderr; stdout carries command output.
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // `validate` is purely local and needs no configuration.
    let config = match &cli.command {
        Commands::Validate { .. } => None,
        _ => Some(PortalConfig::from_env()),
    };
    let _sentry_guard = config
        .as_ref()
        .and_then(|config| config.as_ref().ok())
        .and_then(init_sentry);

    init_tracing(cli.json_logs);

    let result = match (cli.command, config) {
        (Commands::Validate { identifier }, _) => commands::validate::run(&identifier),
        (command, Some(Ok(config))) => run(command, &config).await,
        (_, Some(Err(err))) => Err(CliError::Config(err)),
        (_, None) => Ok(()),
    };

    if let Err(err) = result {
        tracing::debug!(error = %err, "Command failed");
        commands::report(&err.user_message());
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: &PortalConfig) -> Result<(), CliError> {
    let context = commands::connect(config).await?;
    match command {
        Commands::Admin { action } => commands::admin::run(&context, action).await,
        Commands::Client { action } => commands::client::run(&context, action).await,
        Commands::Validate { identifier } => commands::validate::run(&identifier),
    }
}
