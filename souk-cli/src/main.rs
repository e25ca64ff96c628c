// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! Souk CLI - talk to the Souk marketplace API from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Sign in and show who you are
//! souk login ann@example.com --password hunter2
//! souk whoami
//!
//! # Authenticated request against the API base
//! souk get listings/featured
//!
//! # Write with a JSON body
//! souk post favorites --data '{"listingId":"42"}'
//!
//! # JSON output, in-memory token store
//! souk --format json --store memory get categories
//!
//! # Configuration
//! souk config init
//! souk config show
//! ```

mod commands;
mod context;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use souk_core::{ApiError, HttpMethod};
use souk_session::SessionError;
use souk_store::TokenStoreKind;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{auth, config, request};

// ============================================================================
// CLI Definition
// ============================================================================

/// Souk CLI - marketplace API client.
#[derive(Parser)]
#[command(name = "souk")]
#[command(about = "Command-line client for the Souk marketplace API")]
#[command(long_about = r#"
Souk talks to the marketplace backend with the same retry, request sharing,
and session handling the mobile client uses.

Examples:
  souk login ann@example.com     # Sign in (password from --password or SOUK_PASSWORD)
  souk whoami                    # Bootstrap the session and show the user
  souk get listings/featured     # GET relative to the API base
  souk --format json get me      # JSON output
  souk logout                    # Clear stored credentials
"#)]
#[command(version)]
#[command(author = "Souk Contributors")]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Configuration file (defaults to the platform config dir).
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Token store backend (keychain, file, memory). Overrides the config file.
    #[arg(long, global = true)]
    pub store: Option<TokenStoreKind>,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Send a GET request.
    Get(request::ReadArgs),

    /// Send a POST request.
    Post(request::WriteArgs),

    /// Send a PUT request.
    Put(request::WriteArgs),

    /// Send a PATCH request.
    Patch(request::WriteArgs),

    /// Send a DELETE request.
    Delete(request::WriteArgs),

    /// Sign in with email and password.
    Login(auth::LoginArgs),

    /// Create an account and sign in.
    Register(auth::RegisterArgs),

    /// Exchange identity-provider tokens for a session.
    Exchange(auth::ExchangeArgs),

    /// Bootstrap the session and show the current user.
    #[command(visible_alias = "me")]
    Whoami,

    /// Refresh the stored token pair.
    Refresh,

    /// Clear every stored credential.
    Logout,

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// General error.
    Error = 1,
    /// Not signed in, or the session was rejected.
    AuthRequired = 2,
    /// Network failure or upstream outage.
    Network = 3,
    /// Timeout.
    Timeout = 4,
}

impl ExitCode {
    /// Picks the exit code for a failed command.
    pub fn for_error(error: &anyhow::Error) -> Self {
        let api = error.downcast_ref::<ApiError>().or_else(|| {
            error
                .downcast_ref::<SessionError>()
                .and_then(SessionError::api_error)
        });

        if matches!(
            error.downcast_ref::<SessionError>(),
            Some(SessionError::MissingRefreshToken)
        ) {
            return Self::AuthRequired;
        }

        match api {
            Some(ApiError::Unauthorized | ApiError::Forbidden) => Self::AuthRequired,
            Some(ApiError::Timeout) => Self::Timeout,
            Some(ApiError::NetworkError | ApiError::ServiceUnavailable) => Self::Network,
            _ => Self::Error,
        }
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool, level: &str) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("souk=debug,info")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("souk={level}")))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet, &context::configured_log_level(&cli));

    let result = match &cli.command {
        Commands::Get(args) => request::run_read(HttpMethod::Get, args, &cli).await,
        Commands::Delete(args) => request::run_write(HttpMethod::Delete, args, &cli).await,
        Commands::Post(args) => request::run_write(HttpMethod::Post, args, &cli).await,
        Commands::Put(args) => request::run_write(HttpMethod::Put, args, &cli).await,
        Commands::Patch(args) => request::run_write(HttpMethod::Patch, args, &cli).await,
        Commands::Login(args) => auth::login(args, &cli).await,
        Commands::Register(args) => auth::register(args, &cli).await,
        Commands::Exchange(args) => auth::exchange(args, &cli).await,
        Commands::Whoami => auth::whoami(&cli).await,
        Commands::Refresh => auth::refresh(&cli).await,
        Commands::Logout => auth::logout(&cli).await,
        Commands::Config(args) => config::run(args, &cli),
    };

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("{}", output::render_error(&e, &cli));
        }
        std::process::exit(ExitCode::for_error(&e) as i32);
    }

    Ok(())
}
