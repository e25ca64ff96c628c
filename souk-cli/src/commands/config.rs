//! Config command - manage configuration.

use anyhow::Result;
use clap::{Args, Subcommand};
use souk_store::{Config, default_config_dir, default_credentials_path};
use tracing::info;

use crate::context::config_path;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration (file plus environment).
    Show,

    /// Show configuration paths.
    Path,

    /// Write a default configuration file.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

/// Runs the config command.
pub fn run(args: &ConfigArgs, cli: &Cli) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli),
        ConfigAction::Path => show_paths(cli),
        ConfigAction::Init { force } => init_config(*force, cli),
    }
}

fn show_config(cli: &Cli) -> Result<()> {
    let mut config = Config::load_with_env(&config_path(cli))?;
    if let Some(kind) = cli.store {
        config.general.token_store = kind;
    }

    match cli.format {
        OutputFormat::Text => {
            println!("Souk Configuration");
            println!("{}", "─".repeat(40));
            println!();
            println!("Backend URL:   {}", config.api.backend_url);
            println!("Frontend URL:  {}", config.api.frontend_url);
            println!(
                "Timeouts:      connect {}s, write {}s, read {}s",
                config.api.connect_timeout_secs,
                config.api.write_timeout_secs,
                config.api.read_timeout_secs
            );
            println!(
                "Retries:       {} (backoff {:?} ms, fallback {} ms)",
                config.api.max_retries, config.api.backoff_ms, config.api.fallback_delay_ms
            );
            println!("Token store:   {}", config.general.token_store);
            println!("Log level:     {}", config.general.log_level);
            println!();
            println!("Profile endpoints:");
            for path in &config.auth.profile_paths {
                println!("  • {path}");
            }
        }
        OutputFormat::Json => {
            println!("{}", JsonFormatter::new(cli.pretty).format(&config)?);
        }
    }

    Ok(())
}

fn show_paths(cli: &Cli) -> Result<()> {
    let config_dir = default_config_dir();
    let config_file = config_path(cli);
    let credentials_file = default_credentials_path();

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration Paths");
            println!("{}", "─".repeat(40));
            println!();
            println!("Config dir:       {}", config_dir.display());
            println!("Config file:      {}", config_file.display());
            println!("Credentials file: {}", credentials_file.display());
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "configDir": config_dir.display().to_string(),
                "configFile": config_file.display().to_string(),
                "credentialsFile": credentials_file.display().to_string(),
            });
            println!("{}", JsonFormatter::new(cli.pretty).format(&paths)?);
        }
    }

    Ok(())
}

fn init_config(force: bool, cli: &Cli) -> Result<()> {
    let path = config_path(cli);

    if path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        );
    }

    Config::default().save_to(&path)?;
    info!(path = %path.display(), "Config written");

    if cli.format == OutputFormat::Text {
        let message = format!("Wrote {}", path.display());
        println!("{}", TextFormatter::new(!cli.no_color).format_done(&message));
    } else {
        let output = serde_json::json!({ "path": path.display().to_string() });
        println!("{}", JsonFormatter::new(cli.pretty).format(&output)?);
    }

    Ok(())
}
