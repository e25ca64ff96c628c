//! Session commands - login, register, exchange, whoami, refresh, logout.

use anyhow::{Context, Result};
use clap::Args;
use souk_session::{AuthSession, BootstrapReport};
use tracing::info;

use crate::context::AppContext;
use crate::output::{JsonFormatter, SessionOutput, TextFormatter};
use crate::{Cli, OutputFormat};

/// Environment variable read when `--password` is omitted.
pub const ENV_PASSWORD: &str = "SOUK_PASSWORD";

/// Arguments for the login command.
#[derive(Args)]
pub struct LoginArgs {
    /// Account email.
    pub email: String,

    /// Password (falls back to `SOUK_PASSWORD`).
    #[arg(long, short)]
    pub password: Option<String>,
}

/// Arguments for the register command.
#[derive(Args)]
pub struct RegisterArgs {
    /// Account email.
    pub email: String,

    /// Given name.
    #[arg(long)]
    pub first_name: String,

    /// Family name.
    #[arg(long)]
    pub last_name: String,

    /// Password (falls back to `SOUK_PASSWORD`).
    #[arg(long, short)]
    pub password: Option<String>,
}

/// Arguments for the exchange command.
#[derive(Args)]
pub struct ExchangeArgs {
    /// Identity-provider access token.
    #[arg(long)]
    pub access_token: String,

    /// Identity-provider id token.
    #[arg(long)]
    pub id_token: String,
}

/// Signs in with email and password.
pub async fn login(args: &LoginArgs, cli: &Cli) -> Result<()> {
    let password = resolve_password(args.password.as_deref())?;
    let ctx = AppContext::load(cli)?;

    let report = ctx.session.login_with_email(&args.email, &password).await?;
    info!(outcome = %report.outcome, "Signed in");
    print_session(&ctx.session, Some(&report), cli)
}

/// Creates an account and signs in.
pub async fn register(args: &RegisterArgs, cli: &Cli) -> Result<()> {
    let password = resolve_password(args.password.as_deref())?;
    let ctx = AppContext::load(cli)?;

    let report = ctx
        .session
        .register_with_email(&args.email, &password, &args.first_name, &args.last_name)
        .await?;
    info!(outcome = %report.outcome, "Registered");
    print_session(&ctx.session, Some(&report), cli)
}

/// Exchanges identity-provider tokens for a session.
pub async fn exchange(args: &ExchangeArgs, cli: &Cli) -> Result<()> {
    let ctx = AppContext::load(cli)?;

    let report = ctx
        .session
        .exchange_identity_tokens(&args.access_token, &args.id_token)
        .await?;
    print_session(&ctx.session, Some(&report), cli)
}

/// Bootstraps from stored credentials and shows the result.
pub async fn whoami(cli: &Cli) -> Result<()> {
    let ctx = AppContext::load(cli)?;

    let report = ctx.session.initialize().await;
    print_session(&ctx.session, Some(&report), cli)
}

/// Refreshes the stored token pair.
pub async fn refresh(cli: &Cli) -> Result<()> {
    let ctx = AppContext::load(cli)?;

    ctx.session.refresh_token().await?;

    match cli.format {
        OutputFormat::Text => {
            println!("{}", TextFormatter::new(!cli.no_color).format_done("Tokens refreshed"));
        }
        OutputFormat::Json => {
            let output = serde_json::json!({ "refreshed": true });
            println!("{}", JsonFormatter::new(cli.pretty).format(&output)?);
        }
    }
    Ok(())
}

/// Clears every stored credential.
pub async fn logout(cli: &Cli) -> Result<()> {
    let ctx = AppContext::load(cli)?;

    ctx.session.sign_out().await;
    print_session(&ctx.session, None, cli)
}

fn resolve_password(flag: Option<&str>) -> Result<String> {
    match flag {
        Some(password) => Ok(password.to_string()),
        None => std::env::var(ENV_PASSWORD)
            .with_context(|| format!("Pass --password or set {ENV_PASSWORD}")),
    }
}

fn print_session(session: &AuthSession, report: Option<&BootstrapReport>, cli: &Cli) -> Result<()> {
    let user = session.current_user();

    let output = match cli.format {
        OutputFormat::Text => {
            TextFormatter::new(!cli.no_color).format_session(session.state(), user.as_ref(), report)
        }
        OutputFormat::Json => {
            let output = SessionOutput::new(session.state(), user, report);
            JsonFormatter::new(cli.pretty).format(&output)?
        }
    };
    println!("{output}");

    Ok(())
}
