//! Raw API requests - get, post, put, patch, delete.

use anyhow::Result;
use clap::Args;
use souk_core::{HttpMethod, Request};
use tracing::info;

use crate::context::AppContext;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for requests without a body.
#[derive(Args)]
pub struct ReadArgs {
    /// Path under the API base (e.g. `listings/42`) or an absolute URL.
    pub target: String,

    /// Send without the bearer token.
    #[arg(long)]
    pub no_auth: bool,

    /// Extra header, as `Name: value`. Repeatable.
    #[arg(long = "header", short = 'H')]
    pub headers: Vec<String>,
}

/// Arguments for requests with a JSON body.
#[derive(Args)]
pub struct WriteArgs {
    #[command(flatten)]
    pub common: ReadArgs,

    /// JSON request body. POST, PUT, and PATCH send `{}` when omitted.
    #[arg(long, short)]
    pub data: Option<String>,
}

/// Runs a GET.
pub async fn run_read(method: HttpMethod, args: &ReadArgs, cli: &Cli) -> Result<()> {
    send(method, args, None, cli).await
}

/// Runs a POST, PUT, PATCH, or DELETE.
pub async fn run_write(method: HttpMethod, args: &WriteArgs, cli: &Cli) -> Result<()> {
    let body = request_body(method, args.data.as_deref())?;
    send(method, &args.common, body, cli).await
}

fn request_body(method: HttpMethod, data: Option<&str>) -> Result<Option<&str>> {
    let body = match data {
        Some(data) => Some(data),
        None if method == HttpMethod::Delete => None,
        None => Some("{}"),
    };
    if let Some(body) = body {
        serde_json::from_str::<serde_json::Value>(body)
            .map_err(|e| anyhow::anyhow!("--data is not valid JSON: {e}"))?;
    }
    Ok(body)
}

async fn send(method: HttpMethod, args: &ReadArgs, body: Option<&str>, cli: &Cli) -> Result<()> {
    let ctx = AppContext::load(cli)?;
    let url = ctx.resolve(&args.target)?;

    let mut request = Request::new(method, url).with_auth(!args.no_auth);
    if let Some(body) = body {
        request = request.with_body(body);
    }
    for header in &args.headers {
        let (name, value) = parse_header(header)?;
        request = request.with_header(name, value);
    }

    info!(method = %method.as_str(), "Sending request");
    let response = ctx.client().send(request).await?;

    let output = match cli.format {
        OutputFormat::Text => TextFormatter::new(!cli.no_color).format_body(&response),
        OutputFormat::Json => JsonFormatter::new(cli.pretty).format_body(&response)?,
    };
    println!("{output}");

    Ok(())
}

fn parse_header(raw: &str) -> Result<(&str, &str)> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("Header must look like `Name: value`: {raw}"))?;
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("Header name is empty: {raw}");
    }
    Ok((name, value.trim()))
}
