//! Fetch command - route one request through the agent

use super::{build_agent, http_network, Overrides};
use crate::agent::{FetchOutcome, Origin, ResponseSource};
use crate::cli::args::FetchArgs;
use crate::config::Config;
use crate::error::{ShellcacheError, ShellcacheResult};
use crate::network::{Method, Network, Request, Response};
use crate::ui::{self, Mark, UiContext};
use console::style;
use std::io::Write;
use std::str::FromStr;
use tokio::fs;

/// Execute the fetch command
pub async fn execute(args: FetchArgs, config: &Config, overrides: &Overrides) -> ShellcacheResult<()> {
    let agent = build_agent(config, overrides).await?;
    let method = Method::from_str(&args.method).unwrap_or_else(|never| match never {});
    let request = Request::new(method, absolute_url(agent.origin(), &args.url));

    let (response, source) = match agent.fetch(&request).await? {
        FetchOutcome::Respond { response, source } => (response, Some(source)),
        FetchOutcome::Bypass => (http_network(config).fetch(&request).await?, None),
    };

    eprintln!(
        "{} {} {}",
        status_label(&response),
        request.url,
        style(format!("({})", source_label(source))).dim()
    );

    match args.output {
        Some(path) => {
            fs::write(&path, &response.body).await.map_err(|e| {
                ShellcacheError::io(format!("writing response to {}", path.display()), e)
            })?;
            let ctx = UiContext::detect();
            ui::step(
                &ctx,
                Mark::Ok,
                &format!("Saved {} bytes", response.body.len()),
                Some(&path.display().to_string()),
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(&response.body)
                .and_then(|()| stdout.flush())
                .map_err(|e| ShellcacheError::io("writing response to stdout", e))?;
        }
    }

    Ok(())
}

/// Accept absolute URLs as-is; anything else is a path under the origin
fn absolute_url(origin: &Origin, url: &str) -> String {
    if url.contains("://") {
        url.to_string()
    } else {
        origin.resolve(url)
    }
}

fn status_label(response: &Response) -> console::StyledObject<u16> {
    if response.ok() {
        style(response.status).green()
    } else {
        style(response.status).red()
    }
}

fn source_label(source: Option<ResponseSource>) -> &'static str {
    match source {
        Some(ResponseSource::Cache) => "cache",
        Some(ResponseSource::Network) => "network, via agent",
        None => "network, not intercepted",
    }
}
