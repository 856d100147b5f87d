//! Message command - deliver control data to the agent

use super::{build_agent, Overrides};
use crate::agent::MessageOutcome;
use crate::cli::args::MessageArgs;
use crate::config::Config;
use crate::error::ShellcacheResult;
use crate::ui::{self, Mark, UiContext};
use serde_json::Value;

/// Execute the message command
pub async fn execute(args: MessageArgs, config: &Config, overrides: &Overrides) -> ShellcacheResult<()> {
    let ctx = UiContext::detect();
    let agent = build_agent(config, overrides).await?;

    match agent.message(&parse_data(args.data)).await? {
        MessageOutcome::Promoted => ui::step(&ctx, Mark::Ok, "Waiting agent promoted", None),
        MessageOutcome::Downloaded(report) if report.fetched.is_empty() => {
            ui::step(&ctx, Mark::Ok, "Every resource is already available offline", None)
        }
        MessageOutcome::Downloaded(report) => {
            ui::step(
                &ctx,
                Mark::Ok,
                "Downloaded for offline use",
                Some(&format!("{} resource(s)", report.fetched.len())),
            );
            for key in &report.fetched {
                ui::note(&ctx, key);
            }
        }
        MessageOutcome::Ignored => ui::step(
            &ctx,
            Mark::Warn,
            "Message ignored",
            Some("Recognized messages: skipWaiting, downloadOffline"),
        ),
    }

    Ok(())
}

/// JSON if it parses, otherwise the raw text as a string
fn parse_data(data: String) -> Value {
    match serde_json::from_str(&data) {
        Ok(value) => value,
        Err(_) => Value::String(data),
    }
}
