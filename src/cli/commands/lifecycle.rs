//! Install, activate and deploy commands

use super::{build_agent, Overrides};
use crate::agent::{ActivationOutcome, Agent};
use crate::config::Config;
use crate::error::ShellcacheResult;
use crate::ui::{self, Mark, Phase, PhaseSpinner, UiContext};

/// Execute the install command
pub async fn install(config: &Config, overrides: &Overrides) -> ShellcacheResult<()> {
    let ctx = UiContext::detect();
    let agent = build_agent(config, overrides).await?;
    run_install(&ctx, &agent).await
}

/// Execute the activate command
pub async fn activate(config: &Config, overrides: &Overrides) -> ShellcacheResult<()> {
    let ctx = UiContext::detect();
    let agent = build_agent(config, overrides).await?;
    run_activate(&ctx, &agent).await
}

/// Execute the deploy command: install, and activate only after a successful install
pub async fn deploy(config: &Config, overrides: &Overrides) -> ShellcacheResult<()> {
    let ctx = UiContext::detect();
    let agent = build_agent(config, overrides).await?;

    ui::banner(&ctx, &format!("Deploying {}", agent.origin()));

    if let Err(e) = run_install(&ctx, &agent).await {
        ui::conclude(&ctx, Mark::Fail, "Install failed; previous cache left untouched");
        return Err(e);
    }
    run_activate(&ctx, &agent).await?;

    ui::conclude(&ctx, Mark::Ok, "Deployment active");
    Ok(())
}

async fn run_install(ctx: &UiContext, agent: &Agent) -> ShellcacheResult<()> {
    let spinner = PhaseSpinner::begin(
        ctx,
        Phase::Install,
        &format!(
            "fetching {} core resource(s) into {}",
            agent.deployment().core().len(),
            agent.regions().temp
        ),
    );

    match agent.install().await {
        Ok(report) => {
            spinner.finish(Mark::Ok, &format!("core shell staged ({} cached)", report.cached));
            Ok(())
        }
        Err(e) => {
            spinner.finish(Mark::Fail, "core shell not staged");
            Err(e)
        }
    }
}

async fn run_activate(ctx: &UiContext, agent: &Agent) -> ShellcacheResult<()> {
    let spinner = PhaseSpinner::begin(
        ctx,
        Phase::Activate,
        &format!("reconciling {} against the new manifest", agent.regions().content),
    );

    match agent.activate().await {
        Ok(ActivationOutcome::Activated(report)) => {
            let summary = if report.fresh {
                "fresh cache".to_string()
            } else {
                format!(
                    "{} retained, {} evicted",
                    report.retained.len(),
                    report.evicted.len()
                )
            };
            spinner.finish(
                Mark::Ok,
                &format!("{}, {} shell resource(s) copied", summary, report.shell_copied),
            );
            for url in &report.evicted {
                ui::note(ctx, &format!("evicted {}", url));
            }
        }
        Ok(ActivationOutcome::Reset { reason }) => {
            spinner.finish(Mark::Warn, "upgrade failed, every cache region cleared");
            ui::step(
                ctx,
                Mark::Warn,
                &reason,
                Some("Resources will be fetched again on demand"),
            );
        }
        Err(e) => {
            spinner.finish(Mark::Fail, "cache regions could not be cleared");
            return Err(e);
        }
    }
    Ok(())
}
