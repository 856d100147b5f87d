//! Status command - show cache regions and pending manifest changes

use super::{build_agent, Overrides};
use crate::agent::Agent;
use crate::cli::args::{OutputFormat, StatusArgs};
use crate::config::Config;
use crate::error::ShellcacheResult;
use crate::manifest::ManifestDiff;
use crate::ui::{self, Mark, UiContext};
use console::style;
use serde::Serialize;

/// Snapshot of the agent's persisted state
#[derive(Debug, Serialize)]
struct StatusReport {
    origin: String,
    resources: usize,
    core: usize,
    regions: Vec<RegionStatus>,
    /// `None` until a deployment has been activated
    pending: Option<ManifestDiff>,
}

#[derive(Debug, Serialize)]
struct RegionStatus {
    role: &'static str,
    name: String,
    exists: bool,
    entries: usize,
}

/// Execute the status command
pub async fn execute(args: StatusArgs, config: &Config, overrides: &Overrides) -> ShellcacheResult<()> {
    let agent = build_agent(config, overrides).await?;
    let report = collect(&agent).await?;

    match args.format {
        OutputFormat::Table => print_table(&report),
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Plain => print_plain(&report),
    }

    Ok(())
}

async fn collect(agent: &Agent) -> ShellcacheResult<StatusReport> {
    let names = agent.regions();
    let storage = agent.storage();

    let mut regions = Vec::new();
    for (role, name) in [
        ("temp", &names.temp),
        ("content", &names.content),
        ("manifest", &names.manifest),
    ] {
        let exists = storage.has(name).await?;
        let entries = if exists {
            storage.open(name).await?.keys().await?.len()
        } else {
            0
        };
        regions.push(RegionStatus {
            role,
            name: name.clone(),
            exists,
            entries,
        });
    }

    Ok(StatusReport {
        origin: agent.origin().to_string(),
        resources: agent.deployment().manifest().len(),
        core: agent.deployment().core().len(),
        regions,
        pending: agent.pending_changes().await?,
    })
}

fn print_table(report: &StatusReport) {
    let ctx = UiContext::detect();
    ui::banner(&ctx, &format!("shellcache status for {}", report.origin));

    ui::field(
        &ctx,
        "Deployment",
        &format!("{} resource(s), {} core", report.resources, report.core),
    );

    println!();
    println!(
        "{:<10} {:<28} {:<8}",
        style("ROLE").bold(),
        style("REGION").bold(),
        style("ENTRIES").bold()
    );
    println!("{}", "-".repeat(48));
    for region in &report.regions {
        let entries = if region.exists {
            region.entries.to_string()
        } else {
            style("absent").dim().to_string()
        };
        println!("{:<10} {:<28} {:<8}", region.role, region.name, entries);
    }

    ui::heading(&ctx, "Manifest");
    match &report.pending {
        None => ui::step(&ctx, Mark::Info, "No deployment activated yet", None),
        Some(diff) => ui::manifest_diff(&ctx, diff, "Run: shellcache deploy"),
    }
}

fn print_json(report: &StatusReport) -> ShellcacheResult<()> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{}", json);
    Ok(())
}

fn print_plain(report: &StatusReport) {
    for region in &report.regions {
        println!("{} {}", region.name, region.entries);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{LocalHost, Origin};
    use crate::manifest::Deployment;
    use crate::network::StaticNetwork;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    fn agent() -> (Agent, Arc<StaticNetwork>) {
        let deployment = Deployment::parse(
            r#"{"resources": {"/": "h0", "main.dart.js": "h1"}, "core": ["main.dart.js"]}"#,
        )
        .unwrap();
        let network = Arc::new(StaticNetwork::new());
        let agent = Agent::new(
            deployment,
            Origin::parse("https://app.test").unwrap(),
            Arc::new(MemoryStorage::new()),
            network.clone(),
            Arc::new(LocalHost::new()),
        );
        (agent, network)
    }

    #[tokio::test]
    async fn status_before_install_creates_nothing() {
        let (agent, _) = agent();

        let report = collect(&agent).await.unwrap();

        assert!(report.regions.iter().all(|r| !r.exists));
        assert!(report.pending.is_none());
        assert!(agent.storage().names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn status_after_deploy() {
        let (agent, network) = agent();
        network.serve("https://app.test/main.dart.js", "js");
        agent.install().await.unwrap();
        agent.activate().await.unwrap();

        let report = collect(&agent).await.unwrap();

        let content = report.regions.iter().find(|r| r.role == "content").unwrap();
        assert_eq!(content.entries, 1);
        let temp = report.regions.iter().find(|r| r.role == "temp").unwrap();
        assert!(!temp.exists);
        let pending = report.pending.unwrap();
        assert!(pending.is_empty());
        assert_eq!(pending.unchanged, 2);

        let json = serde_json::to_value(collect(&agent).await.unwrap()).unwrap();
        assert_eq!(json["origin"], "https://app.test");
    }
}
