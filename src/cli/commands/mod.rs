//! CLI command implementations

pub mod config;
pub mod fetch;
pub mod lifecycle;
pub mod message;
pub mod status;

pub use config::execute as config;
pub use fetch::execute as fetch;
pub use lifecycle::{activate, deploy, install};
pub use message::execute as message;
pub use status::execute as status;

use crate::agent::{Agent, LocalHost, Origin};
use crate::config::Config;
use crate::error::{ShellcacheError, ShellcacheResult};
use crate::manifest::Deployment;
use crate::network::HttpNetwork;
use crate::storage::DiskStorage;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Command-line values that take precedence over the config file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub origin: Option<String>,
    pub deployment: Option<PathBuf>,
}

/// Resolve the application origin
fn origin(config: &Config, overrides: &Overrides) -> ShellcacheResult<Origin> {
    let raw = overrides
        .origin
        .as_deref()
        .or(config.agent.origin.as_deref())
        .ok_or(ShellcacheError::ConfigMissing("agent.origin"))?;
    Origin::parse(raw)
}

fn http_network(config: &Config) -> HttpNetwork {
    HttpNetwork::new(
        config.network.user_agent.clone(),
        config.network.max_body_bytes(),
    )
}

/// Build an agent backed by on-disk regions and the live network
pub(crate) async fn build_agent(config: &Config, overrides: &Overrides) -> ShellcacheResult<Agent> {
    let origin = origin(config, overrides)?;
    let path = overrides
        .deployment
        .as_ref()
        .or(config.agent.deployment.as_ref())
        .ok_or(ShellcacheError::ConfigMissing("agent.deployment"))?;
    let deployment = Deployment::from_file(path).await?;

    let root = config.storage_root();
    debug!(
        %origin,
        deployment = %path.display(),
        storage = %root.display(),
        "Building agent"
    );

    Ok(Agent::new(
        deployment,
        origin,
        Arc::new(DiskStorage::new(root)),
        Arc::new(http_network(config)),
        Arc::new(LocalHost::new()),
    )
    .with_regions(config.regions.clone()))
}
