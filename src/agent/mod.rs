//! The offline caching agent
//!
//! The hosting runtime delivers four kinds of events:
//!
//! | Event | Handler | Runs |
//! |-------|---------|------|
//! | install | `Agent::install` | once per deployed version |
//! | activate | `Agent::activate` | after a successful install |
//! | fetch | `Agent::fetch` | per request, concurrently |
//! | message | `Agent::message` | on demand from app pages |
//!
//! Handlers share no mutable state besides the cache regions, whose key
//! operations are individually atomic. Only activate touches more than one
//! key as a unit, and the runtime never runs two activations at once.

pub mod host;
pub mod key;
mod lifecycle;
mod message;
mod router;
mod sync;

pub use host::{Host, LocalHost};
pub use key::{cache_url, request_key, resource_key, Origin, ROOT_KEY};
pub use lifecycle::{ActivationOutcome, ActivationReport, InstallReport, MANIFEST_KEY};
pub use message::ControlMessage;
pub use router::{FetchOutcome, ResponseSource};
pub use sync::SyncReport;

use crate::error::ShellcacheResult;
use crate::manifest::Deployment;
use crate::network::{Network, Request};
use crate::storage::{CacheStorage, RegionNames};
use std::sync::Arc;

/// An event delivered by the hosting runtime
#[derive(Debug, Clone)]
pub enum Event {
    Install,
    Activate,
    Fetch(Request),
    Message(serde_json::Value),
}

/// What handling a message did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    Promoted,
    Downloaded(SyncReport),
    Ignored,
}

/// Result of handling one event
#[derive(Debug, Clone)]
pub enum EventOutcome {
    Installed(InstallReport),
    Activated(ActivationOutcome),
    Fetched(FetchOutcome),
    Message(MessageOutcome),
}

/// Offline caching agent for one deployment
pub struct Agent {
    deployment: Arc<Deployment>,
    origin: Origin,
    regions: RegionNames,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    host: Arc<dyn Host>,
}

impl Agent {
    /// Create an agent using the default region names
    pub fn new(
        deployment: Deployment,
        origin: Origin,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
        host: Arc<dyn Host>,
    ) -> Self {
        Self {
            deployment: Arc::new(deployment),
            origin,
            regions: RegionNames::default(),
            storage,
            network,
            host,
        }
    }

    /// Override region names (must stay stable across versions)
    pub fn with_regions(mut self, regions: RegionNames) -> Self {
        self.regions = regions;
        self
    }

    pub fn deployment(&self) -> &Deployment {
        &self.deployment
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn regions(&self) -> &RegionNames {
        &self.regions
    }

    pub fn storage(&self) -> &dyn CacheStorage {
        &*self.storage
    }

    /// Dispatch a runtime event to its handler
    pub async fn handle(&self, event: Event) -> ShellcacheResult<EventOutcome> {
        match event {
            Event::Install => self.install().await.map(EventOutcome::Installed),
            Event::Activate => self.activate().await.map(EventOutcome::Activated),
            Event::Fetch(request) => self.fetch(&request).await.map(EventOutcome::Fetched),
            Event::Message(data) => self.message(&data).await.map(EventOutcome::Message),
        }
    }

    /// Handle a message event. Unrecognized data is ignored.
    pub async fn message(&self, data: &serde_json::Value) -> ShellcacheResult<MessageOutcome> {
        match ControlMessage::from_data(data) {
            Some(ControlMessage::SkipWaiting) => {
                self.host.skip_waiting().await;
                Ok(MessageOutcome::Promoted)
            }
            Some(ControlMessage::DownloadOffline) => {
                self.download_offline().await.map(MessageOutcome::Downloaded)
            }
            None => {
                tracing::debug!(%data, "Ignoring unrecognized message");
                Ok(MessageOutcome::Ignored)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::manifest::Manifest;
    use crate::network::StaticNetwork;
    use crate::storage::MemoryStorage;
    use serde_json::json;

    pub(crate) const ORIGIN: &str = "https://app.test";

    /// Agent wired to in-memory storage and a scripted network
    pub(crate) struct Harness {
        pub agent: Agent,
        pub storage: Arc<MemoryStorage>,
        pub network: Arc<StaticNetwork>,
        pub host: Arc<LocalHost>,
    }

    impl Harness {
        pub fn new(resources: &[(&str, &str)], core: &[&str]) -> Self {
            Self::with_storage(resources, core, Arc::new(MemoryStorage::new()))
        }

        /// A new agent version sharing storage with a previous one
        pub fn with_storage(
            resources: &[(&str, &str)],
            core: &[&str],
            storage: Arc<MemoryStorage>,
        ) -> Self {
            let manifest: Manifest = resources.iter().copied().collect();
            let deployment =
                Deployment::new(manifest, core.iter().map(|s| s.to_string()).collect()).unwrap();
            let network = Arc::new(StaticNetwork::new());
            let host = Arc::new(LocalHost::new());
            let agent = Agent::new(
                deployment,
                Origin::parse(ORIGIN).unwrap(),
                storage.clone(),
                network.clone(),
                host.clone(),
            );
            Self {
                agent,
                storage,
                network,
                host,
            }
        }

        pub fn url(key: &str) -> String {
            Origin::parse(ORIGIN).unwrap().resolve(key)
        }

        /// Serve every manifest resource with body `<key>@<fingerprint>`
        pub fn serve_all(&self) {
            for key in self.agent.deployment().manifest().keys() {
                let fingerprint = self.agent.deployment().manifest().fingerprint(key).unwrap();
                self.network
                    .serve(&Self::url(key), format!("{key}@{fingerprint}"));
            }
        }
    }

    #[tokio::test]
    async fn skip_waiting_message_promotes() {
        let harness = Harness::new(&[("/", "h0")], &[]);
        let outcome = harness.agent.message(&json!("skipWaiting")).await.unwrap();
        assert_eq!(outcome, MessageOutcome::Promoted);
        assert!(harness.host.skip_waiting_requested());
    }

    #[tokio::test]
    async fn unknown_message_is_ignored() {
        let harness = Harness::new(&[("/", "h0")], &[]);
        let outcome = harness.agent.message(&json!({"cmd": "wipe"})).await.unwrap();
        assert_eq!(outcome, MessageOutcome::Ignored);
        assert!(!harness.host.skip_waiting_requested());
        assert!(harness.network.requests().is_empty());
    }

    #[tokio::test]
    async fn handle_dispatches_events() {
        let harness = Harness::new(&[("/", "h0"), ("main.dart.js", "h1")], &["main.dart.js"]);
        harness.serve_all();

        let installed = harness.agent.handle(Event::Install).await.unwrap();
        assert!(matches!(installed, EventOutcome::Installed(ref r) if r.cached == 1));

        let activated = harness.agent.handle(Event::Activate).await.unwrap();
        assert!(matches!(
            activated,
            EventOutcome::Activated(ActivationOutcome::Activated(_))
        ));

        let fetched = harness
            .agent
            .handle(Event::Fetch(Request::get(Harness::url("main.dart.js"))))
            .await
            .unwrap();
        assert!(matches!(
            fetched,
            EventOutcome::Fetched(FetchOutcome::Respond {
                source: ResponseSource::Cache,
                ..
            })
        ));

        let message = harness
            .agent
            .handle(Event::Message(json!("downloadOffline")))
            .await
            .unwrap();
        assert!(matches!(
            message,
            EventOutcome::Message(MessageOutcome::Downloaded(ref r)) if r.fetched == vec!["/"]
        ));
    }
}
