//! Hosting runtime interface
//!
//! The runtime decides when an agent version is installed, waiting or
//! active. The agent can only ask it for two things: skip the waiting
//! phase, and take control of already-open pages.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::info;

/// Capabilities the hosting runtime exposes to the agent
#[async_trait]
pub trait Host: Send + Sync {
    /// Promote this agent version past the waiting state immediately
    async fn skip_waiting(&self);

    /// Take control of all open application pages without a reload
    async fn claim_clients(&self);
}

/// Host for a single local process; records the requests it receives
#[derive(Debug, Default)]
pub struct LocalHost {
    skip_waiting: AtomicBool,
    claims: AtomicUsize,
}

impl LocalHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether promotion past waiting has been requested
    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    /// How many times clients were claimed
    pub fn claims(&self) -> usize {
        self.claims.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Host for LocalHost {
    async fn skip_waiting(&self) {
        if !self.skip_waiting.swap(true, Ordering::SeqCst) {
            info!("Agent requested promotion past waiting");
        }
    }

    async fn claim_clients(&self) {
        self.claims.fetch_add(1, Ordering::SeqCst);
        info!("Agent claimed open clients");
    }
}
