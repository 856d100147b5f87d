//! Manifest store
//!
//! A deployment is described by build tooling as one JSON document: the
//! manifest (logical path -> content fingerprint) plus the core shell set
//! that must be cached before the app can boot offline.

mod deployment;
mod resources;

pub use deployment::Deployment;
pub use resources::{Manifest, ManifestDiff};
