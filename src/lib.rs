//! Shellcache - offline caching agent for web application shells
//!
//! Caches the core shell of a deployed web application at install time,
//! reconciles cached resources against each new deployment's manifest on
//! activation, and answers requests cache-first (the root document
//! online-first) so the application keeps working offline.

pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod manifest;
pub mod network;
pub mod storage;
pub mod ui;

pub use agent::Agent;
pub use error::{ShellcacheError, ShellcacheResult};
