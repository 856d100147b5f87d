//! Error types for shellcache
//!
//! All modules use `ShellcacheResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

use crate::network::NetworkError;

/// Result type alias for shellcache operations
pub type ShellcacheResult<T> = Result<T, ShellcacheError>;

/// All errors that can occur in shellcache
#[derive(Error, Debug)]
pub enum ShellcacheError {
    // Network errors
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("Fetch of {url} returned status {status}")]
    BadStatus { url: String, status: u16 },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid origin '{origin}': {reason}")]
    InvalidOrigin { origin: String, reason: String },

    // Manifest errors
    #[error("Invalid deployment manifest {path}: {reason}")]
    ManifestInvalid { path: PathBuf, reason: String },

    #[error("Core shell resource '{0}' is not listed in the manifest")]
    CoreNotInManifest(String),

    // Storage errors
    #[error("Cache region not found: {0}")]
    RegionNotFound(String),

    #[error("Corrupt cache entry in {region}: {reason}")]
    CorruptEntry { region: String, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Missing configuration value: {0}")]
    ConfigMissing(&'static str),

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ShellcacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Whether the error came from the network rather than local state
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_) | Self::BadStatus { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ConfigMissing("agent.origin") => {
                Some("Pass --origin or run: shellcache config init, then set [agent] origin")
            }
            Self::ConfigMissing("agent.deployment") => {
                Some("Pass --deployment <file.json> or set [agent] deployment in the config")
            }
            Self::CoreNotInManifest(_) => {
                Some("Every entry of \"core\" must also be a key of \"resources\"")
            }
            Self::Network(_) => Some("Check that the origin is reachable"),
            _ => None,
        }
    }
}
