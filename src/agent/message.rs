//! Control messages posted to the agent by application pages

use serde::{Deserialize, Serialize};
use std::fmt;

/// Recognized control messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ControlMessage {
    /// Promote a waiting agent version immediately
    SkipWaiting,
    /// Populate the content region with every manifest resource
    DownloadOffline,
}

impl ControlMessage {
    /// Interpret message data; anything unrecognized yields `None`
    pub fn from_data(data: &serde_json::Value) -> Option<Self> {
        Self::deserialize(data).ok()
    }
}

impl fmt::Display for ControlMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SkipWaiting => "skipWaiting",
            Self::DownloadOffline => "downloadOffline",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn recognizes_control_messages() {
        assert_eq!(
            ControlMessage::from_data(&json!("skipWaiting")),
            Some(ControlMessage::SkipWaiting)
        );
        assert_eq!(
            ControlMessage::from_data(&json!("downloadOffline")),
            Some(ControlMessage::DownloadOffline)
        );
    }

    #[test]
    fn ignores_everything_else() {
        for data in [
            json!("SkipWaiting"),
            json!("refresh"),
            json!(42),
            json!(null),
            json!({"type": "skipWaiting"}),
            json!(["downloadOffline"]),
        ] {
            assert_eq!(ControlMessage::from_data(&data), None, "{data}");
        }
    }

    #[test]
    fn display_matches_wire_name() {
        assert_eq!(ControlMessage::SkipWaiting.to_string(), "skipWaiting");
        assert_eq!(ControlMessage::DownloadOffline.to_string(), "downloadOffline");
    }
}
