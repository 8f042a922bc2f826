//! Live connection status as observed by presentation layers

use serde::{Deserialize, Serialize};

/// Status of the live-update connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    #[default]
    Disconnected,
    Error,
}

impl ConnectionStatus {
    /// Whether updates are currently flowing
    pub fn is_live(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_disconnected() {
        assert_eq!(ConnectionStatus::default(), ConnectionStatus::Disconnected);
    }

    #[test]
    fn test_only_connected_is_live() {
        assert!(ConnectionStatus::Connected.is_live());
        assert!(!ConnectionStatus::Connecting.is_live());
        assert!(!ConnectionStatus::Error.is_live());
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&ConnectionStatus::Connecting).unwrap();
        assert_eq!(json, "\"connecting\"");
    }
}
