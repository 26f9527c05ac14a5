//! Connection settings.

use std::{path::PathBuf, time::Duration};

use uuid::Uuid;

use crate::ZEEMOTE_SERVICE;

/// Where raw traffic is captured when debugging a session.
pub const DEFAULT_CAPTURE_PATH: &str = "/tmp/zeemote_talking";

/// Settings for a [`ZeemoteConnection`](crate::ZeemoteConnection).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ZeemoteConfig {
    /// Service identifier passed to discovery.
    pub service: Uuid,

    /// Number of failed discovery attempts allowed over the lifetime of the connection.
    pub retry_budget: u32,

    /// Pause between failed discovery attempts. `None` retries immediately.
    pub discovery_backoff: Option<Duration>,

    /// File that mirrors every byte read and written. Failing to open it is not an error.
    pub capture_path: Option<PathBuf>,
}

impl Default for ZeemoteConfig {
    fn default() -> Self {
        Self {
            service: ZEEMOTE_SERVICE,
            retry_budget: 3,
            discovery_backoff: None,
            capture_path: None,
        }
    }
}

impl ZeemoteConfig {
    pub fn with_service(mut self, service: Uuid) -> Self {
        self.service = service;
        self
    }

    pub fn with_retry_budget(mut self, retry_budget: u32) -> Self {
        self.retry_budget = retry_budget;
        self
    }

    pub fn with_discovery_backoff(mut self, backoff: Duration) -> Self {
        self.discovery_backoff = Some(backoff);
        self
    }

    pub fn with_capture(mut self, path: impl Into<PathBuf>) -> Self {
        self.capture_path = Some(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ZeemoteConfig::default();
        assert_eq!(config.retry_budget, 3);
        assert_eq!(
            config.service.to_string().to_uppercase(),
            "8E1F0CF7-508F-4875-B62C-FBB67FD34812"
        );
        assert!(config.capture_path.is_none());
    }

    #[test]
    fn builders() {
        let config = ZeemoteConfig::default()
            .with_retry_budget(7)
            .with_discovery_backoff(Duration::from_millis(250))
            .with_capture(DEFAULT_CAPTURE_PATH);

        assert_eq!(config.retry_budget, 7);
        assert_eq!(config.discovery_backoff, Some(Duration::from_millis(250)));
        assert_eq!(config.capture_path, Some(PathBuf::from("/tmp/zeemote_talking")));
    }
}
