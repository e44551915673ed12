use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of the last call served, reported through the update-state call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceState {
    pub timestamp: DateTime<Utc>,
    pub healthy: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ServiceState {
    pub fn healthy() -> Self {
        Self {
            timestamp: Utc::now(),
            healthy: true,
            reason: None,
        }
    }

    pub fn unhealthy(reason: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            healthy: false,
            reason: Some(reason.into()),
        }
    }
}
