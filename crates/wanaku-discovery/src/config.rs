use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use wanaku_core::WanakuError;

/// Timing and retry knobs for the registration lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationConfig {
    pub max_retries: u32,
    pub wait_seconds: u64,
    pub data_dir: PathBuf,
    pub initial_delay_seconds: u64,
    pub period_seconds: u64,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            wait_seconds: 1,
            data_dir: PathBuf::from(".wanaku"),
            initial_delay_seconds: 0,
            period_seconds: 5,
        }
    }
}

impl RegistrationConfig {
    pub fn validate(&self) -> Result<(), WanakuError> {
        if self.period_seconds == 0 {
            return Err(WanakuError::InvalidArgument(
                "registration period must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn wait(&self) -> Duration {
        Duration::from_secs(self.wait_seconds)
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_seconds)
    }

    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_seconds)
    }
}

/// Where the discovery API lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    pub registry_uri: String,
    pub request_timeout: Duration,
}

impl DiscoveryConfig {
    pub fn new(registry_uri: impl Into<String>) -> Self {
        Self {
            registry_uri: registry_uri.into(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// OAuth2 client credentials. `token_endpoint` is either the token URL
/// itself or an OIDC issuer to run discovery against.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub token_endpoint: String,
    pub client_id: String,
    pub client_secret: String,
    pub scope: Option<String>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_endpoint", &self.token_endpoint)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("scope", &self.scope)
            .finish()
    }
}
