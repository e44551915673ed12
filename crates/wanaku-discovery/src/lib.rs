//! Client side of the Wanaku discovery protocol: announces a capability
//! service to the registry, keeps it alive with heartbeats and deregisters
//! it on shutdown.

pub mod auth;
pub mod callbacks;
pub mod config;
pub mod manager;
pub mod transport;

pub use auth::{AccessTokenState, TokenSource};
pub use callbacks::{CallbackRegistry, CallbackResult, LoggingCallback, RegistrationCallback};
pub use config::{AuthConfig, DiscoveryConfig, RegistrationConfig};
pub use manager::{RegistrationManager, RegistrationState};
pub use transport::{DISCOVERY_BASE_PATH, HttpRegistryTransport, RegistryReply, RegistryTransport};
