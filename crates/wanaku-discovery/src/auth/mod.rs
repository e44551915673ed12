//! OAuth2 bearer token acquisition for registry calls.

pub mod endpoint;
pub mod token;

pub use endpoint::{DirectEndpoint, DiscoveredEndpoint, EndpointResolver, EndpointStrategy};
pub use token::{AccessTokenState, RENEWAL_MARGIN_SECS, TokenSource};
