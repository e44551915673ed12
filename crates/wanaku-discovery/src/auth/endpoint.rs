//! Token endpoint resolution.
//!
//! A configured URL ending in `/token` is used verbatim. Anything else is
//! treated as an OIDC issuer whose metadata names the token endpoint; that
//! endpoint is then rebased onto the issuer's scheme, host and port because
//! the identity provider advertises an address services cannot reach.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;
use wanaku_core::WanakuError;

const OIDC_METADATA_PATH: &str = "/.well-known/openid-configuration";

#[async_trait]
pub trait EndpointResolver: Send + Sync {
    async fn resolve(&self, client: &Client) -> Result<Url, WanakuError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointStrategy {
    Direct,
    Discovered,
}

impl EndpointStrategy {
    pub fn for_url(url: &Url) -> Self {
        let last = url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last());
        match last {
            Some("token") => EndpointStrategy::Direct,
            _ => EndpointStrategy::Discovered,
        }
    }
}

/// Picks the resolver matching the shape of the configured URL.
pub fn resolver_for(configured: &str) -> Result<Box<dyn EndpointResolver>, WanakuError> {
    let url = Url::parse(configured).map_err(|e| {
        WanakuError::InvalidArgument(format!("invalid token endpoint {configured:?}: {e}"))
    })?;

    Ok(match EndpointStrategy::for_url(&url) {
        EndpointStrategy::Direct => Box::new(DirectEndpoint::new(url)),
        EndpointStrategy::Discovered => Box::new(DiscoveredEndpoint::new(url)),
    })
}

#[derive(Debug, Clone)]
pub struct DirectEndpoint {
    url: Url,
}

impl DirectEndpoint {
    pub fn new(url: Url) -> Self {
        Self { url }
    }
}

#[async_trait]
impl EndpointResolver for DirectEndpoint {
    async fn resolve(&self, _client: &Client) -> Result<Url, WanakuError> {
        Ok(self.url.clone())
    }
}

#[derive(Debug, Clone)]
pub struct DiscoveredEndpoint {
    issuer: Url,
}

#[derive(Debug, Deserialize)]
struct ProviderMetadata {
    token_endpoint: Option<String>,
}

impl DiscoveredEndpoint {
    pub fn new(issuer: Url) -> Self {
        Self { issuer }
    }

    pub fn metadata_url(&self) -> Result<Url, WanakuError> {
        let base = self.issuer.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}{OIDC_METADATA_PATH}"))
            .map_err(|e| WanakuError::InvalidArgument(format!("invalid issuer {base}: {e}")))
    }

    /// Moves `advertised` onto the issuer's origin, keeping its path.
    pub fn rebase(&self, advertised: &str) -> Result<Url, WanakuError> {
        let mut url = Url::parse(advertised).map_err(|e| {
            WanakuError::InvalidResponseData(format!("invalid token_endpoint {advertised:?}: {e}"))
        })?;
        let rebase_failed =
            || WanakuError::InvalidArgument(format!("cannot rebase {advertised} onto {}", self.issuer));

        url.set_scheme(self.issuer.scheme()).map_err(|_| rebase_failed())?;
        url.set_host(self.issuer.host_str()).map_err(|_| rebase_failed())?;
        url.set_port(self.issuer.port()).map_err(|_| rebase_failed())?;
        Ok(url)
    }
}

#[async_trait]
impl EndpointResolver for DiscoveredEndpoint {
    async fn resolve(&self, client: &Client) -> Result<Url, WanakuError> {
        let metadata_url = self.metadata_url()?;
        let res = client.get(metadata_url.clone()).send().await.map_err(|e| {
            WanakuError::AuthenticationFailure(format!("OIDC discovery at {metadata_url} failed: {e}"))
        })?;

        let status = res.status();
        if !status.is_success() {
            return Err(WanakuError::AuthenticationFailure(format!(
                "OIDC discovery at {metadata_url} returned {status}"
            )));
        }

        let metadata: ProviderMetadata = res.json().await.map_err(|e| {
            WanakuError::InvalidResponseData(format!("malformed OIDC metadata: {e}"))
        })?;
        let advertised = metadata.token_endpoint.ok_or_else(|| {
            WanakuError::ConfigurationNotFound(format!("token_endpoint missing from {metadata_url}"))
        })?;

        let endpoint = self.rebase(&advertised)?;
        debug!(%advertised, %endpoint, "resolved token endpoint via OIDC discovery");
        Ok(endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategy(url: &str) -> EndpointStrategy {
        EndpointStrategy::for_url(&Url::parse(url).unwrap())
    }

    #[test]
    fn token_urls_are_direct() {
        assert_eq!(
            strategy("http://localhost:8543/realms/wanaku/protocol/openid-connect/token"),
            EndpointStrategy::Direct
        );
        assert_eq!(strategy("https://auth.example.com/oauth/token/"), EndpointStrategy::Direct);
    }

    #[test]
    fn realm_urls_are_discovered() {
        assert_eq!(
            strategy("http://localhost:8543/realms/wanaku"),
            EndpointStrategy::Discovered
        );
        assert_eq!(strategy("http://localhost:8543"), EndpointStrategy::Discovered);
    }

    #[test]
    fn metadata_url_handles_trailing_slash() {
        let discovered = DiscoveredEndpoint::new(Url::parse("http://kc:8080/realms/wanaku/").unwrap());
        assert_eq!(
            discovered.metadata_url().unwrap().as_str(),
            "http://kc:8080/realms/wanaku/.well-known/openid-configuration"
        );
    }

    #[test]
    fn rebase_keeps_path_and_swaps_origin() {
        let discovered =
            DiscoveredEndpoint::new(Url::parse("http://127.0.0.1:8543/realms/wanaku").unwrap());
        let rebased = discovered
            .rebase("https://keycloak.internal/realms/wanaku/protocol/openid-connect/token")
            .unwrap();
        assert_eq!(
            rebased.as_str(),
            "http://127.0.0.1:8543/realms/wanaku/protocol/openid-connect/token"
        );
    }

    #[test]
    fn rejects_unparseable_configuration() {
        assert!(matches!(
            resolver_for("not a url"),
            Err(WanakuError::InvalidArgument(_))
        ));
    }
}
