use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use tracing::debug;
use wanaku_core::{JsonCodec, Serializer, ServiceState, ServiceTarget, WanakuError, WanakuResult};

use crate::auth::TokenSource;
use crate::config::DiscoveryConfig;

pub const DISCOVERY_BASE_PATH: &str = "/api/v1/management/discovery";

/// Raw outcome of a registry call; decoding the body is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryReply {
    pub status: u16,
    pub body: String,
}

impl RegistryReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Operations exposed by the discovery API.
#[async_trait]
pub trait RegistryTransport: Send + Sync {
    async fn register(&self, target: &ServiceTarget) -> WanakuResult<RegistryReply>;
    async fn deregister(&self, target: &ServiceTarget) -> WanakuResult<RegistryReply>;
    async fn ping(&self, id: &str) -> WanakuResult<RegistryReply>;
    async fn update_state(&self, id: &str, state: &ServiceState) -> WanakuResult<RegistryReply>;
}

pub struct HttpRegistryTransport<S = JsonCodec> {
    client: Client,
    base_url: String,
    timeout: Duration,
    tokens: Arc<TokenSource>,
    serializer: S,
}

impl HttpRegistryTransport<JsonCodec> {
    pub fn new(client: Client, config: &DiscoveryConfig, tokens: Arc<TokenSource>) -> Self {
        Self::with_serializer(client, config, tokens, JsonCodec)
    }
}

impl<S: Serializer> HttpRegistryTransport<S> {
    pub fn with_serializer(
        client: Client,
        config: &DiscoveryConfig,
        tokens: Arc<TokenSource>,
        serializer: S,
    ) -> Self {
        Self {
            client,
            base_url: config.registry_uri.trim_end_matches('/').to_string(),
            timeout: config.request_timeout,
            tokens,
            serializer,
        }
    }

    pub fn endpoint(&self, operation: &str) -> String {
        format!("{}{DISCOVERY_BASE_PATH}/{operation}", self.base_url)
    }

    async fn post(&self, url: String, content_type: &str, body: String) -> WanakuResult<RegistryReply> {
        let authorization = self.tokens.header_value().await?;

        let res = self
            .client
            .post(&url)
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, content_type)
            .timeout(self.timeout)
            .body(body)
            .send()
            .await
            .map_err(|e| WanakuError::TransportFailure(format!("POST {url}: {e}")))?;

        let status = res.status().as_u16();
        let body = res
            .text()
            .await
            .map_err(|e| WanakuError::TransportFailure(format!("reading reply from {url}: {e}")))?;

        debug!(%url, status, "registry call completed");
        Ok(RegistryReply { status, body })
    }

    async fn post_json<T: serde::Serialize + Sync>(
        &self,
        url: String,
        payload: &T,
    ) -> WanakuResult<RegistryReply> {
        let body = self.serializer.serialize(payload)?;
        self.post(url, "application/json", body).await
    }
}

#[async_trait]
impl<S: Serializer + 'static> RegistryTransport for HttpRegistryTransport<S> {
    async fn register(&self, target: &ServiceTarget) -> WanakuResult<RegistryReply> {
        self.post_json(self.endpoint("register"), target).await
    }

    async fn deregister(&self, target: &ServiceTarget) -> WanakuResult<RegistryReply> {
        self.post_json(self.endpoint("deregister"), target).await
    }

    async fn ping(&self, id: &str) -> WanakuResult<RegistryReply> {
        self.post(self.endpoint("ping/"), "text/plain", id.to_string())
            .await
    }

    async fn update_state(&self, id: &str, state: &ServiceState) -> WanakuResult<RegistryReply> {
        self.post_json(self.endpoint(&format!("update/{id}")), state)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_is_any_2xx() {
        assert!(RegistryReply::new(200, "").is_success());
        assert!(RegistryReply::new(204, "").is_success());
        assert!(!RegistryReply::new(199, "").is_success());
        assert!(!RegistryReply::new(409, "").is_success());
        assert!(!RegistryReply::new(503, "").is_success());
    }
}
