use std::fmt;
use std::sync::Arc;

use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;
use wanaku_core::{Clock, SystemClock, WanakuError, WanakuResult};

use super::endpoint;
use crate::config::AuthConfig;

/// Tokens are renewed this many seconds before they actually expire.
pub const RENEWAL_MARGIN_SECS: u64 = 30;

/// Lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_LIFETIME_SECS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessTokenState {
    pub token: String,
    pub lifetime_secs: u64,
    pub issued_at_millis: u64,
    pub refresh_token: Option<String>,
}

impl AccessTokenState {
    pub fn needs_renewal(&self, now_millis: u64) -> bool {
        let elapsed = now_millis.saturating_sub(self.issued_at_millis);
        let usable = self.lifetime_secs.saturating_sub(RENEWAL_MARGIN_SECS) * 1000;
        elapsed >= usable
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
    refresh_token: Option<String>,
}

#[derive(Clone, Copy)]
enum Grant<'a> {
    ClientCredentials,
    RefreshToken(&'a str),
}

impl Grant<'_> {
    fn name(&self) -> &'static str {
        match self {
            Grant::ClientCredentials => "client_credentials",
            Grant::RefreshToken(_) => "refresh_token",
        }
    }
}

/// Talks to the OAuth2 token endpoint using HTTP Basic client authentication.
struct TokenEndpoint {
    client: Client,
    url: Url,
    client_id: String,
    client_secret: String,
    scope: Option<String>,
}

impl TokenEndpoint {
    async fn exchange(&self, grant: Grant<'_>, now_millis: u64) -> WanakuResult<AccessTokenState> {
        let mut form = vec![("grant_type", grant.name())];
        if let Grant::RefreshToken(refresh_token) = grant {
            form.push(("refresh_token", refresh_token));
        }
        if let Some(scope) = self.scope.as_deref() {
            form.push(("scope", scope));
        }

        let res = self
            .client
            .post(self.url.clone())
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                WanakuError::AuthenticationFailure(format!("token request to {} failed: {e}", self.url))
            })?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(WanakuError::AuthenticationFailure(format!(
                "{} grant rejected with {status}: {body}",
                grant.name()
            )));
        }

        let body: TokenResponse = res.json().await.map_err(|e| {
            WanakuError::AuthenticationFailure(format!("malformed token response: {e}"))
        })?;

        Ok(AccessTokenState {
            token: body.access_token,
            lifetime_secs: body.expires_in.unwrap_or(DEFAULT_LIFETIME_SECS),
            issued_at_millis: now_millis,
            refresh_token: body.refresh_token,
        })
    }
}

/// Keeps a bearer token valid for outbound registry calls.
pub struct TokenSource {
    endpoint: TokenEndpoint,
    clock: Arc<dyn Clock>,
    state: Mutex<AccessTokenState>,
}

impl TokenSource {
    /// Resolves the token endpoint and performs the initial
    /// client-credentials grant. Any failure is returned to the caller.
    pub async fn connect(config: &AuthConfig, client: Client) -> WanakuResult<Self> {
        Self::connect_with_clock(config, client, Arc::new(SystemClock)).await
    }

    pub async fn connect_with_clock(
        config: &AuthConfig,
        client: Client,
        clock: Arc<dyn Clock>,
    ) -> WanakuResult<Self> {
        let resolver = endpoint::resolver_for(&config.token_endpoint)?;
        let url = resolver.resolve(&client).await?;

        let endpoint = TokenEndpoint {
            client,
            url,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            scope: config.scope.clone(),
        };
        let state = endpoint
            .exchange(Grant::ClientCredentials, clock.now_millis())
            .await?;

        info!(
            endpoint = %endpoint.url,
            lifetime_secs = state.lifetime_secs,
            "obtained access token"
        );

        Ok(Self {
            endpoint,
            clock,
            state: Mutex::new(state),
        })
    }

    pub fn token_endpoint(&self) -> &Url {
        &self.endpoint.url
    }

    /// `Bearer <token>`, renewing the token first when it is about to expire.
    pub async fn header_value(&self) -> WanakuResult<String> {
        let mut state = self.state.lock().await;
        if state.needs_renewal(self.clock.now_millis()) {
            let renewed = self.renew(&state).await?;
            *state = renewed;
        }
        Ok(format!("Bearer {}", state.token))
    }

    async fn renew(&self, current: &AccessTokenState) -> WanakuResult<AccessTokenState> {
        if let Some(refresh_token) = current.refresh_token.as_deref() {
            match self
                .endpoint
                .exchange(Grant::RefreshToken(refresh_token), self.clock.now_millis())
                .await
            {
                Ok(state) => {
                    debug!(lifetime_secs = state.lifetime_secs, "access token refreshed");
                    return Ok(state);
                }
                Err(e) => warn!(error = %e, "refresh grant failed, requesting a new token"),
            }
        }

        let state = self
            .endpoint
            .exchange(Grant::ClientCredentials, self.clock.now_millis())
            .await?;
        debug!(lifetime_secs = state.lifetime_secs, "access token renewed");
        Ok(state)
    }
}

impl fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSource")
            .field("endpoint", &self.endpoint.url.as_str())
            .field("client_id", &self.endpoint.client_id)
            .finish_non_exhaustive()
    }
}
