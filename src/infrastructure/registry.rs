//! Container registry queries
//!
//! Implements the distribution-v2 challenge/response flow used to ask a
//! registry whether a tag already exists, without pulling anything:
//!
//! 1. Unauthenticated GET of `/v2/{name}/manifests/{tag}`.
//! 2. On 401, parse the `Www-Authenticate` bearer challenge, exchange
//!    it (plus docker credentials) for a token at the challenge realm,
//!    and retry the GET once with `Authorization: Bearer <token>`.
//!
//! 404 means the tag is free, 200 means it is taken. Tokens are scoped
//! to one check and never cached - the next check re-authenticates.
//!
//! HTTP goes through the [`HttpTransport`] seam so the whole exchange
//! can be scripted in tests without a network.

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::config::Manifest;
use crate::error::{FoundryError, RegistryError};
use crate::infrastructure::credentials::{CredentialResolver, RegistryCredentials};
use crate::process::{CommandRunner, SystemRunner};

/// How much of an unexpected response body is kept for error display
const MAX_BODY_DISPLAY: usize = 512;

/// Minimal view of an HTTP response, enough for the v2 handshake
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    /// All `Www-Authenticate` header values, in arrival order
    pub challenges: Vec<String>,
    pub body: Vec<u8>,
}

/// Narrow seam over the HTTP client: GET with extra headers
#[async_trait]
pub trait HttpTransport {
    async fn get(
        &self,
        url: &str,
        headers: &[(&str, String)],
    ) -> Result<HttpResponse, RegistryError>;
}

/// Production transport backed by reqwest (rustls)
#[derive(Debug, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        headers: &[(&str, String)],
    ) -> Result<HttpResponse, RegistryError> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, value.as_str());
        }

        let response = request.send().await.map_err(|e| RegistryError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status().as_u16();
        let challenges = response
            .headers()
            .get_all(reqwest::header::WWW_AUTHENTICATE)
            .iter()
            .filter_map(|v| v.to_str().ok().map(String::from))
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| RegistryError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?
            .to_vec();

        Ok(HttpResponse {
            status,
            challenges,
            body,
        })
    }
}

/// Token endpoint response shape
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default, alias = "access_token")]
    token: String,
    #[serde(default)]
    expires_in: u64,
    #[serde(default)]
    issued_at: String,
}

/// Client answering "does this tag already exist?" against a registry
pub struct RegistryClient<T: HttpTransport = ReqwestTransport, R: CommandRunner = SystemRunner> {
    transport: T,
    resolver: CredentialResolver<R>,
}

impl Default for RegistryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryClient {
    /// Client over the real network and the user's docker config
    pub fn new() -> Self {
        Self {
            transport: ReqwestTransport::default(),
            resolver: CredentialResolver::new(),
        }
    }
}

impl<T: HttpTransport, R: CommandRunner> RegistryClient<T, R> {
    /// Client with injected transport and resolver (used in tests)
    pub fn with_parts(transport: T, resolver: CredentialResolver<R>) -> Self {
        Self {
            transport,
            resolver,
        }
    }

    /// Check whether the manifest's primary tag is already published
    ///
    /// Performs the unauthenticated probe and, on a 401 challenge,
    /// exactly one authenticated retry.
    pub async fn tag_exists(&self, manifest: &Manifest) -> Result<bool, FoundryError> {
        let url = format!(
            "https://{}/v2/{}/manifests/{}",
            manifest.registry, manifest.name, manifest.tag
        );
        debug!("probing {}", url);

        let probe = self.transport.get(&url, &[]).await?;

        let response = if probe.status == 401 {
            info!("{} requires authentication", manifest.registry);
            let credentials = self.resolver.resolve(&manifest.registry)?;
            let params = parse_bearer(&probe.challenges);
            let token = self.exchange_token(&params, &credentials).await?;
            self.transport
                .get(&url, &[("Authorization", format!("Bearer {}", token))])
                .await?
        } else {
            probe
        };

        match response.status {
            404 => Ok(false),
            200 => Ok(true),
            status => Err(RegistryError::QueryFailed {
                url,
                status,
                body: truncate_body(&response.body),
            }
            .into()),
        }
    }

    /// Exchange a parsed bearer challenge for a token
    ///
    /// GET on the challenge realm with basic auth; every non-realm
    /// challenge parameter is forwarded as a query parameter.
    async fn exchange_token(
        &self,
        params: &HashMap<String, String>,
        credentials: &RegistryCredentials,
    ) -> Result<String, RegistryError> {
        let realm = params.get("realm").ok_or(RegistryError::MissingRealm)?;

        let url = reqwest::Url::parse_with_params(
            realm,
            params.iter().filter(|(key, _)| key.as_str() != "realm"),
        )
        .map_err(|e| RegistryError::InvalidRealm {
            realm: realm.clone(),
            message: e.to_string(),
        })?;

        let basic = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", credentials.username, credentials.secret));
        let response = self
            .transport
            .get(url.as_str(), &[("Authorization", format!("Basic {}", basic))])
            .await?;

        if response.status != 200 {
            return Err(RegistryError::AuthenticationFailed {
                realm: realm.clone(),
                status: response.status,
            });
        }

        let token: TokenResponse = serde_json::from_slice(&response.body).map_err(|e| {
            RegistryError::AuthResponseInvalid {
                realm: realm.clone(),
                message: e.to_string(),
            }
        })?;

        // Expiry is decoded but deliberately unused: tokens are scoped
        // to a single check, so there is nothing to cache.
        debug!(
            "obtained token from {} (expires_in: {}s, issued_at: {})",
            realm, token.expires_in, token.issued_at
        );

        Ok(token.token)
    }
}

/// Parse one or more `Www-Authenticate` bearer challenge values
///
/// Input shape: `Bearer realm="https://...",service="...",scope="..."`.
/// Later occurrences of a key overwrite earlier ones, matching the
/// header-merging behavior registries rely on.
pub fn parse_bearer(challenges: &[String]) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for challenge in challenges {
        let challenge = challenge.trim();
        let challenge = challenge.strip_prefix("Bearer").unwrap_or(challenge).trim();
        for pair in challenge.split(',') {
            if let Some((key, value)) = pair.split_once('=') {
                params.insert(
                    key.trim().to_string(),
                    value.trim().trim_matches('"').to_string(),
                );
            }
        }
    }
    params
}

fn truncate_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.chars().count() > MAX_BODY_DISPLAY {
        let truncated: String = text.chars().take(MAX_BODY_DISPLAY).collect();
        format!("{}...", truncated)
    } else {
        text.to_string()
    }
}
