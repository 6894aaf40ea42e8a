//! Bearer-token acquisition for the inference service.
//!
//! Tokens come from the environment: either a pre-issued access token or a
//! service principal (client-credentials flow) whose tokens are cached and
//! refreshed shortly before they expire.

use crate::agent::TransportError;
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";
pub const AI_SCOPE: &str = "https://ai.azure.com/.default";
/// Refresh this many seconds before the token actually expires.
const EXPIRY_SKEW_SECS: i64 = 60;

#[derive(Clone)]
pub struct CachedToken {
    access_token: String,
    expires_at: i64,
}

/// Source of bearer tokens.
#[derive(Clone)]
pub enum Credential {
    /// Token supplied directly (e.g. from `az account get-access-token`).
    Static(String),
    /// Service principal using the OAuth2 client-credentials grant.
    ClientSecret {
        authority: String,
        tenant_id: String,
        client_id: String,
        client_secret: String,
        token_cache: Arc<Mutex<Option<CachedToken>>>,
    },
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::Static(_) => f.write_str("Credential::Static(..)"),
            Credential::ClientSecret {
                tenant_id, client_id, ..
            } => f
                .debug_struct("Credential::ClientSecret")
                .field("tenant_id", tenant_id)
                .field("client_id", client_id)
                .finish_non_exhaustive(),
        }
    }
}

impl Credential {
    /// Resolve a credential from the environment. `None` if nothing is configured.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get("AZURE_AI_ACCESS_TOKEN") {
            debug!("Using access token from AZURE_AI_ACCESS_TOKEN");
            return Some(Credential::Static(token.trim().to_string()));
        }

        let tenant_id = get("AZURE_TENANT_ID")?;
        let client_id = get("AZURE_CLIENT_ID")?;
        let client_secret = get("AZURE_CLIENT_SECRET")?;
        let authority = get("AZURE_AUTHORITY_HOST")
            .unwrap_or_else(|| DEFAULT_AUTHORITY.to_string())
            .trim_end_matches('/')
            .to_string();

        debug!("Using service principal {} in tenant {}", client_id, tenant_id);
        Some(Credential::ClientSecret {
            authority,
            tenant_id,
            client_id,
            client_secret,
            token_cache: Arc::new(Mutex::new(None)),
        })
    }

    /// Get a valid bearer token, exchanging credentials if the cache is stale.
    pub async fn access_token(&self, client: &reqwest::Client) -> Result<String, TransportError> {
        let (authority, tenant_id, client_id, client_secret, token_cache) = match self {
            Credential::Static(token) => return Ok(token.clone()),
            Credential::ClientSecret {
                authority,
                tenant_id,
                client_id,
                client_secret,
                token_cache,
            } => (authority, tenant_id, client_id, client_secret, token_cache),
        };

        if let Some(token) = cached(token_cache, now_secs()) {
            return Ok(token);
        }

        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
            expires_in: i64,
        }

        let url = format!("{}/{}/oauth2/v2.0/token", authority, tenant_id);
        let now = now_secs();
        let resp = client
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id.as_str()),
                ("client_secret", client_secret.as_str()),
                ("scope", AI_SCOPE),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Credential(format!(
                "token exchange failed ({}): {}",
                status, body
            )));
        }

        let resp: TokenResponse = resp.json().await?;
        info!("Acquired access token (expires in {}s)", resp.expires_in);

        let token = resp.access_token.clone();
        if let Ok(mut cache) = token_cache.lock() {
            *cache = Some(CachedToken {
                access_token: resp.access_token,
                expires_at: now + resp.expires_in,
            });
        }
        Ok(token)
    }
}

fn cached(cache: &Mutex<Option<CachedToken>>, now: i64) -> Option<String> {
    let cache = cache.lock().ok()?;
    cache
        .as_ref()
        .filter(|c| now < c.expires_at - EXPIRY_SKEW_SECS)
        .map(|c| c.access_token.clone())
}

fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}
