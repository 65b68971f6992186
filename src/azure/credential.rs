//! Access tokens for Azure Resource Manager.
//!
//! The service authenticates to ARM as its own AAD application (client
//! credentials). Tokens are cached until shortly before they expire.

use crate::config::AzureSettings;
use crate::error::{Error, Result};
use async_trait::async_trait;
use azure_core::auth::TokenCredential;
use azure_identity::{ClientSecretCredential, TokenCredentialOptions};
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use url::Url;

/// Refresh a cached token this long before it expires.
const EXPIRY_MARGIN_SECS: i64 = 300;

/// Source of bearer tokens for ARM requests.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn bearer_token(&self) -> Result<String>;
}

struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

/// Client-credentials flow through `azure_identity`.
pub struct ClientSecretTokenProvider {
    credential: ClientSecretCredential,
    scope: String,
    cached: RwLock<Option<CachedToken>>,
}

impl ClientSecretTokenProvider {
    pub fn new(settings: &AzureSettings) -> Result<Self> {
        let authority_host = Url::parse(&settings.authority_host)?;
        let credential = ClientSecretCredential::new(
            azure_core::new_http_client(),
            settings.tenant_id.clone(),
            settings.client_id.clone(),
            settings.client_secret.clone(),
            TokenCredentialOptions::new(authority_host),
        );
        Ok(ClientSecretTokenProvider {
            credential,
            scope: arm_scope(&settings.arm_endpoint),
            cached: RwLock::new(None),
        })
    }
}

#[async_trait]
impl TokenProvider for ClientSecretTokenProvider {
    async fn bearer_token(&self) -> Result<String> {
        if let Some(cached) = self.cached.read().await.as_ref() {
            if cached.is_fresh(Utc::now()) {
                return Ok(cached.token.clone());
            }
        }

        let mut slot = self.cached.write().await;
        // Another request may have refreshed while we waited for the lock.
        if let Some(cached) = slot.as_ref() {
            if cached.is_fresh(Utc::now()) {
                return Ok(cached.token.clone());
            }
        }

        log::debug!("Requesting ARM access token for scope {}", self.scope);
        let access = self
            .credential
            .get_token(&[self.scope.as_str()])
            .await
            .map_err(|e| {
                log::error!("Failed to acquire ARM token: {e}");
                Error::Credential(e.to_string())
            })?;

        let expires_at = DateTime::from_timestamp(access.expires_on.unix_timestamp(), 0)
            .unwrap_or_else(Utc::now);
        let token = access.token.secret().to_string();
        log::info!("Acquired ARM access token, expires {expires_at}");
        *slot = Some(CachedToken {
            token: token.clone(),
            expires_at,
        });
        Ok(token)
    }
}

/// Fixed token, for tests and local emulators.
pub struct StaticTokenProvider(pub String);

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn bearer_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// `.default` scope of the ARM audience, e.g. `https://management.azure.com/.default`.
pub fn arm_scope(arm_endpoint: &str) -> String {
    format!("{}/.default", arm_endpoint.trim_end_matches('/'))
}
