//! Azure AD bearer token validation for the API.
//!
//! Tokens are RS256 JWTs issued by the configured tenant for the API's
//! application registration. Signing keys come from the tenant's OpenID
//! metadata and are cached.

use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use super::error::ApiError;
use super::state::AppState;
use crate::config::AuthSettings;

/// Signing keys are re-read after this many hours.
const KEY_CACHE_HOURS: i64 = 24;
/// An unknown `kid` forces a refresh at most this often.
const FORCED_REFRESH_MINUTES: i64 = 5;
/// Clock skew tolerated on `exp` and `nbf`.
const LEEWAY_SECS: u64 = 60;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Unable to fetch signing keys: {0}")]
    KeysUnavailable(String),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken | AuthError::InvalidToken(_) => {
                ApiError::Unauthorized(err.to_string())
            }
            AuthError::Forbidden(msg) => ApiError::Forbidden(msg),
            AuthError::KeysUnavailable(_) => ApiError::ServiceUnavailable(err.to_string()),
        }
    }
}

/// Claims of an AAD access token that the API looks at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AadClaims {
    pub iss: String,
    pub exp: i64,
    #[serde(default)]
    pub sub: Option<String>,
    /// Object id of the caller.
    #[serde(default)]
    pub oid: Option<String>,
    #[serde(default)]
    pub tid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub upn: Option<String>,
    /// Space separated delegated scopes.
    #[serde(default)]
    pub scp: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    /// Account type; 1 marks a guest.
    #[serde(default)]
    pub acct: Option<u8>,
}

impl AadClaims {
    pub fn scopes(&self) -> Vec<&str> {
        self.scp
            .as_deref()
            .map(|s| s.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn is_guest(&self) -> bool {
        self.acct == Some(1)
    }

    /// Best human-readable identity for logs.
    pub fn display_name(&self) -> &str {
        self.preferred_username
            .as_deref()
            .or(self.upn.as_deref())
            .or(self.name.as_deref())
            .or(self.oid.as_deref())
            .or(self.sub.as_deref())
            .unwrap_or("unknown")
    }
}

#[derive(Debug, Deserialize)]
struct OpenIdConfiguration {
    issuer: String,
    jwks_uri: String,
}

struct KeyCache {
    keys: HashMap<String, DecodingKey>,
    issuer: String,
    fetched_at: DateTime<Utc>,
}

impl KeyCache {
    fn is_stale(&self, now: DateTime<Utc>) -> bool {
        now - self.fetched_at > Duration::hours(KEY_CACHE_HOURS)
    }
}

/// Validates AAD access tokens for a single tenant.
pub struct AadTokenValidator {
    http: reqwest::Client,
    settings: AuthSettings,
    cache: RwLock<Option<KeyCache>>,
    last_forced_refresh: RwLock<Option<DateTime<Utc>>>,
}

impl AadTokenValidator {
    pub fn new(settings: AuthSettings) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| AuthError::KeysUnavailable(e.to_string()))?;
        Ok(AadTokenValidator {
            http,
            settings,
            cache: RwLock::new(None),
            last_forced_refresh: RwLock::new(None),
        })
    }

    /// `{authority}/{tenant}/v2.0/.well-known/openid-configuration`
    pub fn metadata_url(&self) -> String {
        format!(
            "{}/{}/v2.0/.well-known/openid-configuration",
            self.settings.authority_host.trim_end_matches('/'),
            self.settings.tenant_id
        )
    }

    /// Audiences a token may carry: the bare client id (v2 tokens) or the
    /// application id URI (v1 tokens).
    pub fn audiences(&self) -> Vec<String> {
        vec![
            self.settings.app_client_id.clone(),
            format!("api://{}", self.settings.app_client_id),
        ]
    }

    /// Check signature, lifetime, audience, issuer, guest status and scopes.
    pub async fn validate(&self, token: &str) -> Result<AadClaims, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        if header.alg != Algorithm::RS256 {
            return Err(AuthError::InvalidToken(format!(
                "unsupported algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| AuthError::InvalidToken("token has no key id".to_string()))?;

        let (key, issuer) = self.signing_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = LEEWAY_SECS;
        validation.validate_nbf = true;
        let audiences = self.audiences();
        validation.set_audience(audiences.as_slice());
        let v1_issuer = format!("https://sts.windows.net/{}/", self.settings.tenant_id);
        validation.set_issuer(&[issuer.as_str(), v1_issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "aud", "iss"]);

        let claims = decode::<AadClaims>(token, &key, &validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?
            .claims;

        if claims.is_guest() && !self.settings.allow_guest_users {
            return Err(AuthError::Forbidden("Guest users not allowed".to_string()));
        }

        let granted = claims.scopes();
        for scope in &self.settings.required_scopes {
            if !granted.contains(&scope.as_str()) {
                return Err(AuthError::Forbidden(format!(
                    "Required scope missing: {scope}"
                )));
            }
        }

        Ok(claims)
    }

    /// Decoding key for `kid` plus the expected issuer, refreshing the
    /// cache when stale or when the key is unknown.
    async fn signing_key(&self, kid: &str) -> Result<(DecodingKey, String), AuthError> {
        let now = Utc::now();
        if let Some(cache) = self.cache.read().await.as_ref() {
            if !cache.is_stale(now) {
                if let Some(key) = cache.keys.get(kid) {
                    return Ok((key.clone(), cache.issuer.clone()));
                }
            }
        }

        let mut slot = self.cache.write().await;
        let must_refresh = match slot.as_ref() {
            None => true,
            Some(cache) if cache.is_stale(now) => true,
            Some(cache) if cache.keys.contains_key(kid) => false,
            Some(_) => self.may_force_refresh(now).await,
        };
        if must_refresh {
            *slot = Some(self.fetch_keys().await?);
        }

        let cache = slot
            .as_ref()
            .ok_or_else(|| AuthError::KeysUnavailable("no signing keys loaded".to_string()))?;
        cache
            .keys
            .get(kid)
            .map(|key| (key.clone(), cache.issuer.clone()))
            .ok_or_else(|| AuthError::InvalidToken(format!("unknown signing key {kid}")))
    }

    async fn may_force_refresh(&self, now: DateTime<Utc>) -> bool {
        let mut last = self.last_forced_refresh.write().await;
        match *last {
            Some(at) if now - at < Duration::minutes(FORCED_REFRESH_MINUTES) => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }

    async fn fetch_keys(&self) -> Result<KeyCache, AuthError> {
        let metadata_url = self.metadata_url();
        log::info!("Loading OpenID configuration from {metadata_url}");
        let metadata: OpenIdConfiguration = self.fetch_json(&metadata_url).await?;
        let jwks: JwkSet = self.fetch_json(&metadata.jwks_uri).await?;

        let mut keys = HashMap::new();
        for jwk in &jwks.keys {
            let Some(kid) = jwk.common.key_id.clone() else {
                continue;
            };
            match DecodingKey::from_jwk(jwk) {
                Ok(key) => {
                    keys.insert(kid, key);
                }
                Err(e) => log::warn!("Skipping signing key {kid}: {e}"),
            }
        }
        log::info!("Loaded {} signing key(s), issuer {}", keys.len(), metadata.issuer);

        Ok(KeyCache {
            keys,
            issuer: metadata.issuer,
            fetched_at: Utc::now(),
        })
    }

    async fn fetch_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, AuthError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                log::error!("GET {url} failed: {e}");
                AuthError::KeysUnavailable(e.to_string())
            })?;
        response
            .json::<T>()
            .await
            .map_err(|e| AuthError::KeysUnavailable(format!("{url}: {e}")))
    }
}

/// Authenticated caller extractor for Axum.
///
/// Add it as a handler argument to require a valid AAD token.
pub struct AuthenticatedUser {
    pub claims: AadClaims,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);
        let token = extract_bearer_token(&parts.headers)?;

        let claims = app_state.auth.validate(token).await.map_err(|e| {
            log::warn!("Rejected request to {}: {e}", parts.uri.path());
            ApiError::from(e)
        })?;

        Ok(AuthenticatedUser { claims })
    }
}

/// Extract the bearer token from the Authorization header.
fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get("Authorization")
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken("invalid Authorization header".to_string()))?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("Bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(AuthError::InvalidToken(
            "Authorization header must be Bearer token".to_string(),
        )),
    }
}
