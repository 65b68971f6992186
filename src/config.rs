//! Runtime settings read from the environment (after `.env` is loaded).

use crate::error::{Error, Result};
use std::net::SocketAddr;
use std::time::Duration;

/// Default ARM endpoint for the public cloud.
pub const DEFAULT_ARM_ENDPOINT: &str = "https://management.azure.com";
/// Default AAD authority host for the public cloud.
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
/// Default sleep between polls of a long-running ARM operation.
pub const POLL_INTERVAL_MSEC: u64 = 2000;
/// Give up on a long-running ARM operation after this long.
pub const OPERATION_TIMEOUT_SECS: u64 = 1800;

/// Identity the service uses to call ARM.
#[derive(Debug, Clone)]
pub struct AzureSettings {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub subscription_id: String,
    pub arm_endpoint: String,
    pub authority_host: String,
    pub poll_interval: Duration,
    pub operation_timeout: Duration,
}

/// How incoming bearer tokens are checked.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub tenant_id: String,
    /// Application (client) id of the API registration; tokens must be issued for it.
    pub app_client_id: String,
    pub authority_host: String,
    pub allow_guest_users: bool,
    pub required_scopes: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_address: SocketAddr,
    pub cors_allowed_origins: Vec<String>,
    pub azure: AzureSettings,
    pub auth: AuthSettings,
}

impl Settings {
    /// Build settings from the process environment.
    pub fn from_env() -> Result<Settings> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup, so tests need not touch
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Settings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| Error::Config(format!("missing environment variable {key}")))
        };

        let tenant_id = required("AZURE_TENANT_ID")?;
        let authority_host = get("AZURE_AUTHORITY_HOST")
            .unwrap_or_else(|| DEFAULT_AUTHORITY_HOST.to_string())
            .trim_end_matches('/')
            .to_string();

        // Older deployments carry the misspelled variable name.
        let subscription_id = get("AZURE_SUBSCRIPTION_ID")
            .or_else(|| get("AZURE_SUBSCRITION_ID"))
            .ok_or_else(|| {
                Error::Config("missing environment variable AZURE_SUBSCRIPTION_ID".to_string())
            })?;

        let bind_address = get("BIND_ADDRESS")
            .unwrap_or_else(|| "0.0.0.0:8000".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| Error::Config(format!("BIND_ADDRESS: {e}")))?;

        let cors_allowed_origins = split_list(
            &get("CORS_ALLOWED_ORIGINS").unwrap_or_else(|| "http://localhost:8000".to_string()),
            ',',
        );

        let poll_ms = parse_or(get("ARM_POLL_INTERVAL_MS"), "ARM_POLL_INTERVAL_MS", POLL_INTERVAL_MSEC)?;
        let timeout_secs = parse_or(
            get("ARM_OPERATION_TIMEOUT_SECS"),
            "ARM_OPERATION_TIMEOUT_SECS",
            OPERATION_TIMEOUT_SECS,
        )?;
        let allow_guest_users = parse_or(get("AZURE_ALLOW_GUEST_USERS"), "AZURE_ALLOW_GUEST_USERS", true)?;

        Ok(Settings {
            bind_address,
            cors_allowed_origins,
            azure: AzureSettings {
                tenant_id: tenant_id.clone(),
                client_id: required("AZURE_BACKEND_APP_CLIENT_ID")?,
                client_secret: required("AZURE_BACKEND_APP_SECRET")?,
                subscription_id,
                arm_endpoint: get("AZURE_ARM_ENDPOINT")
                    .unwrap_or_else(|| DEFAULT_ARM_ENDPOINT.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                authority_host: authority_host.clone(),
                poll_interval: Duration::from_millis(poll_ms),
                operation_timeout: Duration::from_secs(timeout_secs),
            },
            auth: AuthSettings {
                tenant_id,
                app_client_id: required("AZURE_FRONTEND_APP_CLIENT_ID")?,
                authority_host,
                allow_guest_users,
                required_scopes: split_list(&get("AZURE_REQUIRED_SCOPES").unwrap_or_default(), ' '),
            },
        })
    }
}

fn split_list(input: &str, sep: char) -> Vec<String> {
    input
        .split(sep)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(v) => v
            .trim()
            .parse::<T>()
            .map_err(|e| Error::Config(format!("{key}={v}: {e}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("AZURE_TENANT_ID", "11111111-1111-1111-1111-111111111111"),
            ("AZURE_BACKEND_APP_CLIENT_ID", "backend-client"),
            ("AZURE_BACKEND_APP_SECRET", "s3cret"),
            ("AZURE_SUBSCRIPTION_ID", "sub-0001"),
            ("AZURE_FRONTEND_APP_CLIENT_ID", "api-client"),
        ])
    }

    fn settings(env: &HashMap<&str, &str>) -> Result<Settings> {
        Settings::from_lookup(|k| env.get(k).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults() {
        let s = settings(&base_env()).expect("settings");
        assert_eq!(s.bind_address.port(), 8000);
        assert_eq!(s.cors_allowed_origins, vec!["http://localhost:8000"]);
        assert_eq!(s.azure.arm_endpoint, DEFAULT_ARM_ENDPOINT);
        assert_eq!(s.azure.poll_interval, Duration::from_millis(POLL_INTERVAL_MSEC));
        assert!(s.auth.allow_guest_users);
        assert!(s.auth.required_scopes.is_empty());
        assert_eq!(s.auth.app_client_id, "api-client");
    }

    #[test]
    fn test_misspelled_subscription_fallback() {
        let mut env = base_env();
        env.remove("AZURE_SUBSCRIPTION_ID");
        env.insert("AZURE_SUBSCRITION_ID", "legacy-sub");
        let s = settings(&env).expect("settings");
        assert_eq!(s.azure.subscription_id, "legacy-sub");
    }

    #[test]
    fn test_missing_required_names_variable() {
        let mut env = base_env();
        env.remove("AZURE_BACKEND_APP_SECRET");
        let err = settings(&env).unwrap_err();
        assert!(err.to_string().contains("AZURE_BACKEND_APP_SECRET"), "{err}");
    }

    #[test]
    fn test_overrides() {
        let mut env = base_env();
        env.insert("BIND_ADDRESS", "127.0.0.1:9090");
        env.insert("CORS_ALLOWED_ORIGINS", "http://a.test, http://b.test");
        env.insert("AZURE_ARM_ENDPOINT", "http://localhost:1234/");
        env.insert("AZURE_ALLOW_GUEST_USERS", "false");
        env.insert("AZURE_REQUIRED_SCOPES", "user_impersonation  extra");
        env.insert("ARM_POLL_INTERVAL_MS", "10");
        let s = settings(&env).expect("settings");
        assert_eq!(s.bind_address.port(), 9090);
        assert_eq!(s.cors_allowed_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(s.azure.arm_endpoint, "http://localhost:1234");
        assert!(!s.auth.allow_guest_users);
        assert_eq!(s.auth.required_scopes, vec!["user_impersonation", "extra"]);
        assert_eq!(s.azure.poll_interval, Duration::from_millis(10));
    }

    #[test]
    fn test_bad_number_is_config_error() {
        let mut env = base_env();
        env.insert("ARM_OPERATION_TIMEOUT_SECS", "soon");
        assert!(matches!(settings(&env), Err(Error::Config(_))));
    }
}
