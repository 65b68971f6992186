//! Shared state handed to every handler.

use std::sync::Arc;

use super::auth::AadTokenValidator;
use crate::azure::{ArmClient, ClientSecretTokenProvider, NetworkService};
use crate::config::Settings;
use crate::error::{Error, Result};

pub struct AppState {
    pub network: NetworkService,
    pub auth: AadTokenValidator,
}

impl AppState {
    pub fn new(network: NetworkService, auth: AadTokenValidator) -> Self {
        Self { network, auth }
    }

    /// Wire the ARM client and token validator from settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let azure = &settings.azure;
        let tokens = Arc::new(ClientSecretTokenProvider::new(azure)?);
        let arm = ArmClient::new(
            &azure.arm_endpoint,
            tokens,
            azure.poll_interval,
            azure.operation_timeout,
        )?;
        let network = NetworkService::new(arm, azure.subscription_id.clone());
        let auth = AadTokenValidator::new(settings.auth.clone())
            .map_err(|e| Error::Config(e.to_string()))?;
        Ok(Self::new(network, auth))
    }
}
