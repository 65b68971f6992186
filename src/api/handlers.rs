//! HTTP handlers. Each one validates its input, makes the ARM calls
//! through [`NetworkService`](crate::azure::NetworkService) and maps the
//! outcome to a response.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use super::auth::AuthenticatedUser;
use super::error::{ApiError, ApiResult};
use super::extract::{ValidatedJson, ValidatedQuery};
use super::state::AppState;
use crate::azure::DeleteOutcome;
use crate::error::Error;
use crate::models::{
    HealthResponse, ListVnetsQuery, MessageResponse, SubnetDeleteRequest, VNetDeleteRequest,
    VNetRequest, VnetListResponse, VnetRecord, VnetSummary,
};

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

pub async fn root(user: AuthenticatedUser) -> Json<MessageResponse> {
    log::debug!("GET / by {}", user.claims.display_name());
    Json(MessageResponse::new(
        "Azure network provisioning API in Action!",
    ))
}

/// `POST /vnets`
pub async fn create_virtual_network(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    ValidatedJson(req): ValidatedJson<VNetRequest>,
) -> ApiResult<Json<VnetSummary>> {
    log::info!(
        "create_or_update_vnet rg={} vnet={} by {}",
        req.resource_group,
        req.vnet_name,
        user.claims.display_name()
    );
    let vnet = state
        .network
        .create_or_update_vnet(&req)
        .await
        .map_err(|e| ApiError::Internal(create_error_detail(&e)))?;
    Ok(Json(VnetSummary::from(&vnet)))
}

/// `GET /vnets?vnetName=&resourceGroup=`
pub async fn read_vnet_data(
    State(state): State<Arc<AppState>>,
    _user: AuthenticatedUser,
    ValidatedQuery(query): ValidatedQuery<ListVnetsQuery>,
) -> ApiResult<Json<VnetListResponse>> {
    let vnets = state
        .network
        .list_vnets(query.resource_group.as_deref(), query.vnet_name.as_deref())
        .await
        .map_err(|e| {
            log::error!("Failed to retrieve VNet data: {e}");
            ApiError::Internal("Internal server error".to_string())
        })?;

    if vnets.is_empty() {
        return Err(ApiError::NotFound("VNet not found".to_string()));
    }

    Ok(Json(VnetListResponse {
        data: vnets.iter().map(VnetRecord::from).collect(),
    }))
}

/// `DELETE /vnets/subnet`
pub async fn delete_vnet_subnet(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    ValidatedJson(req): ValidatedJson<SubnetDeleteRequest>,
) -> ApiResult<Json<MessageResponse>> {
    log::info!(
        "delete_subnet rg={} vnet={} subnet={} by {}",
        req.resource_group,
        req.vnet_name,
        req.subnet_name,
        user.claims.display_name()
    );
    let outcome = state
        .network
        .delete_subnet(&req.resource_group, &req.vnet_name, &req.subnet_name)
        .await
        .map_err(|e| {
            ApiError::Internal(delete_error_detail(&e, "subnet", &req.resource_group, &req.vnet_name))
        })?;

    let message = match outcome {
        DeleteOutcome::Deleted => format!(
            "Subnet '{}' has been successfully deleted from VNet '{}'.",
            req.subnet_name, req.vnet_name
        ),
        DeleteOutcome::NotPresent => format!(
            "Subnet '{}' does not exist in VNet '{}'.",
            req.subnet_name, req.vnet_name
        ),
    };
    Ok(Json(MessageResponse::new(message)))
}

/// `DELETE /vnets`
pub async fn delete_virtual_network(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    ValidatedJson(req): ValidatedJson<VNetDeleteRequest>,
) -> ApiResult<Json<MessageResponse>> {
    log::info!(
        "delete_vnet rg={} vnet={} by {}",
        req.resource_group,
        req.vnet_name,
        user.claims.display_name()
    );
    let outcome = state
        .network
        .delete_vnet(&req.resource_group, &req.vnet_name)
        .await
        .map_err(|e| {
            ApiError::Internal(delete_error_detail(&e, "VNet", &req.resource_group, &req.vnet_name))
        })?;

    let message = match outcome {
        DeleteOutcome::Deleted => format!(
            "VNet '{}' successfully deleted from resource group '{}'.",
            req.vnet_name, req.resource_group
        ),
        DeleteOutcome::NotPresent => format!(
            "VNet '{}' does not exist in resource group '{}'.",
            req.vnet_name, req.resource_group
        ),
    };
    Ok(Json(MessageResponse::new(message)))
}

fn create_error_detail(err: &Error) -> String {
    match err {
        Error::NotFound { message, .. } | Error::Azure { message, .. } => {
            log::error!("Azure API call failed: {message}");
            format!("Azure API call failed: {message}")
        }
        other => {
            log::error!("Unexpected error occurred: {other}");
            format!("Unexpected error: {other}")
        }
    }
}

fn delete_error_detail(err: &Error, kind: &str, resource_group: &str, vnet_name: &str) -> String {
    let detail = match err {
        Error::NotFound { .. } => {
            format!("Resource group '{resource_group}' or VNet '{vnet_name}' not found.")
        }
        Error::Azure { message, .. } => format!("Failed to delete {kind}: {message}"),
        other => format!("Unexpected error: {other}"),
    };
    log::error!("{detail}");
    detail
}
