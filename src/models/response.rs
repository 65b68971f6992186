//! Response payloads returned by the HTTP endpoints.

use super::arm::VirtualNetwork;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct HealthResponse {
    pub status: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        HealthResponse {
            status: "ok".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        MessageResponse {
            message: message.into(),
        }
    }
}

/// Result of a create/update: the VNet as ARM reports it afterwards.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct VnetSummary {
    pub vnet_name: String,
    pub location: String,
    pub subnets: Vec<String>,
}

impl From<&VirtualNetwork> for VnetSummary {
    fn from(vnet: &VirtualNetwork) -> Self {
        VnetSummary {
            vnet_name: vnet.name().to_string(),
            location: vnet.location.clone(),
            subnets: vnet.subnet_names(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct SubnetRecord {
    pub name: String,
    pub address_prefix: Option<String>,
}

/// One row of `GET /vnets`.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct VnetRecord {
    pub id: String,
    pub resource_group: String,
    pub vnet_name: String,
    pub location: String,
    pub address_space: Vec<String>,
    pub subnets: Vec<SubnetRecord>,
    /// ARM provisioning state.
    pub status: String,
}

impl From<&VirtualNetwork> for VnetRecord {
    fn from(vnet: &VirtualNetwork) -> Self {
        VnetRecord {
            id: vnet.id.clone().unwrap_or_default(),
            resource_group: vnet.resource_group().unwrap_or_default().to_string(),
            vnet_name: vnet.name().to_string(),
            location: vnet.location.clone(),
            address_space: vnet.address_prefixes().to_vec(),
            subnets: vnet
                .properties
                .subnets
                .iter()
                .map(|s| SubnetRecord {
                    name: s.name().to_string(),
                    address_prefix: s.effective_prefix().map(String::from),
                })
                .collect(),
            status: vnet
                .properties
                .provisioning_state
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct VnetListResponse {
    pub data: Vec<VnetRecord>,
}
