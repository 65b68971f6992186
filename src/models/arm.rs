//! Azure Resource Manager wire types.
//!
//! Only the fields this service reads or writes are modelled; ARM returns
//! many more and serde ignores the rest.

use serde::{Deserialize, Serialize};

/// One page of an ARM list call.
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    /// Absolute URL of the next page, if more results are available.
    pub next_link: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ResourceGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub location: String,
}

/// Azure Virtual Network resource.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct VirtualNetwork {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub properties: VirtualNetworkProperties,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetworkProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_space: Option<AddressSpace>,
    #[serde(default)]
    pub subnets: Vec<Subnet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AddressSpace {
    #[serde(default)]
    pub address_prefixes: Vec<String>,
}

/// Azure subnet resource, standalone or nested inside a VNet.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Subnet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub properties: SubnetProperties,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubnetProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_prefixes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

impl VirtualNetwork {
    /// Body for creating a VNet with its full subnet list in one PUT.
    pub fn new(location: &str, address_prefix: &str, subnets: Vec<Subnet>) -> VirtualNetwork {
        VirtualNetwork {
            id: None,
            name: None,
            location: location.to_string(),
            properties: VirtualNetworkProperties {
                address_space: Some(AddressSpace {
                    address_prefixes: vec![address_prefix.to_string()],
                }),
                subnets,
                provisioning_state: None,
            },
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn address_prefixes(&self) -> &[String] {
        self.properties
            .address_space
            .as_ref()
            .map(|a| a.address_prefixes.as_slice())
            .unwrap_or_default()
    }

    /// Names of the subnets in ARM order.
    pub fn subnet_names(&self) -> Vec<String> {
        self.properties
            .subnets
            .iter()
            .map(|s| s.name().to_string())
            .collect()
    }

    pub fn find_subnet(&self, name: &str) -> Option<&Subnet> {
        self.properties.subnets.iter().find(|s| s.name() == name)
    }

    /// Resource group parsed from the ARM resource id.
    pub fn resource_group(&self) -> Option<&str> {
        resource_group_from_id(self.id.as_deref()?)
    }
}

impl Subnet {
    /// Body for creating or updating a single subnet.
    pub fn new(name: &str, address_prefix: &str) -> Subnet {
        Subnet {
            id: None,
            name: Some(name.to_string()),
            properties: SubnetProperties {
                address_prefix: Some(address_prefix.to_string()),
                address_prefixes: None,
                provisioning_state: None,
            },
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// `addressPrefix`, or the first of `addressPrefixes` for multi-prefix subnets.
    pub fn effective_prefix(&self) -> Option<&str> {
        self.properties.address_prefix.as_deref().or_else(|| {
            self.properties
                .address_prefixes
                .as_ref()
                .and_then(|p| p.first())
                .map(String::as_str)
        })
    }
}

/// Extract `{rg}` from `/subscriptions/{sub}/resourceGroups/{rg}/...`.
/// ARM is inconsistent about the casing of the segment name.
pub fn resource_group_from_id(id: &str) -> Option<&str> {
    let mut parts = id.split('/');
    while let Some(part) = parts.next() {
        if part.eq_ignore_ascii_case("resourceGroups") {
            return parts.next().filter(|s| !s.is_empty());
        }
    }
    None
}

/// Body of `Azure-AsyncOperation` polling responses.
#[derive(Serialize, Deserialize, Debug)]
pub struct AsyncOperationStatus {
    pub status: String,
    pub error: Option<ArmErrorDetail>,
}

impl AsyncOperationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status.to_ascii_lowercase().as_str(),
            "succeeded" | "failed" | "canceled"
        )
    }

    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("succeeded")
    }
}

/// Standard ARM error envelope.
#[derive(Serialize, Deserialize, Debug)]
pub struct ArmErrorResponse {
    pub error: ArmErrorDetail,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ArmErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}
