//! VNet and subnet lifecycle against ARM.
//!
//! Each public operation is a single request's worth of ARM calls. There
//! is no state kept between requests.

use super::arm::{ArmClient, NETWORK_API_VERSION, RESOURCES_API_VERSION};
use crate::error::Result;
use crate::models::{ResourceGroup, Subnet, SubnetRequest, VNetRequest, VirtualNetwork};
use std::collections::HashMap;

/// What a delete call found.
#[derive(Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The resource was not there; nothing was sent to ARM.
    NotPresent,
}

/// Action taken for one requested subnet of an existing VNet.
#[derive(Debug, PartialEq, Eq)]
pub enum SubnetChange {
    Create,
    Update,
    Unchanged,
}

#[derive(Clone)]
pub struct NetworkService {
    arm: ArmClient,
    subscription_id: String,
}

impl NetworkService {
    pub fn new(arm: ArmClient, subscription_id: impl Into<String>) -> Self {
        NetworkService {
            arm,
            subscription_id: subscription_id.into(),
        }
    }

    fn resource_group_path(&self, resource_group: &str) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{resource_group}",
            self.subscription_id
        )
    }

    fn vnets_path(&self, resource_group: &str) -> String {
        format!(
            "{}/providers/Microsoft.Network/virtualNetworks",
            self.resource_group_path(resource_group)
        )
    }

    fn vnet_path(&self, resource_group: &str, vnet_name: &str) -> String {
        format!("{}/{vnet_name}", self.vnets_path(resource_group))
    }

    fn subnet_path(&self, resource_group: &str, vnet_name: &str, subnet_name: &str) -> String {
        format!(
            "{}/subnets/{subnet_name}",
            self.vnet_path(resource_group, vnet_name)
        )
    }

    pub async fn get_resource_group(&self, resource_group: &str) -> Result<Option<ResourceGroup>> {
        self.arm
            .get_optional(&self.resource_group_path(resource_group), RESOURCES_API_VERSION)
            .await
    }

    pub async fn create_resource_group(
        &self,
        resource_group: &str,
        location: &str,
    ) -> Result<ResourceGroup> {
        let body = ResourceGroup {
            id: None,
            name: None,
            location: location.to_string(),
        };
        self.arm
            .put(
                &self.resource_group_path(resource_group),
                RESOURCES_API_VERSION,
                &body,
            )
            .await
    }

    pub async fn list_vnets_in_group(&self, resource_group: &str) -> Result<Vec<VirtualNetwork>> {
        self.arm
            .list(&self.vnets_path(resource_group), NETWORK_API_VERSION)
            .await
    }

    pub async fn list_vnets_in_subscription(&self) -> Result<Vec<VirtualNetwork>> {
        let path = format!(
            "/subscriptions/{}/providers/Microsoft.Network/virtualNetworks",
            self.subscription_id
        );
        self.arm.list(&path, NETWORK_API_VERSION).await
    }

    pub async fn get_vnet(&self, resource_group: &str, vnet_name: &str) -> Result<VirtualNetwork> {
        self.arm
            .get(&self.vnet_path(resource_group, vnet_name), NETWORK_API_VERSION)
            .await
    }

    pub async fn create_or_update_vnet_resource(
        &self,
        resource_group: &str,
        vnet_name: &str,
        vnet: &VirtualNetwork,
    ) -> Result<VirtualNetwork> {
        self.arm
            .put_and_wait(
                &self.vnet_path(resource_group, vnet_name),
                NETWORK_API_VERSION,
                vnet,
            )
            .await
    }

    pub async fn create_or_update_subnet(
        &self,
        resource_group: &str,
        vnet_name: &str,
        subnet: &SubnetRequest,
    ) -> Result<Subnet> {
        let body = Subnet::new(&subnet.name, &subnet.address_prefix);
        self.arm
            .put_and_wait(
                &self.subnet_path(resource_group, vnet_name, &subnet.name),
                NETWORK_API_VERSION,
                &body,
            )
            .await
    }

    pub async fn delete_subnet_resource(
        &self,
        resource_group: &str,
        vnet_name: &str,
        subnet_name: &str,
    ) -> Result<()> {
        self.arm
            .delete_and_wait(
                &self.subnet_path(resource_group, vnet_name, subnet_name),
                NETWORK_API_VERSION,
            )
            .await
    }

    pub async fn delete_vnet_resource(&self, resource_group: &str, vnet_name: &str) -> Result<()> {
        self.arm
            .delete_and_wait(&self.vnet_path(resource_group, vnet_name), NETWORK_API_VERSION)
            .await
    }

    /// Create the VNet with all requested subnets, or bring the subnets of
    /// an existing VNet in line with the request.
    pub async fn create_or_update_vnet(&self, req: &VNetRequest) -> Result<VirtualNetwork> {
        if self.get_resource_group(&req.resource_group).await?.is_none() {
            log::info!("Creating resource group: {}", req.resource_group);
            self.create_resource_group(&req.resource_group, &req.location)
                .await?;
        }

        let vnets = self.list_vnets_in_group(&req.resource_group).await?;
        if !vnets.iter().any(|v| v.name() == req.vnet_name) {
            log::info!("Creating new VNet '{}' with all subnets...", req.vnet_name);
            let subnets = req
                .subnets
                .iter()
                .map(|s| Subnet::new(&s.name, &s.address_prefix))
                .collect();
            let body = VirtualNetwork::new(&req.location, &req.address_prefix, subnets);
            return self
                .create_or_update_vnet_resource(&req.resource_group, &req.vnet_name, &body)
                .await;
        }

        log::info!("VNet '{}' already exists. Checking subnets...", req.vnet_name);
        let vnet = self.get_vnet(&req.resource_group, &req.vnet_name).await?;
        if !vnet.address_prefixes().iter().any(|p| p == &req.address_prefix) {
            log::warn!(
                "VNet '{}' address space {:?} does not contain requested {}; address space is not changed",
                req.vnet_name,
                vnet.address_prefixes(),
                req.address_prefix
            );
        }

        for (subnet, change) in plan_subnet_changes(&vnet, &req.subnets) {
            match change {
                SubnetChange::Create => {
                    log::info!("Creating new subnet '{}'...", subnet.name);
                }
                SubnetChange::Update => {
                    log::info!("Updating subnet '{}' with new address prefix...", subnet.name);
                }
                SubnetChange::Unchanged => {
                    log::info!(
                        "Subnet '{}' already exists with correct address prefix. Skipping.",
                        subnet.name
                    );
                    continue;
                }
            }
            self.create_or_update_subnet(&req.resource_group, &req.vnet_name, subnet)
                .await?;
        }

        self.get_vnet(&req.resource_group, &req.vnet_name).await
    }

    /// VNets in the subscription (or one resource group), optionally
    /// filtered by name.
    pub async fn list_vnets(
        &self,
        resource_group: Option<&str>,
        vnet_name: Option<&str>,
    ) -> Result<Vec<VirtualNetwork>> {
        let mut vnets = match resource_group {
            Some(rg) => self.list_vnets_in_group(rg).await?,
            None => self.list_vnets_in_subscription().await?,
        };
        if let Some(name) = vnet_name {
            vnets.retain(|v| v.name() == name);
        }
        log::info!("Found {} VNet(s)", vnets.len());
        Ok(vnets)
    }

    pub async fn delete_subnet(
        &self,
        resource_group: &str,
        vnet_name: &str,
        subnet_name: &str,
    ) -> Result<DeleteOutcome> {
        log::info!("Attempting to delete subnet '{subnet_name}' in VNet '{vnet_name}'...");
        let vnet = self.get_vnet(resource_group, vnet_name).await?;
        if vnet.find_subnet(subnet_name).is_none() {
            return Ok(DeleteOutcome::NotPresent);
        }
        self.delete_subnet_resource(resource_group, vnet_name, subnet_name)
            .await?;
        log::info!("Deleted subnet '{subnet_name}' from VNet '{vnet_name}'");
        Ok(DeleteOutcome::Deleted)
    }

    pub async fn delete_vnet(&self, resource_group: &str, vnet_name: &str) -> Result<DeleteOutcome> {
        log::info!("Attempting to delete VNet '{vnet_name}'...");
        let vnets = self.list_vnets_in_group(resource_group).await?;
        if !vnets.iter().any(|v| v.name() == vnet_name) {
            return Ok(DeleteOutcome::NotPresent);
        }
        self.delete_vnet_resource(resource_group, vnet_name).await?;
        log::info!("Deleted VNet '{vnet_name}' from resource group '{resource_group}'");
        Ok(DeleteOutcome::Deleted)
    }
}

/// Decide per requested subnet whether to create, update or skip it.
pub fn plan_subnet_changes<'a>(
    vnet: &VirtualNetwork,
    requested: &'a [SubnetRequest],
) -> Vec<(&'a SubnetRequest, SubnetChange)> {
    let existing: HashMap<&str, Option<&str>> = vnet
        .properties
        .subnets
        .iter()
        .map(|s| (s.name(), s.effective_prefix()))
        .collect();

    requested
        .iter()
        .map(|sn| {
            let change = match existing.get(sn.name.as_str()) {
                None => SubnetChange::Create,
                Some(prefix) if *prefix != Some(sn.address_prefix.as_str()) => SubnetChange::Update,
                Some(_) => SubnetChange::Unchanged,
            };
            (sn, change)
        })
        .collect()
}
