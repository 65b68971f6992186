//! Request payloads accepted by the HTTP endpoints.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::OnceLock;
use validator::{Validate, ValidationError};

/// Characters ARM accepts in resource group, vnet and subnet names. The
/// first one must be a letter or digit, so `.` and `..` never reach the
/// ARM URL path as dot segments.
static RESOURCE_NAME_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_resource_name_regex() -> &'static Regex {
    RESOURCE_NAME_REGEX
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._()\-]*$").expect("Invalid Regex"))
}

pub const MAX_RESOURCE_GROUP_NAME: usize = 90;
pub const MAX_NETWORK_NAME: usize = 80;

fn check_name(value: &str, max: usize) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new("required").with_message(Cow::from("must not be empty")));
    }
    if value.len() > max {
        return Err(ValidationError::new("length")
            .with_message(Cow::from(format!("must be at most {max} characters"))));
    }
    if !get_resource_name_regex().is_match(value) {
        return Err(ValidationError::new("resource_name").with_message(Cow::from(
            "must start with a letter or digit and may only contain letters, digits, '.', '_', '-', '(' and ')'",
        )));
    }
    if value.ends_with('.') {
        return Err(ValidationError::new("resource_name")
            .with_message(Cow::from("must not end with '.'")));
    }
    Ok(())
}

fn validate_resource_group(value: &str) -> Result<(), ValidationError> {
    check_name(value, MAX_RESOURCE_GROUP_NAME)
}

fn validate_network_name(value: &str) -> Result<(), ValidationError> {
    check_name(value, MAX_NETWORK_NAME)
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct SubnetRequest {
    #[validate(custom(function = "validate_network_name"))]
    pub name: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub address_prefix: String,
}

/// Create a VNet, or add/update subnets of an existing one.
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct VNetRequest {
    #[validate(custom(function = "validate_resource_group"))]
    pub resource_group: String,
    #[validate(custom(function = "validate_network_name"))]
    pub vnet_name: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub location: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub address_prefix: String,
    #[validate(nested)]
    pub subnets: Vec<SubnetRequest>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct SubnetDeleteRequest {
    #[validate(custom(function = "validate_resource_group"))]
    pub resource_group: String,
    #[validate(custom(function = "validate_network_name"))]
    pub vnet_name: String,
    #[validate(custom(function = "validate_network_name"))]
    pub subnet_name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct VNetDeleteRequest {
    #[validate(custom(function = "validate_resource_group"))]
    pub resource_group: String,
    #[validate(custom(function = "validate_network_name"))]
    pub vnet_name: String,
}

/// Query string of `GET /vnets`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct ListVnetsQuery {
    #[serde(rename = "vnetName")]
    #[validate(custom(function = "validate_network_name"))]
    pub vnet_name: Option<String>,
    #[serde(rename = "resourceGroup")]
    #[validate(custom(function = "validate_resource_group"))]
    pub resource_group: Option<String>,
}
