//! Data models for the provisioning API.
//!
//! - [`request`] - payloads accepted by the HTTP endpoints
//! - [`arm`] - Azure Resource Manager wire types
//! - [`response`] - payloads returned by the HTTP endpoints

pub mod arm;
pub mod request;
pub mod response;

// Re-export public types
pub use arm::{
    AddressSpace, ArmErrorDetail, ArmErrorResponse, AsyncOperationStatus, Page, ResourceGroup,
    Subnet, SubnetProperties, VirtualNetwork, VirtualNetworkProperties,
};
pub use request::{
    ListVnetsQuery, SubnetDeleteRequest, SubnetRequest, VNetDeleteRequest, VNetRequest,
};
pub use response::{
    HealthResponse, MessageResponse, SubnetRecord, VnetListResponse, VnetRecord, VnetSummary,
};
