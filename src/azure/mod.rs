//! Azure Resource Manager interaction.
//!
//! This module handles all Azure-related operations:
//! - [`credential`] - Access tokens for ARM
//! - [`arm`] - REST client, pagination and long-running operations
//! - [`network`] - VNet and subnet lifecycle

pub mod arm;
pub mod credential;
pub mod network;

// Re-export public types and functions
pub use arm::{ArmClient, NETWORK_API_VERSION, RESOURCES_API_VERSION};
pub use credential::{ClientSecretTokenProvider, StaticTokenProvider, TokenProvider};
pub use network::{DeleteOutcome, NetworkService, SubnetChange};
