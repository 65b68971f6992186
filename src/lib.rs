//! Azure VNet provisioner: an HTTP API, guarded by Azure AD, that creates,
//! lists and deletes virtual networks and subnets through Azure Resource
//! Manager.

pub mod api;
pub mod azure;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;

pub use api::ApiServer;
pub use config::Settings;
pub use error::{Error, Result};
