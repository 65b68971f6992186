//! API route configuration.

use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;

use super::handlers;
use super::state::AppState;

/// Create the router with all routes. Protected handlers take an
/// `AuthenticatedUser` argument.
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        // Public
        .route("/health", get(handlers::health_check))
        // AAD protected
        .route("/", get(handlers::root))
        .route(
            "/vnets",
            post(handlers::create_virtual_network)
                .get(handlers::read_vnet_data)
                .delete(handlers::delete_virtual_network),
        )
        .route("/vnets/subnet", delete(handlers::delete_vnet_subnet))
        .with_state(state)
}
