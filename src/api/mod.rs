//! HTTP API of the provisioner.
//!
//! - [`routes`] - path to handler mapping
//! - [`handlers`] - one handler per endpoint
//! - [`auth`] - Azure AD bearer token validation
//! - [`extract`] - validating JSON/query extractors
//! - [`error`] - error to response mapping
//! - [`state`] - shared handler state

pub mod auth;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::Settings;

pub use auth::{AadClaims, AadTokenValidator, AuthError, AuthenticatedUser};
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use state::AppState;

pub struct ApiServer {
    bind_address: SocketAddr,
    cors_allowed_origins: Vec<String>,
    state: Arc<AppState>,
}

impl ApiServer {
    pub fn new(
        bind_address: SocketAddr,
        cors_allowed_origins: Vec<String>,
        state: Arc<AppState>,
    ) -> Self {
        Self {
            bind_address,
            cors_allowed_origins,
            state,
        }
    }

    /// Build state from settings and wrap it in a server.
    pub fn from_settings(settings: &Settings) -> crate::error::Result<Self> {
        let state = Arc::new(AppState::from_settings(settings)?);
        Ok(Self::new(
            settings.bind_address,
            settings.cors_allowed_origins.clone(),
            state,
        ))
    }

    /// Build the router with CORS and request tracing.
    pub fn router(&self) -> Router {
        routes::api_routes(self.state.clone())
            .layer(cors_layer(&self.cors_allowed_origins))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            )
    }

    /// Serve until `shutdown` resolves.
    pub async fn run_with_shutdown(
        self,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), std::io::Error> {
        let router = self.router();
        let listener = TcpListener::bind(self.bind_address).await?;
        log::info!("Listening on http://{}", listener.local_addr()?);
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
    }

    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }
}

/// Credentialed CORS for the listed origins. Methods and headers mirror
/// the preflight request, since `*` is not allowed with credentials.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!("Ignoring invalid CORS origin '{o}': {e}");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
