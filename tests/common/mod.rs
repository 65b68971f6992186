//! Shared fixtures: one wiremock server plays both Azure AD (OpenID
//! metadata and signing keys) and Azure Resource Manager.
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use azure_vnet_provisioner::api::{AadTokenValidator, ApiServer, AppState};
use azure_vnet_provisioner::azure::{ArmClient, NetworkService, StaticTokenProvider};
use azure_vnet_provisioner::config::AuthSettings;
use http_body_util::BodyExt;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TENANT: &str = "11111111-1111-1111-1111-111111111111";
pub const CLIENT_ID: &str = "22222222-2222-2222-2222-222222222222";
pub const SUBSCRIPTION: &str = "sub-0001";
pub const KID: &str = "test-signing-key-01";
pub const ORIGIN: &str = "http://localhost:8000";

const SIGNING_KEY: &[u8] = include_bytes!("../../src/tests/test_data/aad_test_signing_key.pem");
const JWKS: &str = include_str!("../../src/tests/test_data/aad_test_jwks.json");

/// Start a mock server with AAD metadata and keys mounted.
pub async fn mock_azure() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/{TENANT}/v2.0/.well-known/openid-configuration")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "issuer": format!("{}/{TENANT}/v2.0", server.uri()),
            "jwks_uri": format!("{}/{TENANT}/discovery/v2.0/keys", server.uri()),
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/{TENANT}/discovery/v2.0/keys")))
        .respond_with(ResponseTemplate::new(200).set_body_raw(JWKS, "application/json"))
        .mount(&server)
        .await;
    server
}

/// A valid user access token for the mock tenant.
pub fn user_token(server: &MockServer) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = json!({
        "aud": CLIENT_ID,
        "iss": format!("{}/{TENANT}/v2.0", server.uri()),
        "iat": now,
        "nbf": now,
        "exp": now + 3600,
        "oid": "33333333-3333-3333-3333-333333333333",
        "tid": TENANT,
        "preferred_username": "alice@example.com",
        "scp": "user_impersonation",
    });
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(KID.to_string());
    let key = EncodingKey::from_rsa_pem(SIGNING_KEY).expect("test key");
    encode(&header, &claims, &key).expect("sign token")
}

pub fn network_service(server: &MockServer) -> NetworkService {
    let arm = ArmClient::new(
        &server.uri(),
        Arc::new(StaticTokenProvider("arm-token".to_string())),
        Duration::from_millis(5),
        Duration::from_secs(5),
    )
    .expect("arm client");
    NetworkService::new(arm, SUBSCRIPTION)
}

pub fn router(server: &MockServer) -> Router {
    let auth = AadTokenValidator::new(AuthSettings {
        tenant_id: TENANT.to_string(),
        app_client_id: CLIENT_ID.to_string(),
        authority_host: server.uri(),
        allow_guest_users: true,
        required_scopes: vec![],
    })
    .expect("validator");
    let state = Arc::new(AppState::new(network_service(server), auth));
    ApiServer::new(
        "127.0.0.1:0".parse().expect("addr"),
        vec![ORIGIN.to_string()],
        state,
    )
    .router()
}

pub fn rg_path(rg: &str) -> String {
    format!("/subscriptions/{SUBSCRIPTION}/resourceGroups/{rg}")
}

pub fn vnets_path(rg: &str) -> String {
    format!("/subscriptions/{SUBSCRIPTION}/resourceGroups/{rg}/providers/Microsoft.Network/virtualNetworks")
}

pub fn vnet_path(rg: &str, vnet: &str) -> String {
    format!("{}/{vnet}", vnets_path(rg))
}

pub fn subnet_path(rg: &str, vnet: &str, subnet: &str) -> String {
    format!("{}/subnets/{subnet}", vnet_path(rg, vnet))
}

/// ARM representation of a VNet.
pub fn vnet_json(rg: &str, name: &str, location: &str, prefix: &str, subnets: &[(&str, &str)]) -> Value {
    json!({
        "id": format!("/subscriptions/{SUBSCRIPTION}/resourceGroups/{rg}/providers/Microsoft.Network/virtualNetworks/{name}"),
        "name": name,
        "type": "Microsoft.Network/virtualNetworks",
        "location": location,
        "properties": {
            "provisioningState": "Succeeded",
            "addressSpace": { "addressPrefixes": [prefix] },
            "subnets": subnets.iter().map(|(n, p)| json!({
                "name": n,
                "properties": { "addressPrefix": p, "provisioningState": "Succeeded" }
            })).collect::<Vec<_>>()
        }
    })
}

pub fn arm_error(code: &str, message: &str) -> Value {
    json!({ "error": { "code": code, "message": message } })
}

/// Send one request through the router and return status plus JSON body.
pub async fn send(router: Router, request: Request<Body>) -> (Response<()>, Value) {
    let response = router.oneshot(request).await.expect("router response");
    let (parts, body) = response.into_parts();
    let bytes = body.collect().await.expect("body").to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (Response::from_parts(parts, ()), value)
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("request")
}
