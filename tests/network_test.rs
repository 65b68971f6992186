//! NetworkService flows against a mocked ARM.

mod common;

use azure_vnet_provisioner::azure::DeleteOutcome;
use azure_vnet_provisioner::models::{SubnetRequest, VNetRequest};
use azure_vnet_provisioner::Error;
use common::*;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

fn request(subnets: &[(&str, &str)]) -> VNetRequest {
    VNetRequest {
        resource_group: "demo-rg".to_string(),
        vnet_name: "myVNet".to_string(),
        location: "eastus".to_string(),
        address_prefix: "10.0.0.0/16".to_string(),
        subnets: subnets
            .iter()
            .map(|(n, p)| SubnetRequest {
                name: n.to_string(),
                address_prefix: p.to_string(),
            })
            .collect(),
    }
}

#[tokio::test]
async fn test_existing_vnet_only_changed_subnets_are_written() {
    let server = mock_azure().await;
    let existing = vnet_json(
        "demo-rg",
        "myVNet",
        "eastus",
        "10.0.0.0/16",
        &[("subnet1", "10.0.1.0/24"), ("subnet2", "10.0.2.0/24")],
    );

    // Resource group is missing and gets created first.
    Mock::given(method("GET"))
        .and(path(rg_path("demo-rg")))
        .respond_with(ResponseTemplate::new(404).set_body_json(arm_error(
            "ResourceGroupNotFound",
            "Resource group 'demo-rg' could not be found.",
        )))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(rg_path("demo-rg")))
        .and(body_json(json!({"location": "eastus"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"name": "demo-rg", "location": "eastus"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(vnets_path("demo-rg")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": [existing.clone()]})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(vnet_path("demo-rg", "myVNet")))
        .respond_with(ResponseTemplate::new(200).set_body_json(existing))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path(subnet_path("demo-rg", "myVNet", "subnet1")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    for (name, prefix) in [("subnet2", "10.0.9.0/24"), ("subnet3", "10.0.3.0/24")] {
        Mock::given(method("PUT"))
            .and(path(subnet_path("demo-rg", "myVNet", name)))
            .and(body_json(json!({"name": name, "properties": {"addressPrefix": prefix}})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(subnet_path("demo-rg", "myVNet", name)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"name": name, "properties": {"addressPrefix": prefix}})),
            )
            .mount(&server)
            .await;
    }

    let service = network_service(&server);
    let vnet = service
        .create_or_update_vnet(&request(&[
            ("subnet1", "10.0.1.0/24"),
            ("subnet2", "10.0.9.0/24"),
            ("subnet3", "10.0.3.0/24"),
        ]))
        .await
        .expect("create_or_update_vnet");
    assert_eq!(vnet.name(), "myVNet");
}

#[tokio::test]
async fn test_create_resource_group_failure_stops_flow() {
    let server = mock_azure().await;
    Mock::given(method("GET"))
        .and(path(rg_path("demo-rg")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(rg_path("demo-rg")))
        .respond_with(ResponseTemplate::new(403).set_body_json(arm_error(
            "AuthorizationFailed",
            "does not have authorization to perform action",
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(vnets_path("demo-rg")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
        .expect(0)
        .mount(&server)
        .await;

    let err = network_service(&server)
        .create_or_update_vnet(&request(&[]))
        .await
        .unwrap_err();
    match err {
        Error::Azure { status, code, .. } => {
            assert_eq!(status, 403);
            assert_eq!(code, "AuthorizationFailed");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_delete_vnet_unknown_group_is_not_found() {
    let server = mock_azure().await;
    Mock::given(method("GET"))
        .and(path(vnets_path("nope")))
        .respond_with(ResponseTemplate::new(404).set_body_json(arm_error(
            "ResourceGroupNotFound",
            "Resource group 'nope' could not be found.",
        )))
        .mount(&server)
        .await;

    let err = network_service(&server)
        .delete_vnet("nope", "v")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }), "{err:?}");
}

#[tokio::test]
async fn test_delete_subnet_outcomes() {
    let server = mock_azure().await;
    Mock::given(method("GET"))
        .and(path(vnet_path("rg", "v")))
        .respond_with(ResponseTemplate::new(200).set_body_json(vnet_json(
            "rg",
            "v",
            "eastus",
            "10.0.0.0/16",
            &[("present", "10.0.1.0/24")],
        )))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(subnet_path("rg", "v", "present")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let service = network_service(&server);
    assert_eq!(
        service.delete_subnet("rg", "v", "absent").await.unwrap(),
        DeleteOutcome::NotPresent
    );
    assert_eq!(
        service.delete_subnet("rg", "v", "present").await.unwrap(),
        DeleteOutcome::Deleted
    );
}
