mod common;

use common::{ADMIN_SECRET, spawn_test_server, test_service};
use license_key_server::{
    handlers::health::HealthResponse,
    models::license::{ActivationResponse, ActivationStatus, BlockResponse, License},
};
use serde_json::{Value, json};

async fn create(client: &reqwest::Client, base: &str, body: Value) -> License {
    let resp = client
        .post(format!("{}/api/v1/licenses", base))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    resp.json().await.unwrap()
}

async fn activate(
    client: &reqwest::Client,
    base: &str,
    key: &str,
    device_id: &str,
) -> reqwest::Response {
    client
        .post(format!("{}/api/v1/keys/{}/activate", base, key))
        .json(&json!({ "deviceId": device_id }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn health_endpoint_reports_store() {
    let (service, _) = test_service();
    let base = spawn_test_server(service).await;

    let resp = reqwest::get(format!("{}/health", base)).await.unwrap();
    assert_eq!(resp.status(), 200);

    let body: HealthResponse = resp.json().await.unwrap();
    assert_eq!(body.status, "healthy");
    assert_eq!(body.store, "connected");
}

#[tokio::test]
async fn create_returns_full_record() {
    let (service, _) = test_service();
    let base = spawn_test_server(service).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/v1/licenses", base))
        .json(&json!({ "owner": "ACME", "durationDays": 0, "maxDevices": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["owner"], "ACME");
    assert!(body["expiresAt"].is_null());
    assert_eq!(body["active"], true);
    assert_eq!(body["blocked"], false);
    assert_eq!(body["maxDevices"], 2);
    assert_eq!(body["devices"], json!([]));
    assert_eq!(body["key"].as_str().unwrap().len(), 32);
    assert!(body["id"].is_string());
    assert!(body["createdAt"].is_string());
}

#[tokio::test]
async fn create_without_owner_is_rejected() {
    let (service, _) = test_service();
    let base = spawn_test_server(service).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/v1/licenses", base))
        .json(&json!({ "owner": "", "durationDays": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "invalid_request");
}

#[tokio::test]
async fn list_and_lookup() {
    let (service, _) = test_service();
    let base = spawn_test_server(service).await;
    let client = reqwest::Client::new();

    let first = create(&client, &base, json!({ "owner": "one" })).await;
    let second = create(&client, &base, json!({ "owner": "two", "durationDays": 30 })).await;

    let listed: Vec<License> = client
        .get(format!("{}/api/v1/licenses", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed, vec![first.clone(), second]);

    let resp = client
        .get(format!("{}/api/v1/keys/{}", base, first.key.to_lowercase()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let found: License = resp.json().await.unwrap();
    assert_eq!(found.id, first.id);

    let resp = client
        .get(format!("{}/api/v1/keys/NOSUCHKEY", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "license_not_found");
}

#[tokio::test]
async fn activation_flow_over_http() {
    let (service, _) = test_service();
    let base = spawn_test_server(service).await;
    let client = reqwest::Client::new();

    let license = create(&client, &base, json!({ "owner": "ACME", "maxDevices": 1 })).await;

    let resp = activate(&client, &base, &license.key, "pc-1").await;
    assert_eq!(resp.status(), 200);
    let body: ActivationResponse = resp.json().await.unwrap();
    assert!(body.admitted);
    assert_eq!(body.reason, ActivationStatus::Activated);
    assert_eq!(body.devices_used, 1);
    assert_eq!(body.max_devices, 1);

    let resp = activate(&client, &base, &license.key, "pc-1").await;
    let body: ActivationResponse = resp.json().await.unwrap();
    assert_eq!(body.reason, ActivationStatus::AlreadyActivated);

    let resp = activate(&client, &base, &license.key, "pc-2").await;
    assert_eq!(resp.status(), 403);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "quota_exceeded");

    let resp = client
        .post(format!("{}/api/v1/keys/{}/deactivate", base, license.key))
        .json(&json!({ "deviceId": "pc-1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["removed"], true);

    let resp = client
        .post(format!("{}/api/v1/keys/{}/deactivate", base, license.key))
        .json(&json!({ "deviceId": "pc-1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "device_not_found");

    let resp = activate(&client, &base, &license.key, "pc-2").await;
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn activation_of_unknown_key_is_404() {
    let (service, _) = test_service();
    let base = spawn_test_server(service).await;
    let client = reqwest::Client::new();

    let resp = activate(&client, &base, "DOESNOTEXIST", "pc-1").await;
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn revoke_blocks_activation() {
    let (service, _) = test_service();
    let base = spawn_test_server(service).await;
    let client = reqwest::Client::new();

    let license = create(&client, &base, json!({ "owner": "ACME" })).await;

    let resp = client
        .post(format!("{}/api/v1/licenses/{}/revoke", base, license.id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);

    let resp = activate(&client, &base, &license.key, "pc-1").await;
    assert_eq!(resp.status(), 403);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "license_inactive");

    let resp = client
        .post(format!(
            "{}/api/v1/licenses/{}/revoke",
            base,
            uuid::Uuid::new_v4()
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn block_toggle_requires_admin_secret() {
    let (service, _) = test_service();
    let base = spawn_test_server(service).await;
    let client = reqwest::Client::new();

    let license = create(&client, &base, json!({ "owner": "ACME" })).await;
    let block_url = format!("{}/api/v1/licenses/{}/block", base, license.id);

    let resp = client
        .post(&block_url)
        .json(&json!({ "secret": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "unauthorized");

    let resp = client
        .post(&block_url)
        .json(&json!({ "secret": ADMIN_SECRET }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: BlockResponse = resp.json().await.unwrap();
    assert!(body.success);
    assert!(body.blocked);

    let resp = activate(&client, &base, &license.key, "pc-1").await;
    assert_eq!(resp.status(), 403);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "license_blocked");

    let body: BlockResponse = client
        .post(&block_url)
        .json(&json!({ "secret": ADMIN_SECRET }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!body.blocked);

    let resp = activate(&client, &base, &license.key, "pc-1").await;
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn delete_removes_license() {
    let (service, _) = test_service();
    let base = spawn_test_server(service).await;
    let client = reqwest::Client::new();

    let license = create(&client, &base, json!({ "owner": "ACME" })).await;
    let url = format!("{}/api/v1/licenses/{}", base, license.id);

    let resp = client.delete(&url).send().await.unwrap();
    assert_eq!(resp.status(), 204);

    let resp = client.delete(&url).send().await.unwrap();
    assert_eq!(resp.status(), 404);

    let resp = client
        .get(format!("{}/api/v1/keys/{}", base, license.key))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn malformed_license_id_is_not_found() {
    let (service, _) = test_service();
    let base = spawn_test_server(service).await;
    let client = reqwest::Client::new();

    let requests = [
        client.delete(format!("{}/api/v1/licenses/not-a-uuid", base)),
        client.post(format!("{}/api/v1/licenses/not-a-uuid/revoke", base)),
        client
            .post(format!("{}/api/v1/licenses/not-a-uuid/block", base))
            .json(&json!({ "secret": ADMIN_SECRET })),
    ];
    for request in requests {
        let resp = request.send().await.unwrap();
        assert_eq!(resp.status(), 404);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"]["code"], "license_not_found");
    }
}

#[tokio::test]
async fn incomplete_bodies_are_json_errors() {
    let (service, _) = test_service();
    let base = spawn_test_server(service).await;
    let client = reqwest::Client::new();

    let license = create(&client, &base, json!({ "owner": "ACME" })).await;

    let requests = [
        client
            .post(format!("{}/api/v1/licenses", base))
            .json(&json!({ "durationDays": 1 })),
        client
            .post(format!("{}/api/v1/keys/{}/activate", base, license.key))
            .json(&json!({})),
        client
            .post(format!("{}/api/v1/keys/{}/deactivate", base, license.key))
            .json(&json!({ "device": "A" })),
        client
            .post(format!("{}/api/v1/licenses/{}/block", base, license.id))
            .header("content-type", "application/json")
            .body("{not json"),
    ];
    for request in requests {
        let resp = request.send().await.unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"]["code"], "invalid_request");
        assert!(body["error"]["message"].is_string());
    }

    let stored: License = client
        .get(format!("{}/api/v1/keys/{}", base, license.key))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(stored.devices.is_empty());
    assert!(!stored.blocked);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let (service, _) = test_service();
    let base = spawn_test_server(service).await;

    let resp = reqwest::get(format!("{}/api/v1/nonexistent", base))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
