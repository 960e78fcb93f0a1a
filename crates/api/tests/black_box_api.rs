use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::json;

use stocksync_api::app::{self, AppConfig, AppServices};
use stocksync_catalog::Product;
use stocksync_core::{Barcode, WarehouseId};
use stocksync_relay::InMemoryRelay;

struct TestServer {
    base_url: String,
    services: Arc<AppServices>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Spawn one warehouse server on an ephemeral port, publishing as
    /// `local` and mirroring `peer` over the given relay.
    async fn spawn(local: &str, peer: &str, relay: InMemoryRelay) -> Self {
        let config = AppConfig::in_memory(
            WarehouseId::new(local).unwrap(),
            WarehouseId::new(peer).unwrap(),
            test_catalog(),
        );
        let (router, services) = app::build_app_with_relay(config, relay).await;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            base_url,
            services,
            handle,
        }
    }

    /// Replication is asynchronous; wait until the subscriber reports
    /// SUBSCRIBED so published scans cannot be lost to the at-most-once
    /// relay.
    async fn wait_subscribed(&self, client: &reqwest::Client) {
        for _ in 0..100 {
            let body: serde_json::Value = client
                .get(format!("{}/health", self.base_url))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            if body["replication"] == "SUBSCRIBED" {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("subscriber did not reach SUBSCRIBED within timeout");
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.services.shutdown();
        self.handle.abort();
    }
}

fn test_catalog() -> Vec<Product> {
    vec![
        Product {
            barcode: Barcode::new("012345678905").unwrap(),
            name: "Widget".to_string(),
        },
        Product {
            barcode: Barcode::new("110650").unwrap(),
            name: "HN440".to_string(),
        },
    ]
}

async fn scan(
    client: &reqwest::Client,
    base_url: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let res = client
        .post(format!("{}/scan", base_url))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = res.status();
    (status, res.json().await.unwrap())
}

#[tokio::test]
async fn health_reports_warehouse_identity() {
    let srv = TestServer::spawn("A", "B", InMemoryRelay::new()).await;
    let client = reqwest::Client::new();

    let res = client.get(format!("{}/health", srv.base_url)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["warehouse"], "A");
    assert_eq!(body["peer"], "B");
}

#[tokio::test]
async fn bare_scan_defaults_to_restock_by_one() {
    let srv = TestServer::spawn("A", "B", InMemoryRelay::new()).await;
    let client = reqwest::Client::new();

    let (status, body) = scan(&client, &srv.base_url, json!({ "barcode": "012345678905" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["action"], "RESTOCK");
    assert_eq!(body["barcode_type"], "UPC-A");
    assert_eq!(body["quantity"], 1);
    assert!(body["scan_id"].is_string());

    let record: serde_json::Value = client
        .get(format!("{}/inventory/012345678905", srv.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(record["quantity"], 1);
    assert_eq!(record["warehouse_id"], "A");
    assert_eq!(record["authoritative"], true);
}

#[tokio::test]
async fn unknown_barcode_is_rejected_without_side_effects() {
    let srv = TestServer::spawn("A", "B", InMemoryRelay::new()).await;
    let client = reqwest::Client::new();

    let (status, body) = scan(&client, &srv.base_url, json!({ "barcode": "999999999999" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"], "unknown_barcode");

    let record: serde_json::Value = client
        .get(format!("{}/inventory/999999999999", srv.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(record["quantity"], 0);
}

#[tokio::test]
async fn sale_past_zero_is_a_conflict() {
    let srv = TestServer::spawn("A", "B", InMemoryRelay::new()).await;
    let client = reqwest::Client::new();

    let (status, _) = scan(
        &client,
        &srv.base_url,
        json!({ "barcode": "012345678905", "action": "RESTOCK", "quantity": 2 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = scan(
        &client,
        &srv.base_url,
        json!({ "barcode": "012345678905", "action": "SALE", "quantity": 5 }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "insufficient_stock");

    let record: serde_json::Value = client
        .get(format!("{}/inventory/012345678905", srv.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(record["quantity"], 2);
}

#[tokio::test]
async fn composite_scan_resolves_by_prefix() {
    let srv = TestServer::spawn("A", "B", InMemoryRelay::new()).await;
    let client = reqwest::Client::new();

    let (status, body) = scan(&client, &srv.base_url, json!({ "barcode": "110650-2311164" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["barcode"], "110650");
    assert_eq!(body["barcode_type"], "CODE-128");
}

#[tokio::test]
async fn catalog_lookup_is_read_only() {
    let srv = TestServer::spawn("A", "B", InMemoryRelay::new()).await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/catalog/012345678905", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["name"], "Widget");

    let res = client
        .get(format!("{}/catalog/999999999999", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn scan_at_a_is_visible_in_b_replica_and_audit() {
    let relay = InMemoryRelay::new();
    let srv_a = TestServer::spawn("A", "B", relay.clone()).await;
    let srv_b = TestServer::spawn("B", "A", relay).await;
    let client = reqwest::Client::new();

    srv_a.wait_subscribed(&client).await;
    srv_b.wait_subscribed(&client).await;

    let (status, _) = scan(
        &client,
        &srv_a.base_url,
        json!({ "barcode": "012345678905", "action": "RESTOCK", "quantity": 10 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = scan(
        &client,
        &srv_a.base_url,
        json!({ "barcode": "012345678905", "action": "SALE", "quantity": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "SALE");
    assert_eq!(body["quantity"], 9);

    // Replica convergence is eventual; poll until B mirrors 9.
    let mut mirrored = false;
    for _ in 0..100 {
        let record: serde_json::Value = client
            .get(format!("{}/replica/A/012345678905", srv_b.base_url))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if record["quantity"] == 9 {
            assert_eq!(record["authoritative"], false);
            mirrored = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(mirrored, "replica at B did not converge to 9");

    let audit: serde_json::Value = client
        .get(format!("{}/audit/A", srv_b.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let entries = audit["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1]["action"], "SALE");
    assert_eq!(entries[1]["product_name"], "Widget");
    assert_eq!(entries[1]["quantity"], 1);

    // A has no replica data for B; nothing flowed that way.
    let record: serde_json::Value = client
        .get(format!("{}/replica/B/012345678905", srv_a.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(record["quantity"], 0);
}
