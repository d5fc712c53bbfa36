#![allow(dead_code)]

use repair_service::config::RepairConfig;
use repair_service::services::{MemoryStore, RecordStore};
use repair_service::startup::Application;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::{json, Value};
use std::sync::Arc;

pub const TEST_ORG_ID: &str = "test-org";
pub const OTHER_ORG_ID: &str = "other-org";
pub const TEST_USER_ID: &str = "test-user";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_store(Arc::new(MemoryStore::new())).await
    }

    pub async fn spawn_with_store(store: Arc<dyn RecordStore>) -> Self {
        let app = Application::build_with_store(RepairConfig::in_memory(), store)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to accept connections by polling the health endpoint
        let client = Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
        }

        TestApp {
            address,
            port,
            client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    fn as_org(&self, builder: RequestBuilder, org_id: &str) -> RequestBuilder {
        builder
            .header("X-Org-ID", org_id)
            .header("X-User-ID", TEST_USER_ID)
            .header("X-User-Role", "Admin")
    }

    pub async fn get(&self, path: &str) -> Response {
        self.get_as(TEST_ORG_ID, path).await
    }

    pub async fn get_as(&self, org_id: &str, path: &str) -> Response {
        self.as_org(self.client.get(self.url(path)), org_id)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post(&self, path: &str, body: &Value) -> Response {
        self.post_as(TEST_ORG_ID, path, body).await
    }

    pub async fn post_as(&self, org_id: &str, path: &str, body: &Value) -> Response {
        self.as_org(self.client.post(self.url(path)), org_id)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn put(&self, path: &str, body: &Value) -> Response {
        self.put_as(TEST_ORG_ID, path, body).await
    }

    pub async fn put_as(&self, org_id: &str, path: &str, body: &Value) -> Response {
        self.as_org(self.client.put(self.url(path)), org_id)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn patch(&self, path: &str, body: &Value) -> Response {
        self.as_org(self.client.patch(self.url(path)), TEST_ORG_ID)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Send a request carrying an explicit role header, or none at all.
    pub async fn send_with_role(
        &self,
        method: Method,
        org_id: &str,
        role: Option<&str>,
        path: &str,
        body: Option<&Value>,
    ) -> Response {
        let mut builder = self
            .client
            .request(method, self.url(path))
            .header("X-Org-ID", org_id)
            .header("X-User-ID", TEST_USER_ID);
        if let Some(role) = role {
            builder = builder.header("X-User-Role", role);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }
        builder.send().await.expect("Failed to execute request")
    }

    pub async fn delete(&self, path: &str) -> Response {
        self.as_org(self.client.delete(self.url(path)), TEST_ORG_ID)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Create a customer and a job for it with the given charges.
    pub async fn create_job(&self, repairing_charges: f64, total_spare_cost: f64) -> Value {
        let customer: Value = self
            .post(
                "/api/customers",
                &json!({ "name": "Ravi Kumar", "contact": "9876543210" }),
            )
            .await
            .json()
            .await
            .expect("Failed to parse customer");

        let response = self
            .post(
                "/api/jobs",
                &json!({
                    "customer": customer["_id"],
                    "device": { "model": "Redmi Note 10", "problem": "Charging port loose" },
                    "financials": {
                        "repairingCharges": repairing_charges,
                        "totalSpareCost": total_spare_cost,
                        "discount": 0
                    }
                }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.expect("Failed to parse job")
    }

    /// Record a payment and return the receipt body.
    pub async fn pay(&self, job_id: &str, amount: f64) -> Value {
        let response = self
            .post(
                "/api/payments",
                &json!({ "job": job_id, "amount": amount, "date": "2024-05-01" }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.expect("Failed to parse receipt")
    }
}
