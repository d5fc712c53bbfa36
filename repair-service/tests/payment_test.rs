mod common;

use common::TestApp;
use reqwest::Client;
use serde_json::{json, Value};

#[tokio::test]
async fn partial_then_full_payment_settles_job() {
    let app = TestApp::spawn().await;
    let job = app.create_job(1000.0, 500.0).await;
    let job_id = job["_id"].as_str().unwrap();

    assert_eq!(job["paymentStatus"], "Unpaid");
    assert_eq!(job["financials"]["balanceAmount"], 1500.0);

    let receipt = app.pay(job_id, 600.0).await;
    assert_eq!(receipt["payment"]["amount"], 600.0);
    assert_eq!(receipt["job"]["financials"]["totalReceived"], 600.0);
    assert_eq!(receipt["job"]["financials"]["balanceAmount"], 900.0);
    assert_eq!(receipt["job"]["paymentStatus"], "Partially Paid");

    let receipt = app.pay(job_id, 900.0).await;
    assert_eq!(receipt["job"]["financials"]["totalReceived"], 1500.0);
    assert_eq!(receipt["job"]["financials"]["balanceAmount"], 0.0);
    assert_eq!(receipt["job"]["paymentStatus"], "Paid");

    let stored: Value = app
        .get(&format!("/api/jobs/{}", job_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(stored["paymentStatus"], "Paid");
}

#[tokio::test]
async fn ledger_scenario_with_amendment() {
    let app = TestApp::spawn().await;
    let job = app.create_job(1000.0, 200.0).await;
    let job_id = job["_id"].as_str().unwrap();

    let first = app.pay(job_id, 500.0).await;
    assert_eq!(first["job"]["financials"]["totalReceived"], 500.0);
    assert_eq!(first["job"]["financials"]["balanceAmount"], 700.0);
    assert_eq!(first["job"]["paymentStatus"], "Partially Paid");

    let second = app.pay(job_id, 700.0).await;
    assert_eq!(second["job"]["financials"]["totalReceived"], 1200.0);
    assert_eq!(second["job"]["financials"]["balanceAmount"], 0.0);
    assert_eq!(second["job"]["paymentStatus"], "Paid");

    let response = app
        .put(
            &format!("/api/payments/{}", first["payment"]["_id"].as_str().unwrap()),
            &json!({ "amount": 300.0 }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let stored: Value = app
        .get(&format!("/api/jobs/{}", job_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(stored["financials"]["totalReceived"], 1000.0);
    assert_eq!(stored["financials"]["balanceAmount"], 200.0);
    assert_eq!(stored["paymentStatus"], "Partially Paid");

    let payments: Vec<Value> = app
        .get(&format!("/api/payments?job={}", job_id))
        .await
        .json()
        .await
        .unwrap();
    let sum: f64 = payments.iter().map(|p| p["amount"].as_f64().unwrap()).sum();
    assert_eq!(sum, 1000.0);
}

#[tokio::test]
async fn overpayment_leaves_negative_balance() {
    let app = TestApp::spawn().await;
    let job = app.create_job(1000.0, 0.0).await;
    let job_id = job["_id"].as_str().unwrap();

    let receipt = app.pay(job_id, 1200.0).await;

    assert_eq!(receipt["job"]["financials"]["balanceAmount"], -200.0);
    assert_eq!(receipt["job"]["paymentStatus"], "Paid");
}

#[tokio::test]
async fn amending_payment_applies_only_the_difference() {
    let app = TestApp::spawn().await;
    let job = app.create_job(1000.0, 0.0).await;
    let job_id = job["_id"].as_str().unwrap();

    let receipt = app.pay(job_id, 500.0).await;
    let payment_id = receipt["payment"]["_id"].as_str().unwrap();

    let response = app
        .put(
            &format!("/api/payments/{}", payment_id),
            &json!({ "amount": 300.0 }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let receipt: Value = response.json().await.unwrap();
    assert_eq!(receipt["payment"]["amount"], 300.0);
    assert_eq!(receipt["job"]["financials"]["totalReceived"], 300.0);
    assert_eq!(receipt["job"]["financials"]["balanceAmount"], 700.0);
    assert_eq!(receipt["job"]["paymentStatus"], "Partially Paid");
}

#[tokio::test]
async fn amending_unknown_payment_is_not_found() {
    let app = TestApp::spawn().await;

    let response = app
        .put("/api/payments/missing", &json!({ "amount": 10.0 }))
        .await;

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn concurrent_payments_are_both_counted() {
    let app = TestApp::spawn().await;
    let job = app.create_job(1000.0, 0.0).await;
    let job_id = job["_id"].as_str().unwrap().to_string();

    let (first, second) = tokio::join!(app.pay(&job_id, 100.0), app.pay(&job_id, 100.0));
    assert_ne!(first["payment"]["_id"], second["payment"]["_id"]);

    let stored: Value = app
        .get(&format!("/api/jobs/{}", job_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(stored["financials"]["totalReceived"], 200.0);
    assert_eq!(stored["financials"]["balanceAmount"], 800.0);
}

#[tokio::test]
async fn racing_amendments_and_payment_keep_totals_in_step() {
    let app = TestApp::spawn().await;
    let job = app.create_job(1000.0, 0.0).await;
    let job_id = job["_id"].as_str().unwrap().to_string();
    let receipt = app.pay(&job_id, 200.0).await;
    let path = format!("/api/payments/{}", receipt["payment"]["_id"].as_str().unwrap());

    let first_body = json!({ "amount": 300.0 });
    let second_body = json!({ "amount": 400.0 });
    let third_body = json!({ "job": job_id, "amount": 150.0 });
    let (first, second, third) = tokio::join!(
        app.put(&path, &first_body),
        app.put(&path, &second_body),
        app.post("/api/payments", &third_body),
    );
    assert_eq!(first.status().as_u16(), 200);
    assert_eq!(second.status().as_u16(), 200);
    assert_eq!(third.status().as_u16(), 201);

    let payments: Vec<Value> = app
        .get(&format!("/api/payments?job={}", job_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(payments.len(), 2);
    let sum: f64 = payments.iter().map(|p| p["amount"].as_f64().unwrap()).sum();

    let stored: Value = app
        .get(&format!("/api/jobs/{}", job_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(stored["financials"]["totalReceived"].as_f64().unwrap(), sum);
    assert_eq!(stored["financials"]["balanceAmount"].as_f64().unwrap(), 1000.0 - sum);
}

#[tokio::test]
async fn payment_listing_names_job_and_customer() {
    let app = TestApp::spawn().await;
    let job = app.create_job(1000.0, 0.0).await;
    app.pay(job["_id"].as_str().unwrap(), 250.0).await;

    let payments: Vec<Value> = app.get("/api/payments").await.json().await.unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0]["job"], job["_id"]);
    assert_eq!(payments[0]["jobCode"], job["jobId"]);
    assert_eq!(payments[0]["customerName"], "Ravi Kumar");
}

#[tokio::test]
async fn sub_cent_payment_is_rejected() {
    let app = TestApp::spawn().await;
    let job = app.create_job(1000.0, 0.0).await;
    let job_id = job["_id"].as_str().unwrap();

    let response = app
        .post("/api/payments", &json!({ "job": job_id, "amount": 10.005 }))
        .await;
    assert_eq!(response.status().as_u16(), 400);

    let payments: Vec<Value> = app.get("/api/payments").await.json().await.unwrap();
    assert!(payments.is_empty());
}

#[tokio::test]
async fn payment_for_unknown_job_is_rejected_without_writing() {
    let app = TestApp::spawn().await;

    let response = app
        .post(
            "/api/payments",
            &json!({ "job": "does-not-exist", "amount": 100.0 }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 404);

    let payments: Vec<Value> = app.get("/api/payments").await.json().await.unwrap();
    assert!(payments.is_empty());
}

#[tokio::test]
async fn non_positive_amount_is_rejected() {
    let app = TestApp::spawn().await;
    let job = app.create_job(1000.0, 0.0).await;
    let job_id = job["_id"].as_str().unwrap();

    for amount in [0.0, -50.0] {
        let response = app
            .post("/api/payments", &json!({ "job": job_id, "amount": amount }))
            .await;
        assert_eq!(response.status().as_u16(), 400);
    }

    let stored: Value = app
        .get(&format!("/api/jobs/{}", job_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(stored["financials"]["totalReceived"], 0.0);
    assert_eq!(stored["paymentStatus"], "Unpaid");
}

#[tokio::test]
async fn payments_can_be_listed_per_job() {
    let app = TestApp::spawn().await;
    let first = app.create_job(1000.0, 0.0).await;
    let second = app.create_job(400.0, 0.0).await;
    let first_id = first["_id"].as_str().unwrap();
    let second_id = second["_id"].as_str().unwrap();

    app.pay(first_id, 100.0).await;
    app.pay(first_id, 200.0).await;
    app.pay(second_id, 50.0).await;

    let all: Vec<Value> = app.get("/api/payments").await.json().await.unwrap();
    assert_eq!(all.len(), 3);

    let for_first: Vec<Value> = app
        .get(&format!("/api/payments?job={}", first_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(for_first.len(), 2);
    assert!(for_first.iter().all(|p| p["job"] == first_id));
}

#[tokio::test]
async fn missing_org_header_is_unauthorized() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .post(app.url("/api/payments"))
        .json(&json!({ "job": "anything", "amount": 100.0 }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 401);
}
