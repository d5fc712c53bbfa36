mod common;

use common::{TestApp, OTHER_ORG_ID, TEST_ORG_ID};
use reqwest::Method;
use serde_json::{json, Value};

#[tokio::test]
async fn admin_manages_users_end_to_end() {
    let app = TestApp::spawn().await;

    let response = app
        .post(
            "/api/users",
            &json!({ "name": "Asha", "email": "asha@example.com", "contact": "9000000001" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let asha: Value = response.json().await.unwrap();
    assert_eq!(asha["role"], "Technician");
    assert_eq!(asha["organization"], TEST_ORG_ID);
    let asha_id = asha["_id"].as_str().unwrap();

    let response = app
        .post(
            "/api/users",
            &json!({ "name": "Asha Again", "email": "asha@example.com" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 409);

    let response = app
        .put(
            &format!("/api/users/{}", asha_id),
            &json!({ "role": "Manager", "address": "MG Road" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["role"], "Manager");
    assert_eq!(updated["name"], "Asha");
    assert_eq!(updated["contact"], "9000000001");
    assert_eq!(updated["address"], "MG Road");

    let users: Vec<Value> = app.get("/api/users").await.json().await.unwrap();
    assert_eq!(users.len(), 1);

    let response = app.delete(&format!("/api/users/{}", asha_id)).await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "User removed");

    let response = app.delete(&format!("/api/users/{}", asha_id)).await;
    assert_eq!(response.status().as_u16(), 404);
    let users: Vec<Value> = app.get("/api/users").await.json().await.unwrap();
    assert!(users.is_empty());
}

#[tokio::test]
async fn non_admin_roles_are_forbidden() {
    let app = TestApp::spawn().await;
    let body = json!({ "name": "Vikram", "email": "vikram@example.com" });

    for role in [Some("Technician"), Some("Manager"), Some("Intern"), None] {
        let response = app
            .send_with_role(Method::GET, TEST_ORG_ID, role, "/api/users", None)
            .await;
        assert_eq!(response.status().as_u16(), 403, "list as {:?}", role);

        let response = app
            .send_with_role(Method::POST, TEST_ORG_ID, role, "/api/users", Some(&body))
            .await;
        assert_eq!(response.status().as_u16(), 403, "create as {:?}", role);
    }

    let response = app
        .send_with_role(
            Method::POST,
            TEST_ORG_ID,
            Some("Superadmin"),
            "/api/users",
            Some(&body),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let created: Value = response.json().await.unwrap();
    let path = format!("/api/users/{}", created["_id"].as_str().unwrap());

    let response = app
        .send_with_role(Method::DELETE, TEST_ORG_ID, Some("Technician"), &path, None)
        .await;
    assert_eq!(response.status().as_u16(), 403);
    let users: Vec<Value> = app.get("/api/users").await.json().await.unwrap();
    assert_eq!(users.len(), 1);
}

#[tokio::test]
async fn users_of_another_organization_are_invisible() {
    let app = TestApp::spawn().await;
    let created: Value = app
        .post(
            "/api/users",
            &json!({ "name": "Meena", "email": "meena@example.com" }),
        )
        .await
        .json()
        .await
        .unwrap();
    let path = format!("/api/users/{}", created["_id"].as_str().unwrap());

    let response = app
        .put_as(OTHER_ORG_ID, &path, &json!({ "name": "Hijacked" }))
        .await;
    assert_eq!(response.status().as_u16(), 404);

    let response = app
        .send_with_role(Method::DELETE, OTHER_ORG_ID, Some("Admin"), &path, None)
        .await;
    assert_eq!(response.status().as_u16(), 404);

    let others: Vec<Value> = app
        .get_as(OTHER_ORG_ID, "/api/users")
        .await
        .json()
        .await
        .unwrap();
    assert!(others.is_empty());

    // Email uniqueness is per organization.
    let response = app
        .post_as(
            OTHER_ORG_ID,
            "/api/users",
            &json!({ "name": "Meena", "email": "meena@example.com" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
}

#[tokio::test]
async fn invalid_user_payload_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/users", &json!({ "name": "Ravi", "email": "not-an-email" }))
        .await;
    assert_eq!(response.status().as_u16(), 422);

    let response = app
        .post("/api/users", &json!({ "name": "", "email": "ravi@example.com" }))
        .await;
    assert_eq!(response.status().as_u16(), 422);
}
