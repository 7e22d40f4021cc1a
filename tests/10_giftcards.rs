mod common;

use anyhow::Result;
use giftcard_api::auth::Role;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::TestServer;

#[tokio::test]
async fn list_starts_empty() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server.client.get(server.url("/api/giftcards")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body, json!({ "status": "OK", "data": [] }));
    Ok(())
}

#[tokio::test]
async fn malformed_id_is_invalid() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server
        .client
        .get(server.url("/api/giftcards/one/not-an-id"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = res.json().await?;
    assert_eq!(body["status"], "ERR");
    Ok(())
}

#[tokio::test]
async fn well_formed_unknown_id_is_not_found() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server
        .client
        .get(server.url(&format!("/api/giftcards/one/{}", uuid_like())))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn admin_crud_round() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.token(Role::Admin);

    let res = server
        .client
        .post(server.url("/api/giftcards"))
        .bearer_auth(&token)
        .json(&json!({ "title": "Steam", "price": "25", "image": "steam.png" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let created: Value = res.json().await?;
    let id = created["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(created["data"]["title"], "Steam");

    let res = server
        .client
        .get(server.url(&format!("/api/giftcards/one/{}", id)))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    // Unlisted keys are dropped, listed ones applied
    let res = server
        .client
        .put(server.url(&format!("/api/giftcards/{}", id)))
        .bearer_auth(&token)
        .json(&json!({ "price": "30", "id": "spoofed", "owner": "me" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await?;
    assert_eq!(updated["data"]["price"], "30");
    assert_eq!(updated["data"]["id"], id.as_str());
    assert!(updated["data"].get("owner").is_none());

    let res = server
        .client
        .delete(server.url(&format!("/api/giftcards/{}", id)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server
        .client
        .delete(server.url(&format!("/api/giftcards/{}", id)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn create_reports_every_failed_rule() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server
        .client
        .post(server.url("/api/giftcards"))
        .bearer_auth(server.token(Role::Admin))
        .json(&json!({ "title": "x", "price": "cheap" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = res.json().await?;
    let errors = body["data"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0]["field"], "title");
    assert_eq!(errors[1]["field"], "price");
    Ok(())
}

#[tokio::test]
async fn create_requires_fields() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server
        .client
        .post(server.url("/api/giftcards"))
        .bearer_auth(server.token(Role::Admin))
        .json(&json!({ "title": "   ", "price": "10" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = res.json().await?;
    assert!(body["data"].as_str().unwrap().contains("title"));
    Ok(())
}

#[tokio::test]
async fn writes_require_admin() -> Result<()> {
    let server = TestServer::spawn().await?;
    let card = json!({ "title": "Steam", "price": "25" });

    let res = server
        .client
        .post(server.url("/api/giftcards"))
        .json(&card)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = server
        .client
        .post(server.url("/api/giftcards"))
        .bearer_auth(server.token(Role::User))
        .json(&card)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server
        .client
        .delete(server.url("/api/giftcards/not-an-id"))
        .bearer_auth(server.token(Role::User))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn update_of_unknown_card_is_not_found() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server
        .client
        .put(server.url(&format!("/api/giftcards/{}", uuid_like())))
        .bearer_auth(server.token(Role::Admin))
        .json(&json!({ "title": "New" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn unmatched_route_is_not_found_envelope() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server.client.get(server.url("/api/nothing/here")).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let body: Value = res.json().await?;
    assert_eq!(body, json!({ "status": "ERR", "data": "endpoint not found" }));

    let res = server.client.patch(server.url("/api/giftcards")).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_bad_request() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server
        .client
        .post(server.url("/api/giftcards"))
        .bearer_auth(server.token(Role::Admin))
        .header("content-type", "application/json")
        .body("{ not json")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = res.json().await?;
    assert_eq!(body["status"], "ERR");
    Ok(())
}

fn uuid_like() -> &'static str {
    "6f1c2a9e-3b4d-4e5f-8a7b-9c0d1e2f3a4b"
}
