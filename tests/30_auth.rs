mod common;

use anyhow::Result;
use giftcard_api::auth::{Claims, Role};
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::TestServer;

async fn login(server: &TestServer, email: &str, password: &str) -> Result<reqwest::Response> {
    Ok(server
        .client
        .post(server.url("/api/users/login"))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await?)
}

#[tokio::test]
async fn login_returns_working_token() -> Result<()> {
    let server = TestServer::spawn().await?;
    server.seed_admin("root@example.com", "rootpw1").await?;

    let res = login(&server, "root@example.com", "rootpw1").await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert!(body["data"].get("password").is_none());
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let claims = server.ctx.tokens.verify(&token)?;
    assert_eq!(claims.email, "root@example.com");
    assert_eq!(claims.role, Role::Admin);

    let res = server
        .client
        .get(server.url("/api/users/protected_adm"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["user"]["email"], "root@example.com");
    Ok(())
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_alike() -> Result<()> {
    let server = TestServer::spawn().await?;
    server.seed_admin("root@example.com", "rootpw1").await?;

    let wrong = login(&server, "root@example.com", "nope123").await?;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    let wrong: Value = wrong.json().await?;

    let unknown = login(&server, "ghost@example.com", "rootpw1").await?;
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    let unknown: Value = unknown.json().await?;

    assert_eq!(wrong, unknown);
    Ok(())
}

#[tokio::test]
async fn protected_needs_a_token() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server.client.get(server.url("/api/users/protected")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = server
        .client
        .get(server.url("/api/users/protected"))
        .bearer_auth("garbage.token.value")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = server
        .client
        .get(server.url("/api/users/protected"))
        .bearer_auth(server.token(Role::User))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn bare_token_without_bearer_prefix_is_accepted() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server
        .client
        .get(server.url("/api/users/protected"))
        .header("authorization", server.token(Role::User))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn user_role_is_forbidden_from_admin_resource() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server
        .client
        .get(server.url("/api/users/protected_adm"))
        .bearer_auth(server.token(Role::User))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let body: Value = res.json().await?;
    assert_eq!(body["status"], "ERR");
    Ok(())
}

#[tokio::test]
async fn expired_token_is_reported() -> Result<()> {
    let server = TestServer::spawn().await?;

    let mut claims = Claims::new("Tester", "tester@example.com", Role::Admin, 60);
    claims.iat -= 120;
    claims.exp = claims.iat + 60;
    let token = server.ctx.tokens.sign(&claims)?;

    let res = server
        .client
        .get(server.url("/api/users/protected"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body: Value = res.json().await?;
    assert_eq!(body["data"], "Token has expired");
    Ok(())
}

#[tokio::test]
async fn health_reports_store() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server.client.get(server.url("/health")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["data"]["database"], "ok");
    Ok(())
}
