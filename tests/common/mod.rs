#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use giftcard_api::auth::{hash_password, Role};
use giftcard_api::database::models::NewUser;
use giftcard_api::database::{MemoryStore, UserRepository};
use giftcard_api::{app, AppConfig, AppContext};

pub const TEST_SECRET: &str = "integration-test-secret";

/// Router served on an ephemeral port, backed by a fresh in-memory store
pub struct TestServer {
    pub base_url: String,
    pub ctx: AppContext,
    pub client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        let ctx = AppContext::new(AppConfig::for_memory(TEST_SECRET), Arc::new(MemoryStore::new()));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("failed to bind ephemeral port")?;
        let base_url = format!("http://{}", listener.local_addr()?);

        let router = app(ctx.clone());
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Ok(Self {
            base_url,
            ctx,
            client: reqwest::Client::new(),
            handle,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Token for an identity that is not necessarily stored
    pub fn token(&self, role: Role) -> String {
        self.ctx
            .tokens
            .issue("Tester", "tester@example.com", role)
            .expect("failed to issue test token")
    }

    /// Insert an admin straight into the store and return its id
    pub async fn seed_admin(&self, email: &str, password: &str) -> Result<String> {
        let digest = hash_password(password)?;
        let user = self
            .ctx
            .store
            .create_user(NewUser::new("Root", email, digest).with_role(Role::Admin))
            .await?;
        Ok(user.id.to_string())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
