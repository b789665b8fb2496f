#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use contact_api::auth::hash_password;
use contact_api::config::AppConfig;
use contact_api::database::models::{AddressDraft, ContactDraft, NewUser, User};
use contact_api::database::{MemoryStore, OwnerRef, Store};
use contact_api::{app, AppState};

/// Router over a fresh in-memory store, driven in process with `oneshot`.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<dyn Store>,
}

impl TestApp {
    pub fn new() -> Self {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let router = app(AppState::new(store.clone(), AppConfig::development()));
        Self { router, store }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, token);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&json)?)
            }
            None => Body::empty(),
        };
        self.send(builder.body(body)?).await
    }

    pub async fn send(&self, request: Request<Body>) -> Result<(StatusCode, Value)> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
        };
        Ok((status, json))
    }

    pub async fn get(&self, uri: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::PATCH, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    /// Account whose username, password and token all equal `name`.
    pub async fn seed_user(&self, name: &str) -> Result<User> {
        let mut user = self
            .store
            .insert_user(NewUser {
                username: name.to_string(),
                password_hash: hash_password(name)?,
                name: name.to_string(),
            })
            .await?;
        self.store.set_user_token(user.id, Some(name)).await?;
        user.token = Some(name.to_string());
        Ok(user)
    }

    pub async fn seed_contact(&self, owner: &User) -> Result<i64> {
        let contact = self
            .store
            .insert_contact(
                OwnerRef::from(owner),
                ContactDraft {
                    first_name: "test".into(),
                    last_name: Some("test".into()),
                    email: Some("test@gmail.com".into()),
                    phone: Some("111111111111".into()),
                },
            )
            .await?;
        Ok(contact.id)
    }

    pub async fn seed_address(&self, owner: &User, contact_id: i64) -> Result<i64> {
        let address = self
            .store
            .insert_address(
                OwnerRef::from(owner),
                contact_id,
                AddressDraft {
                    street: Some("test".into()),
                    city: Some("test".into()),
                    province: Some("test".into()),
                    country: "test".into(),
                    postal_code: Some("111111".into()),
                },
            )
            .await?
            .context("seed contact is not owned by the seed user")?;
        Ok(address.id)
    }

    /// Twenty contacts `first N` / `last N` / `testN@gmail.com` / `11111N`.
    pub async fn seed_search(&self, owner: &User) -> Result<()> {
        for i in 0..20 {
            self.store
                .insert_contact(
                    OwnerRef::from(owner),
                    ContactDraft {
                        first_name: format!("first {}", i),
                        last_name: Some(format!("last {}", i)),
                        email: Some(format!("test{}@gmail.com", i)),
                        phone: Some(format!("11111{}", i)),
                    },
                )
                .await?;
        }
        Ok(())
    }
}

/// The built binary on a free port, killed when dropped.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let child = Command::new(env!("CARGO_BIN_EXE_contact-api"))
            .arg("serve")
            .env("APP_ENV", "development")
            .env("STORAGE_BACKEND", "memory")
            .env("HOST", "127.0.0.1")
            .env("PORT", port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .context("failed to spawn server binary")?;

        let server = Self { port, base_url, child };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        let url = format!("{}/health", self.base_url);
        while Instant::now() < deadline {
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == reqwest::StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
