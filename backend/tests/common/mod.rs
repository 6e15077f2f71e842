#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use sqlx::SqlitePool;
use tokio::net::TcpListener;
use tower::ServiceExt;
use uuid::Uuid;

use spinsync::{
    build_router,
    db::{self, connections, profiles},
    models::SkillLevel,
    services::{AuthSession, ChangeFeed, Identity, IdentityError, IdentityProvider, SignUpMetadata},
    AppState,
};

/// In-memory identity provider: accounts by email, sessions by token.
#[derive(Default)]
pub struct StubIdentity {
    accounts: Mutex<HashMap<String, (String, Identity)>>,
    tokens: Mutex<HashMap<String, Identity>>,
}

impl StubIdentity {
    fn issue(&self, identity: &Identity) -> String {
        let token = format!("token-{}", Uuid::now_v7());
        self.tokens
            .lock()
            .unwrap()
            .insert(token.clone(), identity.clone());
        token
    }
}

#[async_trait]
impl IdentityProvider for StubIdentity {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignUpMetadata,
    ) -> Result<AuthSession, IdentityError> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(email) {
            return Err(IdentityError::Rejected("User already registered".to_string()));
        }
        let identity = Identity {
            id: Uuid::now_v7(),
            email: Some(email.to_string()),
            metadata: Some(metadata.clone()),
        };
        accounts.insert(email.to_string(), (password.to_string(), identity.clone()));
        drop(accounts);

        let token = self.issue(&identity);
        Ok(AuthSession { identity, access_token: Some(token) })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError> {
        let identity = match self.accounts.lock().unwrap().get(email) {
            Some((stored, identity)) if stored == password => identity.clone(),
            _ => return Err(IdentityError::Rejected("Invalid login credentials".to_string())),
        };
        let token = self.issue(&identity);
        Ok(AuthSession { identity, access_token: Some(token) })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        self.tokens.lock().unwrap().remove(access_token);
        Ok(())
    }

    async fn user(&self, access_token: &str) -> Result<Option<Identity>, IdentityError> {
        Ok(self.tokens.lock().unwrap().get(access_token).cloned())
    }
}

pub struct TestUser {
    pub id: Uuid,
    pub token: String,
}

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    pub identity: Arc<StubIdentity>,
    pub feed: ChangeFeed,
}

impl TestApp {
    pub async fn new() -> Self {
        let pool = db::get_in_memory_pool().await.unwrap();
        let identity = Arc::new(StubIdentity::default());
        let state = AppState::new(pool.clone(), identity.clone());
        let feed = state.feed.clone();

        Self {
            router: build_router(state, &[]),
            pool,
            identity,
            feed,
        }
    }

    /// A signed-in user with a profile, created without going through HTTP.
    pub async fn user(&self, name: &str, city: &str, skill_level: SkillLevel) -> TestUser {
        let metadata = SignUpMetadata {
            name: name.to_string(),
            city: city.to_string(),
            skill_level,
        };
        let email = format!("{}@example.com", name.to_lowercase().replace(' ', "."));
        let session = self.identity.sign_up(&email, "secret123", &metadata).await.unwrap();
        profiles::create_profile(&self.pool, session.identity.id, name, city, skill_level)
            .await
            .unwrap();

        TestUser {
            id: session.identity.id,
            token: session.access_token.unwrap(),
        }
    }

    /// Sends a request from `a` to `b`, has `b` accept it and returns the
    /// connection ids owned by each side.
    pub async fn connect(&self, a: &TestUser, b: &TestUser) -> (Uuid, Uuid) {
        let (status, _) = self
            .send(
                Method::POST,
                "/api/connection-requests",
                Some(&a.token),
                Some(serde_json::json!({ "receiver_id": b.id })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let pending = connections::list_pending_for(&self.pool, b.id, 10).await.unwrap();
        let (status, _) = self
            .send(
                Method::POST,
                &format!("/api/connection-requests/{}/accept", pending[0].id),
                Some(&b.token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let ab = connections::find_connection_between(&self.pool, a.id, b.id)
            .await
            .unwrap()
            .unwrap();
        let ba = connections::find_connection_between(&self.pool, b.id, a.id)
            .await
            .unwrap()
            .unwrap();
        (ab.id, ba.id)
    }

    /// Serves the router on a random local port, for clients that need a
    /// real socket.
    pub async fn serve(&self) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = self.router.clone();
        tokio::spawn(async move { axum::serve(listener, router).await });
        addr
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::String(
                String::from_utf8_lossy(&bytes).into_owned(),
            ))
        };
        (status, json)
    }
}
