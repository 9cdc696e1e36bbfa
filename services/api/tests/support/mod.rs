//! Shared helpers for the router integration tests

#![allow(dead_code)]

use api::{
    AppState,
    assets::NoopAssetStore,
    config::AppConfig,
    create_router,
    middleware::{Claims, JwtVerifier},
    models::{NewUser, User},
    repositories::{MemoryUserRepository, Repositories},
};
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const SECRET: &str = "integration-secret";

/// Router over in-memory repositories, verifying HS256 tokens
pub struct TestApp {
    pub router: Router,
    pub users: Arc<MemoryUserRepository>,
}

impl TestApp {
    pub fn new() -> Self {
        let config = AppConfig::from_vars(config::Map::new()).expect("default config");
        let users = Arc::new(MemoryUserRepository::new());
        let state = AppState::new(
            &config,
            Repositories::in_memory(users.clone()),
            Arc::new(NoopAssetStore),
            None,
            Some(JwtVerifier::hs256(SECRET)),
        );

        Self {
            router: create_router(state),
            users,
        }
    }

    /// Insert a user and return it with a valid access token
    pub async fn user(&self, first_name: &str) -> (User, String) {
        let user = self
            .users
            .insert(NewUser {
                first_name: first_name.to_string(),
                last_name: "Example".to_string(),
                email: format!("{}@example.com", first_name.to_lowercase()),
            })
            .await;
        let token = token_for(&user);
        (user, token)
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    /// Create a project through the API and return its id
    pub async fn create_project(&self, token: &str, body: Value) -> String {
        let (status, json) = self.send(Method::POST, "/projects", Some(token), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{}", json);
        json["project"]["id"].as_str().unwrap().to_string()
    }
}

pub fn token_for(user: &User) -> String {
    let claims = Claims {
        sub: user.id,
        exp: (chrono::Utc::now().timestamp() + 3600) as u64,
        iat: None,
        token_type: None,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}
