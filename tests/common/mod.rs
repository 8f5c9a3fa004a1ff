use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use vidstream::{
    AppState, config::Config, create_app, repositories::Repositories,
    session::MemorySessionStore,
};

/// Router over in-process stores
pub struct TestSetup {
    pub state: AppState,
    pub app: Router,
}

/// A registered user and the bearer token issued to them
pub struct TestUser {
    pub id: Uuid,
    pub token: String,
}

impl TestSetup {
    pub fn new() -> Self {
        let config = Config {
            database_url: "postgres://unused".to_string(),
            redis_url: "redis://unused".to_string(),
            jwt_secret: "test-secret".to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            allowed_origins: vec!["http://localhost:5173".to_string()],
            db_max_connections: 1,
            token_ttl_hours: 12,
            bcrypt_cost: 4,
            cookie_secure: false,
        };

        let state = AppState::new(
            Repositories::in_memory(),
            Arc::new(MemorySessionStore::default()),
            config,
        );
        let app = create_app(state.clone());

        Self { state, app }
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
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        self.dispatch(request).await
    }

    /// Runs a hand-built request, decoding the body as JSON when present
    pub async fn dispatch(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
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

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn register(&self, name: &str) -> TestUser {
        let (status, body) = self
            .post(
                "/api/auth/register",
                None,
                json!({
                    "name": name,
                    "email": format!("{name}@example.com"),
                    "password": "password123"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let token = body["token"].as_str().unwrap().to_string();

        let (status, me) = self.get("/api/auth/me", Some(&token)).await;
        assert_eq!(status, StatusCode::OK, "{me}");
        let id = me["data"]["id"].as_str().unwrap().parse().unwrap();

        TestUser { id, token }
    }

    /// Uploads a public long video owned by `owner`, returning its id
    pub async fn upload_video(&self, owner: &TestUser, allow_comments: bool) -> String {
        let (status, body) = self
            .post(
                "/api/videos",
                Some(&owner.token),
                json!({
                    "title": "Launch day",
                    "description": "walkthrough",
                    "videoUrl": "https://cdn.example.com/launch.mp4",
                    "videoType": "long",
                    "allowComments": allow_comments
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_str().unwrap().to_string()
    }
}
