//! In-process harness for handler tests: the real router over memory stores
//! and a scripted model, plus a signed token for one user.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use crate::{
    analyzer::{testing::ScriptedModel, Analyzer, NutritionModel},
    app::build_app,
    auth::{claims::TokenKind, jwt::sign_for_tests},
    config::{AppConfig, GeminiConfig, JwtConfig},
    meals::memory::MemoryMealStore,
    state::AppState,
    users::repo::memory::MemoryUserStore,
};

pub struct TestApp {
    pub config: Arc<AppConfig>,
    pub meals: Arc<MemoryMealStore>,
    pub users: Arc<MemoryUserStore>,
    pub model: Arc<ScriptedModel>,
    pub user_id: Uuid,
    token: String,
}

pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://unused".into(),
        db_max_connections: 1,
        jwt: JwtConfig {
            secret: "test-secret".into(),
            issuer: "mealmind".into(),
            audience: "mealmind-users".into(),
        },
        gemini: GeminiConfig::default(),
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_model(ScriptedModel::default())
    }

    pub fn with_model(model: ScriptedModel) -> Self {
        let config = Arc::new(test_config());
        let user_id = Uuid::new_v4();
        let token = sign_for_tests(&config.jwt, user_id, TokenKind::Access);
        Self {
            config,
            meals: Arc::new(MemoryMealStore::default()),
            users: Arc::new(MemoryUserStore::default()),
            model: Arc::new(model),
            user_id,
            token,
        }
    }

    /// Same stores, different caller.
    pub fn as_user(&self, user_id: Uuid) -> Self {
        Self {
            config: self.config.clone(),
            meals: self.meals.clone(),
            users: self.users.clone(),
            model: self.model.clone(),
            user_id,
            token: sign_for_tests(&self.config.jwt, user_id, TokenKind::Access),
        }
    }

    pub fn router(&self) -> Router {
        let state = AppState::from_parts(
            self.config.clone(),
            self.meals.clone(),
            self.users.clone(),
            Arc::new(Analyzer::new(self.model.clone() as Arc<dyn NutritionModel>)),
        );
        build_app(state)
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    pub async fn send(&self, request: Request<Body>) -> RawResponse {
        let response = self
            .router()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body")
            .to_vec();
        RawResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn authed(&self, method: &str, uri: &str, content_type: &str, body: Vec<u8>) -> RawResponse {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, self.bearer())
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .expect("request");
        self.send(request).await
    }

    pub async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        self.authed("GET", uri, "application/json", Vec::new())
            .await
            .json()
    }

    pub async fn send_json(&self, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        let bytes = serde_json::to_vec(&body).expect("serialize");
        self.authed(method, uri, "application/json", bytes)
            .await
            .json()
    }
}

impl RawResponse {
    pub fn json(self) -> (StatusCode, Value) {
        let value = if self.body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&self.body).unwrap_or_else(|e| {
                panic!(
                    "non-JSON body ({e}): {}",
                    String::from_utf8_lossy(&self.body)
                )
            })
        };
        (self.status, value)
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).expect("utf-8 body")
    }
}

/// Single-part `multipart/form-data` body; returns (content type, body).
pub fn multipart(field: &str, content_type: &str, data: &[u8]) -> (String, Vec<u8>) {
    let boundary = "mealmind-test-boundary";
    let mut body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"upload\"\r\n\
         Content-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}
