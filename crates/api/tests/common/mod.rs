#![allow(dead_code)]

use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use autoban_api::auth::jwt::JwtConfig;
use autoban_api::config::{RedisConfig, ServerConfig};
use autoban_api::router::build_app_router;
use autoban_api::state::AppState;
use autoban_core::roles::{Role, Status};
use autoban_db::models::user::{CreateUser, User};
use autoban_db::repositories::{MemorySessionRepo, MemoryUserRepo, SessionRepo, UserRepo};
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret-with-enough-bytes";
pub const TEST_PASSWORD: &str = "Passw0rd!";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        database_url: "postgres://unused".to_string(),
        jwt: JwtConfig::new(TEST_SECRET),
        redis: RedisConfig {
            url: "redis://unused".to_string(),
            op_timeout: std::time::Duration::from_secs(2),
        },
    }
}

/// Everything a test needs: the router plus direct handles on the stores.
#[derive(Clone)]
pub struct TestApp {
    pub state: AppState,
    pub sessions: Arc<MemorySessionRepo>,
    pub users: Arc<MemoryUserRepo>,
}

impl TestApp {
    pub fn new() -> Self {
        let sessions = Arc::new(MemorySessionRepo::new());
        let users = Arc::new(MemoryUserRepo::new());
        Self::with_repos(sessions, users)
    }

    pub fn with_repos(sessions: Arc<MemorySessionRepo>, users: Arc<MemoryUserRepo>) -> Self {
        let session_repo: Arc<dyn SessionRepo> = sessions.clone();
        let user_repo: Arc<dyn UserRepo> = users.clone();
        let state = AppState::new(test_config(), session_repo, user_repo);
        Self {
            state,
            sessions,
            users,
        }
    }

    /// The full application router with the production middleware stack.
    pub fn router(&self) -> Router {
        build_app_router(self.state.clone(), &self.state.config)
    }

    /// Insert a user directly, with a password hashed at minimal cost.
    pub async fn create_user(&self, phone_number: &str, role: Role, status: Status) -> User {
        self.users
            .create(&CreateUser {
                phone_number: phone_number.to_string(),
                password_hash: cheap_hash(TEST_PASSWORD),
                role,
                status,
            })
            .await
            .expect("user creation should succeed")
    }
}

/// Argon2id with tiny parameters; verification reads them back from the hash.
pub fn cheap_hash(password: &str) -> String {
    let params = Params::new(8, 1, 1, None).expect("valid argon2 params");
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(password.as_bytes(), &salt)
        .expect("hashing should succeed")
        .to_string()
}

async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.expect("request should complete")
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}
