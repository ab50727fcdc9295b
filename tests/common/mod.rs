#![allow(dead_code)]

use actix_http::Request;
use actix_web::{
    body::MessageBody,
    dev::{Service, ServiceResponse},
    http::StatusCode,
    test, web, Error,
};
use chrono::Duration;
use serde_json::{json, Value};

use forumhub::{
    auth::{AuthResponse, TokenService},
    config::AdminSeed,
    db,
    state::AppState,
};

pub const SECRET: &str = "integration-secret-with-enough-bytes";
pub const PASSWORD: &str = "engine42";

/// Builds the full application over the given `web::Data<AppState>`.
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($state.clone())
                .wrap(forumhub::auth::AccessFilter)
                .wrap(forumhub::error::error_handlers())
                .configure(forumhub::routes::config),
        )
        .await
    };
}

/// Fresh in-memory database with a cheap bcrypt cost.
pub async fn test_state() -> web::Data<AppState> {
    let pool = db::connect_in_memory().await.expect("in-memory database");
    let tokens = TokenService::new(SECRET, Duration::hours(1)).expect("token service");
    web::Data::new(AppState::new(pool, tokens, 4))
}

pub async fn seed_admin(state: &web::Data<AppState>, username: &str) {
    state
        .credentials
        .ensure_admin(&AdminSeed {
            username: username.to_string(),
            password: PASSWORD.to_string(),
            email: format!("{}@forumhub.local", username),
            name: "Administrator".to_string(),
        })
        .await
        .expect("admin seed");
}

pub async fn register<S, B>(app: &S, username: &str) -> Value
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "username": username,
            "password": PASSWORD,
            "name": format!("{} Tester", username),
            "email": format!("{}@example.com", username)
        }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED, "registering {}", username);
    test::read_body_json(resp).await
}

pub async fn login<S, B>(app: &S, username: &str) -> AuthResponse
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "username": username, "password": PASSWORD }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::OK, "logging in {}", username);
    test::read_body_json(resp).await
}

/// Registers a user and returns a bearer token for them.
pub async fn register_and_login<S, B>(app: &S, username: &str) -> String
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    register(app, username).await;
    login(app, username).await.token
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

pub fn topic_payload(title: &str, message: &str) -> Value {
    json!({ "title": title, "message": message, "course": "Rust" })
}

/// Creates a topic and returns its id.
pub async fn create_topic<S, B>(app: &S, token: &str, title: &str, message: &str) -> i64
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/topics")
        .insert_header(bearer(token))
        .set_json(topic_payload(title, message))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    body["id"].as_i64().expect("topic id")
}
