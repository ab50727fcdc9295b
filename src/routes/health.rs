use actix_web::{get, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

/// Liveness probe; needs no token.
#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "UP",
        "service": env!("CARGO_PKG_NAME"),
        "timestamp": Utc::now()
    }))
}
