use actix_web::{delete, get, http::header, post, put, web, HttpResponse, Responder};
use validator::Validate;

use crate::{
    auth::{AdminPrincipal, Principal},
    error::AppError,
    models::{TopicInput, TopicQuery, TopicUpdate},
    state::AppState,
};

/// Lists active topics.
///
/// ## Query Parameters:
/// - `page` (optional): zero-based page index.
/// - `size` (optional): page size, default 20, capped at 100.
/// - `course` (optional): exact course name.
/// - `year` (optional): creation year.
#[get("")]
pub async fn list_topics(
    state: web::Data<AppState>,
    _principal: Principal,
    query: web::Query<TopicQuery>,
) -> Result<impl Responder, AppError> {
    let page = state.topics.list(&query).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Opens a topic; responds 201 with a `Location` header.
#[post("")]
pub async fn create_topic(
    state: web::Data<AppState>,
    principal: Principal,
    topic_data: web::Json<TopicInput>,
) -> Result<impl Responder, AppError> {
    topic_data.validate()?;

    let topic = state.topics.create(&principal, topic_data.into_inner()).await?;

    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, format!("/api/topics/{}", topic.id)))
        .json(topic))
}

#[get("/first-ten")]
pub async fn first_ten(
    state: web::Data<AppState>,
    _principal: Principal,
) -> Result<impl Responder, AppError> {
    let topics = state.topics.first_ten().await?;
    Ok(HttpResponse::Ok().json(topics))
}

#[get("/{id}")]
pub async fn get_topic(
    state: web::Data<AppState>,
    _principal: Principal,
    path: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let topic = state.topics.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(topic))
}

/// Replaces title, message, status and course. Author or administrator only.
#[put("/{id}")]
pub async fn update_topic(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
    topic_data: web::Json<TopicUpdate>,
) -> Result<impl Responder, AppError> {
    topic_data.validate()?;

    let topic = state
        .topics
        .update(&principal, path.into_inner(), topic_data.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(topic))
}

#[delete("/{id}")]
pub async fn delete_topic(
    state: web::Data<AppState>,
    _admin: AdminPrincipal,
    path: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    state.topics.soft_delete(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[post("/{id}/reactivate")]
pub async fn reactivate_topic(
    state: web::Data<AppState>,
    _admin: AdminPrincipal,
    path: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let topic = state.topics.reactivate(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(topic))
}
