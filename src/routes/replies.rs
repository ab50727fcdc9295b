use actix_web::{delete, get, http::header, patch, post, put, web, HttpResponse, Responder};
use validator::Validate;

use crate::{
    auth::Principal,
    error::AppError,
    models::{PageRequest, ReplyInput, ReplyQuery, ReplyUpdate},
    state::AppState,
};

/// Lists the active replies of `topicId` (or `topic_id`), paginated.
#[get("")]
pub async fn list_replies(
    state: web::Data<AppState>,
    _principal: Principal,
    query: web::Query<ReplyQuery>,
) -> Result<impl Responder, AppError> {
    let request = PageRequest::new(query.page, query.size);
    let page = state.replies.list_by_topic(query.topic_id, request).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[post("")]
pub async fn create_reply(
    state: web::Data<AppState>,
    principal: Principal,
    reply_data: web::Json<ReplyInput>,
) -> Result<impl Responder, AppError> {
    reply_data.validate()?;

    let reply = state.replies.create(&principal, reply_data.into_inner()).await?;

    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, format!("/api/replies/{}", reply.id)))
        .json(reply))
}

#[get("/{id}")]
pub async fn get_reply(
    state: web::Data<AppState>,
    _principal: Principal,
    path: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let reply = state.replies.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(reply))
}

#[put("/{id}")]
pub async fn update_reply(
    state: web::Data<AppState>,
    _principal: Principal,
    path: web::Path<i64>,
    reply_data: web::Json<ReplyUpdate>,
) -> Result<impl Responder, AppError> {
    reply_data.validate()?;

    let reply = state
        .replies
        .update(path.into_inner(), reply_data.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(reply))
}

#[delete("/{id}")]
pub async fn delete_reply(
    state: web::Data<AppState>,
    _principal: Principal,
    path: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    state.replies.soft_delete(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[patch("/{id}/reactivate")]
pub async fn reactivate_reply(
    state: web::Data<AppState>,
    _principal: Principal,
    path: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let reply = state.replies.reactivate(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(reply))
}
