use actix_web::{post, web, HttpResponse, Responder};
use validator::Validate;

use crate::{
    auth::{AuthResponse, LoginRequest, RegisterRequest},
    error::AppError,
    models::UserView,
    state::AppState,
};

/// Exchange a username and password for a bearer token.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let user = state
        .credentials
        .authenticate(&login_data.username, &login_data.password)
        .await?;
    let token = state.tokens.issue(&user.username)?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        user_id: user.id,
    }))
}

/// Create a user account with the `USER` role.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let user = state.credentials.register(&register_data).await?;

    Ok(HttpResponse::Created().json(UserView::from(user)))
}
