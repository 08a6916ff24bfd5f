//! Sign-up, sign-in and sign-out.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use tower_sessions::Session;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::extract::ApiJson;
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::{CreateUserRequest, CurrentUser, SignInRequest, User};
use crate::routes::MessageResponse;
use crate::services::auth::AuthService;
use crate::services::users::UserService;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub message: String,
    pub user: User,
}

/// `POST /auth/signup`
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let user = UserService::new(state.pool()).create(req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// `POST /auth/signin`
pub async fn signin(
    State(state): State<AppState>,
    session: Session,
    ApiJson(req): ApiJson<SignInRequest>,
) -> Result<Json<SignInResponse>> {
    let user = AuthService::new(state.pool())
        .sign_in(&req.email, &req.password)
        .await?;

    set_current_user(&session, &CurrentUser::from(&user)).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));

    Ok(Json(SignInResponse {
        message: "Signed in".to_string(),
        user,
    }))
}

/// `POST /auth/signout`
pub async fn signout(
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<MessageResponse>> {
    clear_current_user(&session).await?;
    clear_sentry_user();

    if let Some(user) = user {
        tracing::info!(user_id = %user.id, "User signed out");
    }
    Ok(Json(MessageResponse::new("Signed out")))
}
