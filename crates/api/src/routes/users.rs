//! Account endpoints.
//!
//! Listing, creating and promoting accounts is admin-only. Reading,
//! updating and deleting an account is allowed to its owner and to admins.

use axum::{Json, extract::State, http::StatusCode};
use tower_sessions::Session;

use ecommerce_core::UserId;

use crate::error::{AppError, Result, clear_sentry_user};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{RequireAdmin, RequireAuth, clear_current_user};
use crate::models::{CreateUserRequest, CurrentUser, PageQuery, UpdateUserRequest, User};
use crate::routes::SuccessResponse;
use crate::services::users::UserService;
use crate::state::AppState;

fn ensure_can_manage(user: &CurrentUser, id: UserId) -> Result<()> {
    if user.can_manage(id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You can only manage your own account".to_string(),
        ))
    }
}

/// `GET /users`
pub async fn index(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Vec<User>>> {
    Ok(Json(UserService::new(state.pool()).list(query).await?))
}

/// `GET /users/{id}`
pub async fn show(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<UserId>,
) -> Result<Json<User>> {
    ensure_can_manage(&user, id)?;
    Ok(Json(UserService::new(state.pool()).get(id).await?))
}

/// `POST /users`
pub async fn create(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let user = UserService::new(state.pool()).create(req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// `PUT /users/{id}`
pub async fn update(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<UserId>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> Result<Json<User>> {
    ensure_can_manage(&user, id)?;
    Ok(Json(UserService::new(state.pool()).update(id, req).await?))
}

/// `PUT /users/promote/{id}`
pub async fn promote(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<UserId>,
) -> Result<Json<User>> {
    Ok(Json(UserService::new(state.pool()).promote(id).await?))
}

/// `DELETE /users/{id}`
///
/// Deleting your own account also ends your session.
pub async fn delete(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    session: Session,
    ApiPath(id): ApiPath<UserId>,
) -> Result<Json<SuccessResponse>> {
    ensure_can_manage(&user, id)?;
    UserService::new(state.pool()).delete(id).await?;

    if user.id == id {
        clear_current_user(&session).await?;
        clear_sentry_user();
    }
    Ok(Json(SuccessResponse::new(format!("User {id} deleted"))))
}
