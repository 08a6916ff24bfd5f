//! Category endpoints. Reads are public, mutations admin-only.

use axum::{Json, extract::State, http::StatusCode};

use ecommerce_core::CategoryId;

use crate::error::Result;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::RequireAdmin;
use crate::models::{Category, CategoryRequest, CategoryWithProducts};
use crate::routes::MessageResponse;
use crate::services::categories::CategoryService;
use crate::state::AppState;

/// `GET /categories`
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(CategoryService::new(state.pool()).list().await?))
}

/// `GET /categories/{id}`
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<Json<CategoryWithProducts>> {
    Ok(Json(CategoryService::new(state.pool()).get(id).await?))
}

/// `POST /categories`
pub async fn create(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>)> {
    let category = CategoryService::new(state.pool()).create(req).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// `PUT /categories/{id}`
pub async fn update(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CategoryId>,
    ApiJson(req): ApiJson<CategoryRequest>,
) -> Result<Json<Category>> {
    Ok(Json(CategoryService::new(state.pool()).update(id, req).await?))
}

/// `DELETE /categories/{id}`
pub async fn delete(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<Json<MessageResponse>> {
    CategoryService::new(state.pool()).delete(id).await?;
    Ok(Json(MessageResponse::new(format!("Category {id} deleted"))))
}
