//! Product endpoints. Reads are public, mutations admin-only.

use axum::{Json, extract::State, http::StatusCode};

use ecommerce_core::ProductId;

use crate::error::Result;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::RequireAdmin;
use crate::models::{CreateProductRequest, PageQuery, Product, UpdateProductRequest};
use crate::routes::MessageResponse;
use crate::services::products::ProductService;
use crate::state::AppState;

/// `GET /products?page&limit`
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(ProductService::new(state.pool()).list(query).await?))
}

/// `GET /products/{id}`
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Product>> {
    Ok(Json(ProductService::new(state.pool()).get(id).await?))
}

/// `POST /products`
pub async fn create(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = ProductService::new(state.pool()).create(req).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// `PUT /products/{id}`
pub async fn update(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(req): ApiJson<UpdateProductRequest>,
) -> Result<Json<Product>> {
    Ok(Json(ProductService::new(state.pool()).update(id, req).await?))
}

/// `DELETE /products/{id}`
pub async fn delete(
    RequireAdmin(_): RequireAdmin,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<MessageResponse>> {
    ProductService::new(state.pool()).delete(id).await?;
    Ok(Json(MessageResponse::new(format!("Product {id} deleted"))))
}
