//! Order endpoints. Every route requires a signed-in user.

use axum::{Json, extract::State, http::StatusCode};

use ecommerce_core::OrderId;

use crate::error::{Result, add_breadcrumb};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::RequireAuth;
use crate::models::{CreateOrderRequest, Order, PageQuery};
use crate::routes::SuccessResponse;
use crate::services::orders::OrderService;
use crate::state::AppState;

/// `POST /orders`
pub async fn create(
    RequireAuth(_): RequireAuth,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = OrderService::new(state.pool()).create(req).await?;
    add_breadcrumb("order", "Order created", &[("order_id", order.id.to_string())]);
    Ok((StatusCode::CREATED, Json(order)))
}

/// `GET /orders`, paginated when `page` or `limit` is given.
pub async fn index(
    RequireAuth(_): RequireAuth,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(OrderService::new(state.pool()).list(query).await?))
}

/// `GET /orders/{id}`
pub async fn show(
    RequireAuth(_): RequireAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<Order>> {
    Ok(Json(OrderService::new(state.pool()).get(id).await?))
}

/// `PUT /orders/cancel/{id}`
pub async fn cancel(
    RequireAuth(_): RequireAuth,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<SuccessResponse>> {
    OrderService::new(state.pool()).cancel(id).await?;
    add_breadcrumb("order", "Order cancelled", &[("order_id", id.to_string())]);
    Ok(Json(SuccessResponse::new(format!("Order {id} cancelled"))))
}
