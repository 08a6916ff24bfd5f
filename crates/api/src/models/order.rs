//! Order domain types.
//!
//! An [`Order`] is returned as a full graph: the owning user, the detail
//! snapshot and the products in it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ecommerce_core::{OrderDetailId, OrderId, OrderStatus, Price, ProductId, UserId};

use super::product::Product;
use super::user::User;

/// An order header with its user and detail populated.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub date: DateTime<Utc>,
    pub status: OrderStatus,
    pub user: User,
    pub order_detail: OrderDetail,
}

/// Price snapshot of an order and the products it contains.
///
/// `price` is fixed when the order is created and is not recomputed when
/// product prices change later.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    pub id: OrderDetailId,
    pub price: Price,
    pub products: Vec<Product>,
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub user_id: UserId,
    pub products: Vec<ProductRef>,
}

/// Reference to a product in an order request.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ProductRef {
    pub id: ProductId,
}
