//! Product domain types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ecommerce_core::{CategoryId, Price, ProductId};

use super::category::Category;

/// Image shown for products that never had one uploaded.
pub const DEFAULT_IMAGE_URL: &str = "https://example.com/default-image.png";

/// A catalog product.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub stock: i32,
    pub img_url: String,
    pub category: Option<Category>,
}

/// Body of `POST /products`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i64,
    pub img_url: Option<String>,
    pub category_id: Option<CategoryId>,
}

/// Body of `PUT /products/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i64>,
    pub img_url: Option<String>,
    pub category_id: Option<CategoryId>,
}

/// A validated product ready to insert.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub stock: i32,
    pub img_url: String,
    pub category_id: Option<CategoryId>,
}

/// A validated partial update.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub stock: Option<i32>,
    pub img_url: Option<String>,
    pub category_id: Option<CategoryId>,
}

/// Query string for paginated listings.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    /// Returns `true` when neither value was supplied.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.page.is_none() && self.limit.is_none()
    }
}
