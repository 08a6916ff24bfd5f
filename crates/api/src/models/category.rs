//! Category domain types.

use serde::{Deserialize, Serialize};

use ecommerce_core::CategoryId;

use super::product::Product;

/// A catalog category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// A category together with the products filed under it.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryWithProducts {
    #[serde(flatten)]
    pub category: Category,
    pub products: Vec<Product>,
}

/// Body of `POST /categories` and `PUT /categories/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryRequest {
    pub name: Option<String>,
}
