//! Service error types.
//!
//! Every service operation fails with one of three kinds: the referenced
//! entity is missing, the request breaks a business rule, or something
//! underneath failed. Rule violations carry structured fields so callers can
//! branch on them and clients receive them as JSON details.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use ecommerce_core::{CategoryId, OrderId, Price, ProductId, UserId};

use crate::db::RepositoryError;

/// Kinds of persisted entity a lookup can miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Entity {
    User,
    Category,
    Product,
    Order,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::User => "user",
            Self::Category => "category",
            Self::Product => "product",
            Self::Order => "order",
        })
    }
}

/// A business rule the request broke.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// Requested products that are missing or out of stock.
    #[error("products not available: {}", join_ids(.product_ids))]
    ProductsUnavailable { product_ids: Vec<ProductId> },

    #[error("category {category_id} still has {product_count} products")]
    CategoryHasProducts {
        category_id: CategoryId,
        product_count: i64,
    },

    #[error("order {order_id} is already cancelled")]
    OrderAlreadyCancelled { order_id: OrderId },

    #[error("cannot delete user {user_id}: they have {order_count} orders")]
    UserHasOrders { user_id: UserId, order_count: i64 },

    #[error("an order needs at least one product")]
    EmptyOrder,

    #[error("order total must not exceed {}", Price::MAX)]
    OrderTotalTooLarge,

    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("email is already registered")]
    EmailTaken,

    #[error("category name {name:?} is already taken")]
    CategoryNameTaken { name: String },
}

impl Violation {
    /// Shorthand for [`Violation::InvalidField`].
    pub fn invalid(field: &'static str, reason: impl fmt::Display) -> Self {
        Self::InvalidField {
            field,
            reason: reason.to_string(),
        }
    }
}

fn join_ids(ids: &[ProductId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Coarse classification of a [`ServiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    BadRequest,
    Internal,
}

/// Errors returned by service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The referenced entity does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: Uuid },

    /// The request broke a business rule.
    #[error(transparent)]
    BadRequest(#[from] Violation),

    /// Repository/database error.
    #[error(transparent)]
    Internal(#[from] RepositoryError),

    /// Image storage failed.
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Password hashing failed.
    #[error("password hashing error")]
    Hashing,
}

impl ServiceError {
    /// Build a `NotFound` error for any typed id.
    pub fn not_found(entity: Entity, id: impl Into<Uuid>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Classify the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::BadRequest(_) => ErrorKind::BadRequest,
            Self::Internal(_) | Self::Storage(_) | Self::Hashing => ErrorKind::Internal,
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        Self::Internal(RepositoryError::Database(e))
    }
}
