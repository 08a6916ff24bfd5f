//! Order status.

use serde::{Deserialize, Serialize};

/// Lifecycle status of an order.
///
/// Orders start out `Accepted`. Cancelling moves them to `Cancelled`, which
/// is terminal: no transition leaves it, including a second cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Accepted,
    Cancelled,
}

/// Error returned for a status change the lifecycle does not allow.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("order cannot move from {from} to {to}")]
pub struct InvalidTransition {
    /// Status the order currently has.
    pub from: OrderStatus,
    /// Status that was requested.
    pub to: OrderStatus,
}

impl OrderStatus {
    /// Returns `true` if no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Compute the status after cancellation.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] when the order is already cancelled.
    pub const fn cancel(self) -> Result<Self, InvalidTransition> {
        match self {
            Self::Accepted => Ok(Self::Cancelled),
            Self::Cancelled => Err(InvalidTransition {
                from: self,
                to: Self::Cancelled,
            }),
        }
    }

    /// The lowercase name used on the wire and in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accepted" => Ok(Self::Accepted),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}
