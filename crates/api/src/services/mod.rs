//! Business logic services.
//!
//! # Services
//!
//! - `orders` - Order creation and cancellation with stock bookkeeping
//! - `products` - Product catalog
//! - `categories` - Categories and their delete guard
//! - `users` - Accounts and their delete guard
//! - `auth` - Password sign-in and hashing
//! - `uploads` - Product image storage
//!
//! Services borrow the pool and build the repositories they need, so a
//! handler constructs one per request: `OrderService::new(state.pool())`.

pub mod auth;
pub mod categories;
mod error;
pub mod orders;
pub mod products;
pub mod uploads;
pub mod users;
mod validation;

pub use error::{Entity, ErrorKind, ServiceError, Violation};
