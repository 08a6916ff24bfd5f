//! Core types for the shop backend.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod pagination;
pub mod password;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use pagination::{Pagination, PaginationError};
pub use password::{PasswordError, validate_password};
pub use price::{Price, PriceError};
pub use status::*;
