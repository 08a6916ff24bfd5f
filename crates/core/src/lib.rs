//! Shop backend core - shared domain types.
//!
//! This crate provides the types used across every shop backend component:
//! - `api` - The REST backend (catalog, accounts, orders, uploads)
//! - `cli` - Command-line tools for migrations, seeding and user management
//! - `integration-tests` - Database-backed workflow tests
//!
//! # Architecture
//!
//! The core crate contains only types and validation rules - no I/O, no
//! database access, no HTTP. Database encoding is opt-in through the
//! `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Typed UUID ids, emails, prices, order status, pagination
//!   and the account password policy

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
