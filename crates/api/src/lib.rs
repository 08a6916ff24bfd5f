//! Shop API - REST backend for the catalog, accounts, orders and images.
//!
//! The binary in `main.rs` wires configuration, logging and Sentry around
//! [`routes::app`]. Everything else lives here so the router can be built
//! from tests and from the integration test crate.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
