//! User domain types.
//!
//! [`User`] is the public shape of an account. It has no password field at
//! all, so no handler can leak a hash by serializing it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ecommerce_core::{Email, UserId};

/// An account (domain type).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub phone: Option<i64>,
    pub country: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /auth/signup` and `POST /users`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(alias = "confirmpassword")]
    pub confirm_password: String,
    pub address: String,
    pub phone: i64,
    pub country: String,
    pub city: String,
}

/// Body of `PUT /users/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(alias = "confirmpassword")]
    pub confirm_password: Option<String>,
    pub address: Option<String>,
    pub phone: Option<i64>,
    pub country: Option<String>,
    pub city: Option<String>,
}

/// Body of `POST /auth/signin`.
#[derive(Debug, Clone, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// A validated account ready to insert.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub password_hash: String,
    pub phone: Option<i64>,
    pub country: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
}

/// A validated partial update.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<Email>,
    pub password_hash: Option<String>,
    pub phone: Option<i64>,
    pub country: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
}
