//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use ecommerce_core::{Email, Pagination, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::user::{NewUser, User, UserChanges};

const USER_COLUMNS: &str =
    "id, name, email, phone, country, address, city, is_admin, created_at";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: UserId,
    name: String,
    email: String,
    phone: Option<i64>,
    country: Option<String>,
    address: Option<String>,
    city: Option<String>,
    is_admin: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            email,
            phone: row.phone,
            country: row.country,
            address: row.address,
            city: row.city,
            is_admin: row.is_admin,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        find_user(&mut conn, id).await
    }

    /// Get a user and their password hash by email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| Ok((User::try_from(r.user)?, r.password_hash)))
            .transpose()
    }

    /// List users, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, page: Pagination) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    /// Insert a new user. New accounts are never admins.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            INSERT INTO users (name, email, password_hash, phone, country, address, city)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(&user.name)
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .bind(user.phone)
        .bind(&user.country)
        .bind(&user.address)
        .bind(&user.city)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email"))?;

        User::try_from(row)
    }

    /// Apply a partial update. Returns `None` if the user does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the new email belongs to another user.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: UserId,
        changes: &UserChanges,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                phone = COALESCE($5, phone),
                country = COALESCE($6, country),
                address = COALESCE($7, address),
                city = COALESCE($8, city)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(changes.email.as_ref().map(Email::as_str))
        .bind(&changes.password_hash)
        .bind(changes.phone)
        .bind(&changes.country)
        .bind(&changes.address)
        .bind(&changes.city)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email"))?;

        row.map(User::try_from).transpose()
    }

    /// Grant or revoke admin rights. Returns `None` if the user does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_admin(
        &self,
        id: UserId,
        is_admin: bool,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET is_admin = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(is_admin)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Grant admin rights by email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn promote_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET is_admin = TRUE WHERE email = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }
}

/// Load a user on an existing connection.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_user(
    conn: &mut PgConnection,
    id: UserId,
) -> Result<Option<User>, RepositoryError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(User::try_from).transpose()
}

/// Load a user and hold a key-share lock on the row until the transaction ends.
///
/// A concurrent delete waits for the lock; a user deleted before it is
/// granted reads as absent.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn share_user(
    conn: &mut PgConnection,
    id: UserId,
) -> Result<Option<User>, RepositoryError> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1 FOR KEY SHARE"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(User::try_from).transpose()
}

/// Lock a user row for the rest of the transaction.
///
/// Returns `false` if the user does not exist.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_user(conn: &mut PgConnection, id: UserId) -> Result<bool, RepositoryError> {
    let found: Option<UserId> = sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(found.is_some())
}

/// Count orders owned by a user, cancelled ones included.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn count_orders(conn: &mut PgConnection, id: UserId) -> Result<i64, RepositoryError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

    Ok(count)
}

/// Delete a user row.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if no row was deleted.
pub async fn delete_user(conn: &mut PgConnection, id: UserId) -> Result<(), RepositoryError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

/// Load several users at once on an existing connection.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_users(
    conn: &mut PgConnection,
    ids: &[UserId],
) -> Result<Vec<User>, RepositoryError> {
    let rows = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"
    ))
    .bind(ids)
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(User::try_from).collect()
}
