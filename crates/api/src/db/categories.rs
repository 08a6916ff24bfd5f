//! Category repository for database operations.

use sqlx::{PgConnection, PgPool};

use ecommerce_core::CategoryId;

use super::{RepositoryError, conflict_on_unique};
use crate::models::category::Category;

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all categories by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>("SELECT id, name FROM categories ORDER BY name")
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// Get a category by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>("SELECT id, name FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Category::from))
    }

    /// Get a category by its exact name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Category>, RepositoryError> {
        let row =
            sqlx::query_as::<_, CategoryRow>("SELECT id, name FROM categories WHERE name = $1")
                .bind(name)
                .fetch_optional(self.pool)
                .await?;

        Ok(row.map(Category::from))
    }

    /// Insert a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, name: &str) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "INSERT INTO categories (name) VALUES ($1) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "category"))?;

        Ok(row.into())
    }

    /// Rename a category. A `None` name leaves the row unchanged.
    ///
    /// Returns `None` if the category does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: CategoryId,
        name: Option<&str>,
    ) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            UPDATE categories SET name = COALESCE($2, name)
            WHERE id = $1
            RETURNING id, name
            ",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "category"))?;

        Ok(row.map(Category::from))
    }
}

/// Lock a category row for the rest of the transaction.
///
/// Returns `false` if the category does not exist.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_category(
    conn: &mut PgConnection,
    id: CategoryId,
) -> Result<bool, RepositoryError> {
    let found: Option<CategoryId> =
        sqlx::query_scalar("SELECT id FROM categories WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

    Ok(found.is_some())
}

/// Count products filed under a category.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn count_products(
    conn: &mut PgConnection,
    id: CategoryId,
) -> Result<i64, RepositoryError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category_id = $1")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

    Ok(count)
}

/// Delete a category row.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if no row was deleted.
pub async fn delete_category(
    conn: &mut PgConnection,
    id: CategoryId,
) -> Result<(), RepositoryError> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}
