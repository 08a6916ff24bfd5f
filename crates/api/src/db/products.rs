//! Product repository for database operations.
//!
//! Products are always read joined with their category so callers get the
//! full [`Product`] shape in one query.

use sqlx::{PgConnection, PgPool};

use ecommerce_core::{CategoryId, Pagination, Price, ProductId};

use super::{RepositoryError, is_foreign_key_violation};
use crate::models::category::Category;
use crate::models::product::{NewProduct, Product, ProductChanges};

/// Columns read by every product query, including order graphs.
///
/// Expects `products p` joined with `categories c`.
pub(crate) const PRODUCT_COLUMNS: &str = "p.id, p.name, p.description, p.price, p.stock, \
     p.img_url, c.id AS category_id, c.name AS category_name";

fn select_products(tail: &str) -> String {
    format!(
        "SELECT {PRODUCT_COLUMNS} FROM products p \
         LEFT JOIN categories c ON c.id = p.category_id {tail}"
    )
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    id: ProductId,
    name: String,
    description: String,
    price: Price,
    stock: i32,
    img_url: String,
    category_id: Option<CategoryId>,
    category_name: Option<String>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        let category = match (row.category_id, row.category_name) {
            (Some(id), Some(name)) => Some(Category { id, name }),
            _ => None,
        };

        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            stock: row.stock,
            img_url: row.img_url,
            category,
        }
    }
}

/// A product id with its price, as locked for an order.
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct LockedProduct {
    pub id: ProductId,
    pub price: Price,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, page: Pagination) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&select_products(
            "ORDER BY p.created_at, p.id LIMIT $1 OFFSET $2",
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&select_products("WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Product::from))
    }

    /// Whether a product with exactly this name exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists_by_name(&self, name: &str) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM products WHERE name = $1)")
            .bind(name)
            .fetch_one(self.pool)
            .await?;

        Ok(exists)
    }

    /// List the products filed under a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&select_products(
            "WHERE p.category_id = $1 ORDER BY p.created_at, p.id",
        ))
        .bind(category_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if `category_id` does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let id: ProductId = sqlx::query_scalar(
            r"
            INSERT INTO products (name, description, price, stock, img_url, category_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            ",
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.stock)
        .bind(&product.img_url)
        .bind(product.category_id)
        .fetch_one(self.pool)
        .await
        .map_err(map_category_fk)?;

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Apply a partial update. Returns `None` if the product does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the new `category_id` does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<Option<Product>, RepositoryError> {
        let updated: Option<ProductId> = sqlx::query_scalar(
            r"
            UPDATE products SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                stock = COALESCE($5, stock),
                img_url = COALESCE($6, img_url),
                category_id = COALESCE($7, category_id)
            WHERE id = $1
            RETURNING id
            ",
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(changes.price)
        .bind(changes.stock)
        .bind(&changes.img_url)
        .bind(changes.category_id)
        .fetch_optional(self.pool)
        .await
        .map_err(map_category_fk)?;

        match updated {
            Some(id) => self.get(id).await,
            None => Ok(None),
        }
    }

    /// Point a product at a new image and return the URL it replaced.
    ///
    /// Returns `None` if the product does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn replace_image(
        &self,
        id: ProductId,
        img_url: &str,
    ) -> Result<Option<String>, RepositoryError> {
        let previous = sqlx::query_scalar(
            r"
            UPDATE products p SET img_url = $2
            FROM (SELECT id, img_url FROM products WHERE id = $1 FOR UPDATE) old
            WHERE p.id = old.id
            RETURNING old.img_url
            ",
        )
        .bind(id)
        .bind(img_url)
        .fetch_optional(self.pool)
        .await?;

        Ok(previous)
    }

    /// Delete a product. Returns `false` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn map_category_fk(e: sqlx::Error) -> RepositoryError {
    if is_foreign_key_violation(&e) {
        return RepositoryError::NotFound;
    }
    RepositoryError::Database(e)
}

/// Lock the requested products that still have stock, in id order.
///
/// Rows come back sorted by id so concurrent orders always acquire locks
/// in the same sequence.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_in_stock(
    conn: &mut PgConnection,
    ids: &[ProductId],
) -> Result<Vec<LockedProduct>, RepositoryError> {
    let rows = sqlx::query_as::<_, LockedProduct>(
        r"
        SELECT id, price FROM products
        WHERE id = ANY($1) AND stock > 0
        ORDER BY id
        FOR UPDATE
        ",
    )
    .bind(ids)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

/// Take one unit of stock. Returns `false` if the product had none left.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn decrement_stock(
    conn: &mut PgConnection,
    id: ProductId,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query("UPDATE products SET stock = stock - 1 WHERE id = $1 AND stock > 0")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() == 1)
}

/// Put one unit of stock back on each product. Returns the rows touched.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn restock(conn: &mut PgConnection, ids: &[ProductId]) -> Result<u64, RepositoryError> {
    let result = sqlx::query("UPDATE products SET stock = stock + 1 WHERE id = ANY($1)")
        .bind(ids)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}
