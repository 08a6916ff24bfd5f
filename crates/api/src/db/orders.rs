//! Order repository for database operations.
//!
//! An order is stored as three pieces: the `orders` header, its single
//! `order_details` price snapshot and the `order_detail_products` join rows.
//! The loaders here reassemble them into [`Order`] graphs.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use ecommerce_core::{OrderDetailId, OrderId, OrderStatus, Pagination, Price, ProductId, UserId};

use super::products::{PRODUCT_COLUMNS, ProductRow};
use super::users::find_users;
use super::RepositoryError;
use crate::models::order::{Order, OrderDetail};
use crate::models::product::Product;

const HEADER_SELECT: &str = r"
    SELECT o.id, o.date, o.status, o.user_id, d.id AS detail_id, d.price AS detail_price
    FROM orders o
    JOIN order_details d ON d.order_id = o.id
";

#[derive(Debug, sqlx::FromRow)]
struct HeaderRow {
    id: OrderId,
    date: DateTime<Utc>,
    status: OrderStatus,
    user_id: UserId,
    detail_id: OrderDetailId,
    detail_price: Price,
}

#[derive(Debug, sqlx::FromRow)]
struct DetailProductRow {
    order_detail_id: OrderDetailId,
    #[sqlx(flatten)]
    product: ProductRow,
}

/// Repository for order reads outside a transaction.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List orders oldest first, optionally paginated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(&self, page: Option<Pagination>) -> Result<Vec<Order>, RepositoryError> {
        let (limit, offset) = page.map_or((None, 0), |p| (Some(p.limit()), p.offset()));

        let mut conn = self.pool.acquire().await?;
        let headers = sqlx::query_as::<_, HeaderRow>(&format!(
            "{HEADER_SELECT} ORDER BY o.date, o.id LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await?;

        assemble(&mut conn, headers).await
    }

    /// Get one order with its user and detail.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        find_order(&mut conn, id).await
    }
}

/// Load one order graph on an existing connection.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
/// Returns `RepositoryError::DataCorruption` if the owning user is missing.
pub async fn find_order(
    conn: &mut PgConnection,
    id: OrderId,
) -> Result<Option<Order>, RepositoryError> {
    let header = sqlx::query_as::<_, HeaderRow>(&format!("{HEADER_SELECT} WHERE o.id = $1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    let Some(header) = header else {
        return Ok(None);
    };
    Ok(assemble(conn, vec![header]).await?.pop())
}

async fn assemble(
    conn: &mut PgConnection,
    headers: Vec<HeaderRow>,
) -> Result<Vec<Order>, RepositoryError> {
    if headers.is_empty() {
        return Ok(Vec::new());
    }

    let mut user_ids: Vec<UserId> = headers.iter().map(|h| h.user_id).collect();
    user_ids.sort_unstable();
    user_ids.dedup();
    let users: HashMap<UserId, _> = find_users(conn, &user_ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let detail_ids: Vec<OrderDetailId> = headers.iter().map(|h| h.detail_id).collect();
    let rows = sqlx::query_as::<_, DetailProductRow>(&format!(
        r"
        SELECT dp.order_detail_id, {PRODUCT_COLUMNS}
        FROM order_detail_products dp
        JOIN products p ON p.id = dp.product_id
        LEFT JOIN categories c ON c.id = p.category_id
        WHERE dp.order_detail_id = ANY($1)
        ORDER BY p.id
        "
    ))
    .bind(&detail_ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut products: HashMap<OrderDetailId, Vec<Product>> = HashMap::new();
    for row in rows {
        products
            .entry(row.order_detail_id)
            .or_default()
            .push(row.product.into());
    }

    headers
        .into_iter()
        .map(|h| {
            let user = users.get(&h.user_id).cloned().ok_or_else(|| {
                RepositoryError::DataCorruption(format!("order {} has no user", h.id))
            })?;
            Ok(Order {
                id: h.id,
                date: h.date,
                status: h.status,
                user,
                order_detail: OrderDetail {
                    id: h.detail_id,
                    price: h.detail_price,
                    products: products.remove(&h.detail_id).unwrap_or_default(),
                },
            })
        })
        .collect()
}

/// Insert an order header with status `accepted`.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert_order(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<OrderId, RepositoryError> {
    let id = sqlx::query_scalar("INSERT INTO orders (user_id, status) VALUES ($1, $2) RETURNING id")
        .bind(user_id)
        .bind(OrderStatus::Accepted)
        .fetch_one(&mut *conn)
        .await?;

    Ok(id)
}

/// Insert the detail snapshot of an order and link its products.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if an insert fails.
pub async fn insert_detail(
    conn: &mut PgConnection,
    order_id: OrderId,
    price: Price,
    product_ids: &[ProductId],
) -> Result<OrderDetailId, RepositoryError> {
    let detail_id: OrderDetailId =
        sqlx::query_scalar("INSERT INTO order_details (order_id, price) VALUES ($1, $2) RETURNING id")
            .bind(order_id)
            .bind(price)
            .fetch_one(&mut *conn)
            .await?;

    sqlx::query(
        r"
        INSERT INTO order_detail_products (order_detail_id, product_id)
        SELECT $1, UNNEST($2::uuid[])
        ",
    )
    .bind(detail_id)
    .bind(product_ids)
    .execute(&mut *conn)
    .await?;

    Ok(detail_id)
}

/// Lock an order row and read its status.
///
/// Returns `None` if the order does not exist.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_order(
    conn: &mut PgConnection,
    id: OrderId,
) -> Result<Option<OrderStatus>, RepositoryError> {
    let status = sqlx::query_scalar("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(status)
}

/// Product ids contained in an order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn product_ids(
    conn: &mut PgConnection,
    order_id: OrderId,
) -> Result<Vec<ProductId>, RepositoryError> {
    let ids = sqlx::query_scalar(
        r"
        SELECT dp.product_id
        FROM order_detail_products dp
        JOIN order_details d ON d.id = dp.order_detail_id
        WHERE d.order_id = $1
        ORDER BY dp.product_id
        ",
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(ids)
}

/// Persist a new order status.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the order does not exist.
pub async fn set_status(
    conn: &mut PgConnection,
    id: OrderId,
    status: OrderStatus,
) -> Result<(), RepositoryError> {
    let result = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
        .bind(id)
        .bind(status)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}
