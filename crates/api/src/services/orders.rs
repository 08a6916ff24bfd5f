//! Order workflow: creation, cancellation and retrieval.
//!
//! # Creation
//!
//! 1. Collapse the requested product ids into a set (first occurrence wins).
//! 2. Resolve the user and key-share lock it so it cannot be deleted
//!    while the order is being written.
//! 3. Lock every requested product that still has stock.
//! 4. Reject the whole request, listing every missing or sold-out id, if
//!    any requested product was not locked.
//! 5. Take one unit of stock from each product.
//! 6. Price the order; a total beyond the price column range is rejected.
//! 7. Store the header, the priced detail and the product links.
//!
//! # Cancellation
//!
//! 1. Lock the order and check it is still `accepted`.
//! 2. Put one unit of stock back on each of its products.
//! 3. Mark it `cancelled`.
//!
//! Both run in a single transaction. Product rows are locked in id order, so
//! concurrent orders cannot oversell or deadlock, and any early return rolls
//! back every change made so far.

use std::collections::HashSet;

use sqlx::PgPool;

use ecommerce_core::{OrderId, Pagination, Price, ProductId};

use super::{Entity, ServiceError, Violation, validation};
use crate::db::orders::{self, OrderRepository};
use crate::db::products::{self, LockedProduct};
use crate::db::users;
use crate::models::PageQuery;
use crate::models::order::{CreateOrderRequest, Order};

/// Order workflow service.
pub struct OrderService<'a> {
    pool: &'a PgPool,
    orders: OrderRepository<'a>,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            orders: OrderRepository::new(pool),
        }
    }

    /// Place an order for one unit of each requested product.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user does not exist, `BadRequest` if the
    /// product list is empty or any product is missing or out of stock.
    #[tracing::instrument(skip_all, fields(user_id = %req.user_id))]
    pub async fn create(&self, req: CreateOrderRequest) -> Result<Order, ServiceError> {
        let requested = unique_ids(req.products.iter().map(|p| p.id))?;

        let mut tx = self.pool.begin().await?;

        if users::share_user(&mut *tx, req.user_id).await?.is_none() {
            return Err(ServiceError::not_found(Entity::User, req.user_id));
        }

        let locked = products::lock_in_stock(&mut *tx, &requested).await?;
        let missing = unavailable(&requested, &locked);
        if !missing.is_empty() {
            tracing::warn!(product_ids = ?missing, "Order rejected: products unavailable");
            return Err(Violation::ProductsUnavailable {
                product_ids: missing,
            }
            .into());
        }

        for product in &locked {
            if !products::decrement_stock(&mut *tx, product.id).await? {
                // The row is locked, so only a concurrent schema change gets here.
                return Err(Violation::ProductsUnavailable {
                    product_ids: vec![product.id],
                }
                .into());
            }
        }

        let total = Price::sum(locked.iter().map(|p| p.price))
            .map_err(|_| Violation::OrderTotalTooLarge)?;
        let product_ids: Vec<ProductId> = locked.iter().map(|p| p.id).collect();

        let order_id = orders::insert_order(&mut *tx, req.user_id).await?;
        orders::insert_detail(&mut *tx, order_id, total, &product_ids).await?;

        let order = orders::find_order(&mut *tx, order_id)
            .await?
            .ok_or_else(|| ServiceError::not_found(Entity::Order, order_id))?;
        tx.commit().await?;

        tracing::info!(
            order_id = %order.id,
            total = %total,
            products = product_ids.len(),
            "Order created"
        );
        Ok(order)
    }

    /// Cancel an accepted order and restore the stock it took.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the order does not exist and `BadRequest` if it
    /// is already cancelled.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, id: OrderId) -> Result<Order, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let status = orders::lock_order(&mut *tx, id)
            .await?
            .ok_or_else(|| ServiceError::not_found(Entity::Order, id))?;
        let cancelled = status
            .cancel()
            .map_err(|_| Violation::OrderAlreadyCancelled { order_id: id })?;

        let product_ids = orders::product_ids(&mut *tx, id).await?;
        let restocked = products::restock(&mut *tx, &product_ids).await?;
        orders::set_status(&mut *tx, id, cancelled).await?;

        let order = orders::find_order(&mut *tx, id)
            .await?
            .ok_or_else(|| ServiceError::not_found(Entity::Order, id))?;
        tx.commit().await?;

        tracing::info!(order_id = %id, restocked, "Order cancelled");
        Ok(order)
    }

    /// List orders. Paginated only when `page` or `limit` is supplied.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` if a supplied `page` or `limit` is below 1.
    pub async fn list(&self, query: PageQuery) -> Result<Vec<Order>, ServiceError> {
        let page: Option<Pagination> = if query.is_empty() {
            None
        } else {
            Some(validation::page(query)?)
        };
        Ok(self.orders.list(page).await?)
    }

    /// # Errors
    ///
    /// Returns `NotFound` if the order does not exist.
    pub async fn get(&self, id: OrderId) -> Result<Order, ServiceError> {
        self.orders
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(Entity::Order, id))
    }
}

/// Deduplicate requested ids, keeping first-seen order.
fn unique_ids(ids: impl IntoIterator<Item = ProductId>) -> Result<Vec<ProductId>, Violation> {
    let mut seen = HashSet::new();
    let unique: Vec<ProductId> = ids.into_iter().filter(|id| seen.insert(*id)).collect();
    if unique.is_empty() {
        return Err(Violation::EmptyOrder);
    }
    Ok(unique)
}

/// Requested ids that did not come back from the stock lock.
fn unavailable(requested: &[ProductId], locked: &[LockedProduct]) -> Vec<ProductId> {
    let found: HashSet<ProductId> = locked.iter().map(|p| p.id).collect();
    requested
        .iter()
        .copied()
        .filter(|id| !found.contains(id))
        .collect()
}
