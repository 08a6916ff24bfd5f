//! Integration tests for the order workflow.
//!
//! Each test gets a fresh database with migrations applied.
//! Requires `DATABASE_URL` pointing at a `PostgreSQL` server.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use sqlx::PgPool;
use uuid::Uuid;

use ecommerce_api::db::{orders, users};
use ecommerce_api::models::PageQuery;
use ecommerce_api::services::orders::OrderService;
use ecommerce_api::services::users::UserService;
use ecommerce_api::services::{Entity, ServiceError, Violation};
use ecommerce_core::{OrderId, OrderStatus, Price, ProductId, UserId};
use ecommerce_integration_tests::{dec, insert_product, insert_user, order_request, stock_of};

/// Time given to a spawned task to reach a row lock held by the test.
const LOCK_WAIT: Duration = Duration::from_millis(200);

// =============================================================================
// Creation
// =============================================================================

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_unavailable_product_rejects_whole_order(pool: PgPool) {
    let user = insert_user(&pool, "u1@example.com").await;
    let p1 = insert_product(&pool, "P1", 5, "10.00", None).await;
    let p2 = insert_product(&pool, "P2", 0, "20.00", None).await;

    let err = OrderService::new(&pool)
        .create(order_request(user.id, &[p1.id, p2.id]))
        .await
        .unwrap_err();

    match err {
        ServiceError::BadRequest(Violation::ProductsUnavailable { product_ids }) => {
            assert_eq!(product_ids, vec![p2.id]);
        }
        other => panic!("expected ProductsUnavailable, got {other:?}"),
    }
    assert_eq!(stock_of(&pool, p1.id).await, 5);

    let orders = OrderService::new(&pool)
        .list(PageQuery::default())
        .await
        .unwrap();
    assert!(orders.is_empty());
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_missing_and_sold_out_ids_are_reported_together(pool: PgPool) {
    let user = insert_user(&pool, "u1@example.com").await;
    let sold_out = insert_product(&pool, "Sold out", 0, "1.00", None).await;
    let missing = ProductId::from(Uuid::new_v4());

    let err = OrderService::new(&pool)
        .create(order_request(user.id, &[missing, sold_out.id]))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::BadRequest(_)));
    let message = err.to_string();
    assert!(message.contains(&missing.to_string()));
    assert!(message.contains(&sold_out.id.to_string()));
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_create_decrements_stock_and_prices_detail(pool: PgPool) {
    let user = insert_user(&pool, "u1@example.com").await;
    let p1 = insert_product(&pool, "P1", 5, "10.00", None).await;
    let p3 = insert_product(&pool, "P3", 3, "15.00", None).await;

    let order = OrderService::new(&pool)
        .create(order_request(user.id, &[p1.id, p3.id]))
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Accepted);
    assert_eq!(order.user.id, user.id);
    assert_eq!(order.order_detail.price.to_string(), "25.00");
    assert_eq!(order.order_detail.products.len(), 2);
    assert_eq!(stock_of(&pool, p1.id).await, 4);
    assert_eq!(stock_of(&pool, p3.id).await, 2);
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_duplicate_ids_collapse_to_one_unit(pool: PgPool) {
    let user = insert_user(&pool, "u1@example.com").await;
    let p1 = insert_product(&pool, "P1", 5, "10.00", None).await;

    let order = OrderService::new(&pool)
        .create(order_request(user.id, &[p1.id, p1.id, p1.id]))
        .await
        .unwrap();

    assert_eq!(order.order_detail.products.len(), 1);
    assert_eq!(order.order_detail.price.to_string(), "10.00");
    assert_eq!(stock_of(&pool, p1.id).await, 4);
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_unknown_user_is_not_found(pool: PgPool) {
    let p1 = insert_product(&pool, "P1", 5, "10.00", None).await;
    let user_id = UserId::from(Uuid::new_v4());

    let err = OrderService::new(&pool)
        .create(order_request(user_id, &[p1.id]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::NotFound { entity: Entity::User, .. }
    ));
    assert_eq!(stock_of(&pool, p1.id).await, 5);
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_empty_order_is_rejected(pool: PgPool) {
    let user = insert_user(&pool, "u1@example.com").await;

    let err = OrderService::new(&pool)
        .create(order_request(user.id, &[]))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::BadRequest(Violation::EmptyOrder)));
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_concurrent_orders_never_oversell(pool: PgPool) {
    let alice = insert_user(&pool, "alice@example.com").await;
    let bob = insert_user(&pool, "bob@example.com").await;
    let last = insert_product(&pool, "Last one", 1, "9.99", None).await;

    let service_a = OrderService::new(&pool);
    let service_b = OrderService::new(&pool);
    let (a, b) = tokio::join!(
        service_a.create(order_request(alice.id, &[last.id])),
        service_b.create(order_request(bob.id, &[last.id])),
    );

    assert_eq!(
        usize::from(a.is_ok()) + usize::from(b.is_ok()),
        1,
        "exactly one order gets the last unit"
    );
    assert_eq!(stock_of(&pool, last.id).await, 0);
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_total_beyond_price_range_is_rejected(pool: PgPool) {
    let user = insert_user(&pool, "u1@example.com").await;
    let p1 = insert_product(&pool, "Yacht", 1, "60000000.00", None).await;
    let p2 = insert_product(&pool, "Jet", 1, "60000000.00", None).await;

    let err = OrderService::new(&pool)
        .create(order_request(user.id, &[p1.id, p2.id]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::BadRequest(Violation::OrderTotalTooLarge)
    ));
    assert_eq!(stock_of(&pool, p1.id).await, 1);
    assert_eq!(stock_of(&pool, p2.id).await, 1);
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_user_deleted_during_order_is_not_found(pool: PgPool) {
    let user = insert_user(&pool, "u1@example.com").await;
    let p1 = insert_product(&pool, "P1", 5, "10.00", None).await;

    let mut deleting = pool.begin().await.unwrap();
    assert!(users::lock_user(&mut *deleting, user.id).await.unwrap());
    users::delete_user(&mut *deleting, user.id).await.unwrap();

    let order_pool = pool.clone();
    let request = order_request(user.id, &[p1.id]);
    let placing =
        tokio::spawn(async move { OrderService::new(&order_pool).create(request).await });
    tokio::time::sleep(LOCK_WAIT).await;
    deleting.commit().await.unwrap();

    let err = placing.await.unwrap().unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound { entity: Entity::User, .. }
    ));
    assert_eq!(stock_of(&pool, p1.id).await, 5);
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_user_delete_waits_for_order_in_flight(pool: PgPool) {
    let user = insert_user(&pool, "u1@example.com").await;
    let p1 = insert_product(&pool, "P1", 5, "10.00", None).await;

    let mut placing = pool.begin().await.unwrap();
    assert!(users::share_user(&mut *placing, user.id).await.unwrap().is_some());

    let delete_pool = pool.clone();
    let user_id = user.id;
    let deleting =
        tokio::spawn(async move { UserService::new(&delete_pool).delete(user_id).await });
    tokio::time::sleep(LOCK_WAIT).await;

    let order_id = orders::insert_order(&mut *placing, user.id).await.unwrap();
    let price = Price::parse(dec("10.00")).unwrap();
    orders::insert_detail(&mut *placing, order_id, price, &[p1.id])
        .await
        .unwrap();
    placing.commit().await.unwrap();

    let err = deleting.await.unwrap().unwrap_err();
    assert!(matches!(
        err,
        ServiceError::BadRequest(Violation::UserHasOrders { order_count: 1, .. })
    ));
}

// =============================================================================
// Cancellation
// =============================================================================

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_cancel_restores_stock_once(pool: PgPool) {
    let user = insert_user(&pool, "u1@example.com").await;
    let p1 = insert_product(&pool, "P1", 5, "10.00", None).await;
    let p3 = insert_product(&pool, "P3", 3, "15.00", None).await;
    let service = OrderService::new(&pool);

    let order = service
        .create(order_request(user.id, &[p1.id, p3.id]))
        .await
        .unwrap();

    let cancelled = service.cancel(order.id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(stock_of(&pool, p1.id).await, 5);
    assert_eq!(stock_of(&pool, p3.id).await, 3);

    let err = service.cancel(order.id).await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::BadRequest(Violation::OrderAlreadyCancelled { order_id }) if order_id == order.id
    ));
    assert_eq!(stock_of(&pool, p1.id).await, 5);
    assert_eq!(stock_of(&pool, p3.id).await, 3);

    let reloaded = service.get(order.id).await.unwrap();
    assert_eq!(reloaded.status, OrderStatus::Cancelled);
    // The price snapshot is never recomputed.
    assert_eq!(reloaded.order_detail.price.to_string(), "25.00");
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_concurrent_cancels_restore_stock_once(pool: PgPool) {
    let user = insert_user(&pool, "u1@example.com").await;
    let p1 = insert_product(&pool, "P1", 5, "10.00", None).await;
    let order = OrderService::new(&pool)
        .create(order_request(user.id, &[p1.id]))
        .await
        .unwrap();
    assert_eq!(stock_of(&pool, p1.id).await, 4);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let pool = pool.clone();
            tokio::spawn(async move { OrderService::new(&pool).cancel(order.id).await })
        })
        .collect();

    let mut cancelled = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => cancelled += 1,
            Err(err) => assert!(matches!(
                err,
                ServiceError::BadRequest(Violation::OrderAlreadyCancelled { .. })
            )),
        }
    }

    assert_eq!(cancelled, 1);
    assert_eq!(stock_of(&pool, p1.id).await, 5);
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_cancel_unknown_order_is_not_found(pool: PgPool) {
    let err = OrderService::new(&pool)
        .cancel(OrderId::from(Uuid::new_v4()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::NotFound { entity: Entity::Order, .. }
    ));
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_stock_never_negative_over_a_sequence(pool: PgPool) {
    let user = insert_user(&pool, "u1@example.com").await;
    let p1 = insert_product(&pool, "P1", 2, "3.50", None).await;
    let service = OrderService::new(&pool);

    let first = service.create(order_request(user.id, &[p1.id])).await.unwrap();
    service.create(order_request(user.id, &[p1.id])).await.unwrap();
    assert!(service.create(order_request(user.id, &[p1.id])).await.is_err());
    assert_eq!(stock_of(&pool, p1.id).await, 0);

    service.cancel(first.id).await.unwrap();
    assert_eq!(stock_of(&pool, p1.id).await, 1);
    service.create(order_request(user.id, &[p1.id])).await.unwrap();
    assert_eq!(stock_of(&pool, p1.id).await, 0);
}

// =============================================================================
// Retrieval
// =============================================================================

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_get_returns_full_graph(pool: PgPool) {
    let user = insert_user(&pool, "u1@example.com").await;
    let p1 = insert_product(&pool, "P1", 5, "10.00", None).await;
    let service = OrderService::new(&pool);

    let created = service.create(order_request(user.id, &[p1.id])).await.unwrap();
    let order = service.get(created.id).await.unwrap();

    assert_eq!(order.user.email.as_str(), "u1@example.com");
    assert_eq!(order.order_detail.products[0].id, p1.id);
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_get_unknown_order_is_not_found(pool: PgPool) {
    let err = OrderService::new(&pool)
        .get(OrderId::from(Uuid::new_v4()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::NotFound { entity: Entity::Order, .. }
    ));
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_list_is_unpaged_unless_asked(pool: PgPool) {
    let user = insert_user(&pool, "u1@example.com").await;
    let p1 = insert_product(&pool, "P1", 20, "1.00", None).await;
    let service = OrderService::new(&pool);

    for _ in 0..12 {
        service.create(order_request(user.id, &[p1.id])).await.unwrap();
    }

    let all = service.list(PageQuery::default()).await.unwrap();
    assert_eq!(all.len(), 12);

    let page = service
        .list(PageQuery {
            page: Some(2),
            limit: Some(5),
        })
        .await
        .unwrap();
    assert_eq!(page.len(), 5);
    assert_eq!(page[0].id, all[5].id);
}
