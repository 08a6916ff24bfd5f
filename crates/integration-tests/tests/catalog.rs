//! Integration tests for categories and products.
//!
//! Requires `DATABASE_URL` pointing at a `PostgreSQL` server.

#![allow(clippy::unwrap_used)]

use sqlx::PgPool;
use uuid::Uuid;

use ecommerce_api::models::{
    CategoryRequest, CreateProductRequest, DEFAULT_IMAGE_URL, PageQuery, UpdateProductRequest,
};
use ecommerce_api::services::categories::CategoryService;
use ecommerce_api::services::products::ProductService;
use ecommerce_api::services::uploads::UploadService;
use ecommerce_api::services::{Entity, ServiceError, Violation};
use ecommerce_core::CategoryId;
use ecommerce_integration_tests::{
    dec, files_in, image_store, insert_category, insert_product, png_upload, upload_config,
};

fn product_request(name: &str, category_id: Option<CategoryId>) -> CreateProductRequest {
    CreateProductRequest {
        name: name.to_string(),
        description: "A thing".to_string(),
        price: dec("12.50"),
        stock: 4,
        img_url: None,
        category_id,
    }
}

// =============================================================================
// Categories
// =============================================================================

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_category_with_products_cannot_be_deleted(pool: PgPool) {
    let category = insert_category(&pool, "Lamps").await;
    insert_product(&pool, "Desk lamp", 1, "30.00", Some(category.id)).await;

    let err = CategoryService::new(&pool)
        .delete(category.id)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::BadRequest(Violation::CategoryHasProducts { product_count: 1, .. })
    ));
    assert!(CategoryService::new(&pool).get(category.id).await.is_ok());
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_empty_category_is_deleted(pool: PgPool) {
    let category = insert_category(&pool, "Lamps").await;
    let service = CategoryService::new(&pool);

    service.delete(category.id).await.unwrap();

    assert!(matches!(
        service.get(category.id).await.unwrap_err(),
        ServiceError::NotFound { entity: Entity::Category, .. }
    ));
    assert!(matches!(
        service.delete(category.id).await.unwrap_err(),
        ServiceError::NotFound { .. }
    ));
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_category_lists_its_products(pool: PgPool) {
    let lamps = insert_category(&pool, "Lamps").await;
    let chairs = insert_category(&pool, "Chairs").await;
    insert_product(&pool, "Desk lamp", 1, "30.00", Some(lamps.id)).await;
    insert_product(&pool, "Floor lamp", 1, "60.00", Some(lamps.id)).await;
    insert_product(&pool, "Stool", 1, "20.00", Some(chairs.id)).await;

    let found = CategoryService::new(&pool).get(lamps.id).await.unwrap();

    assert_eq!(found.category, lamps);
    let names: Vec<_> = found.products.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Desk lamp", "Floor lamp"]);
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_category_names_are_unique(pool: PgPool) {
    insert_category(&pool, "Lamps").await;

    let err = CategoryService::new(&pool)
        .create(CategoryRequest {
            name: Some("Lamps".to_string()),
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::BadRequest(Violation::CategoryNameTaken { ref name }) if name == "Lamps"
    ));
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_empty_category_update_keeps_name(pool: PgPool) {
    let category = insert_category(&pool, "Lamps").await;

    let updated = CategoryService::new(&pool)
        .update(category.id, CategoryRequest { name: None })
        .await
        .unwrap();

    assert_eq!(updated.name, "Lamps");
}

// =============================================================================
// Products
// =============================================================================

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_product_gets_default_image(pool: PgPool) {
    let product = ProductService::new(&pool)
        .create(product_request("Desk lamp", None))
        .await
        .unwrap();

    assert_eq!(product.img_url, DEFAULT_IMAGE_URL);
    assert_eq!(product.price.to_string(), "12.50");
    assert!(product.category.is_none());
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_product_with_unknown_category_is_not_found(pool: PgPool) {
    let err = ProductService::new(&pool)
        .create(product_request(
            "Desk lamp",
            Some(CategoryId::from(Uuid::new_v4())),
        ))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::NotFound { entity: Entity::Category, .. }
    ));
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_product_update_merges_supplied_fields(pool: PgPool) {
    let category = insert_category(&pool, "Lamps").await;
    let product = insert_product(&pool, "Desk lamp", 3, "30.00", Some(category.id)).await;

    let updated = ProductService::new(&pool)
        .update(
            product.id,
            UpdateProductRequest {
                price: Some(dec("27.99")),
                ..UpdateProductRequest::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.price.to_string(), "27.99");
    assert_eq!(updated.name, "Desk lamp");
    assert_eq!(updated.stock, 3);
    assert_eq!(updated.category.unwrap().id, category.id);
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_product_rejects_negative_stock(pool: PgPool) {
    let mut request = product_request("Desk lamp", None);
    request.stock = -1;

    let err = ProductService::new(&pool).create(request).await.unwrap_err();

    assert!(matches!(
        err,
        ServiceError::BadRequest(Violation::InvalidField { field: "stock", .. })
    ));
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_product_list_pages_in_insertion_order(pool: PgPool) {
    for i in 0..12 {
        insert_product(&pool, &format!("Product {i:02}"), 1, "1.00", None).await;
    }
    let service = ProductService::new(&pool);

    let first = service.list(PageQuery::default()).await.unwrap();
    assert_eq!(first.len(), 10);
    assert_eq!(first[0].name, "Product 00");

    let second = service
        .list(PageQuery {
            page: Some(2),
            limit: None,
        })
        .await
        .unwrap();
    let names: Vec<_> = second.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Product 10", "Product 11"]);

    // Out-of-range values are raised to 1.
    let clamped = service
        .list(PageQuery {
            page: Some(0),
            limit: Some(0),
        })
        .await
        .unwrap();
    assert_eq!(clamped.len(), 1);
    assert_eq!(clamped[0].name, "Product 00");
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_delete_missing_product_is_not_found(pool: PgPool) {
    let product = insert_product(&pool, "Desk lamp", 1, "30.00", None).await;
    let service = ProductService::new(&pool);

    service.delete(product.id).await.unwrap();

    assert!(matches!(
        service.delete(product.id).await.unwrap_err(),
        ServiceError::NotFound { entity: Entity::Product, .. }
    ));
}

// =============================================================================
// Product images
// =============================================================================

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_replacing_image_removes_previous_upload(pool: PgPool) {
    let product = insert_product(&pool, "Desk lamp", 1, "30.00", None).await;
    let config = upload_config();
    let store = image_store(&config);
    let service = UploadService::new(&pool, &store, &config);

    let first = service
        .product_image(product.id, png_upload("first.png"))
        .await
        .unwrap();
    let first_file = store.dir().join(config.uploaded_file_name(&first).unwrap());
    assert_eq!(files_in(store.dir()).await, vec![first_file.clone()]);

    let second = service
        .product_image(product.id, png_upload("second.png"))
        .await
        .unwrap();
    let second_file = store.dir().join(config.uploaded_file_name(&second).unwrap());

    assert_eq!(files_in(store.dir()).await, vec![second_file]);
    let reloaded = ProductService::new(&pool).get(product.id).await.unwrap();
    assert_eq!(reloaded.img_url, second);

    tokio::fs::remove_dir_all(store.dir()).await.unwrap();
}

#[sqlx::test(migrations = "../api/migrations")]
#[ignore = "Requires PostgreSQL"]
async fn test_upload_for_missing_product_leaves_no_file(pool: PgPool) {
    let product = insert_product(&pool, "Desk lamp", 1, "30.00", None).await;
    ProductService::new(&pool).delete(product.id).await.unwrap();
    let config = upload_config();
    let store = image_store(&config);

    let err = UploadService::new(&pool, &store, &config)
        .product_image(product.id, png_upload("lamp.png"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::NotFound { entity: Entity::Product, .. }
    ));
    assert!(files_in(store.dir()).await.is_empty());
}
