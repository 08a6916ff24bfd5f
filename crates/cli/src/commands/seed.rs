//! Seed the catalog from a YAML file.
//!
//! Seeding is idempotent: categories are matched by their unique name and
//! products are skipped when one with the same name already exists. A
//! product whose category is neither in the file nor in the database is
//! logged and skipped.

use std::collections::HashMap;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{info, warn};

use ecommerce_api::db::categories::CategoryRepository;
use ecommerce_api::db::products::ProductRepository;
use ecommerce_api::models::{CategoryRequest, CreateProductRequest};
use ecommerce_api::services::categories::CategoryService;
use ecommerce_api::services::products::ProductService;
use ecommerce_core::CategoryId;

use super::connect;

/// Catalog compiled into the binary, used when no file is given.
const DEMO_CATALOG: &str = include_str!("../../data/catalog.yaml");

/// A catalog file.
#[derive(Debug, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub products: Vec<CatalogProduct>,
}

/// One product entry; `category` refers to a category by name.
#[derive(Debug, Deserialize)]
pub struct CatalogProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i64,
    pub category: Option<String>,
    pub img_url: Option<String>,
}

/// What a seeding run changed.
#[derive(Debug, Default, Clone, Copy)]
pub struct SeedSummary {
    pub categories_created: usize,
    pub products_created: usize,
    pub products_skipped: usize,
}

/// Parse a YAML catalog.
///
/// # Errors
///
/// Returns an error if the YAML does not describe a catalog.
pub fn parse_catalog(content: &str) -> Result<Catalog, serde_yaml::Error> {
    serde_yaml::from_str(content)
}

/// Seed from `file`, or from the demo catalog when `file` is `None`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or the database
/// is unreachable.
pub async fn run(file: Option<&Path>) -> Result<SeedSummary, Box<dyn std::error::Error>> {
    let catalog = match file {
        Some(path) => {
            info!(path = %path.display(), "Loading catalog from file");
            let content = tokio::fs::read_to_string(path).await?;
            parse_catalog(&content)?
        }
        None => parse_catalog(DEMO_CATALOG)?,
    };

    info!(
        categories = catalog.categories.len(),
        products = catalog.products.len(),
        "Parsed catalog"
    );

    let pool = connect().await?;
    seed(&pool, &catalog).await
}

/// Insert everything in `catalog` that is not in the database yet.
///
/// # Errors
///
/// Returns an error on database failures. Entries rejected by validation
/// are logged and skipped.
pub async fn seed(
    pool: &PgPool,
    catalog: &Catalog,
) -> Result<SeedSummary, Box<dyn std::error::Error>> {
    let mut summary = SeedSummary::default();
    let categories = CategoryRepository::new(pool);
    let mut ids: HashMap<&str, CategoryId> = HashMap::new();

    for name in &catalog.categories {
        let category = if let Some(existing) = categories.get_by_name(name).await? {
            existing
        } else {
            let created = CategoryService::new(pool)
                .create(CategoryRequest {
                    name: Some(name.clone()),
                })
                .await?;
            summary.categories_created += 1;
            info!(name = %created.name, "Category created");
            created
        };
        ids.insert(name.as_str(), category.id);
    }

    let products = ProductRepository::new(pool);
    let service = ProductService::new(pool);

    for product in &catalog.products {
        if products.exists_by_name(&product.name).await? {
            summary.products_skipped += 1;
            continue;
        }

        let category_id = match product.category.as_deref() {
            None => None,
            Some(name) => {
                if let Some(id) = ids.get(name) {
                    Some(*id)
                } else if let Some(found) = categories.get_by_name(name).await? {
                    ids.insert(name, found.id);
                    Some(found.id)
                } else {
                    warn!(product = %product.name, category = name, "Unknown category, skipping product");
                    summary.products_skipped += 1;
                    continue;
                }
            }
        };

        let request = CreateProductRequest {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            stock: product.stock,
            img_url: product.img_url.clone(),
            category_id,
        };

        match service.create(request).await {
            Ok(created) => {
                summary.products_created += 1;
                info!(product_id = %created.id, name = %created.name, "Product created");
            }
            Err(e) if e.kind() == ecommerce_api::services::ErrorKind::BadRequest => {
                warn!(product = %product.name, error = %e, "Invalid product, skipping");
                summary.products_skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(summary)
}
