//! Category management.

use sqlx::PgPool;

use ecommerce_core::CategoryId;

use super::validation;
use super::{Entity, ServiceError, Violation};
use crate::db::RepositoryError;
use crate::db::categories::{self, CategoryRepository};
use crate::db::products::ProductRepository;
use crate::models::category::{Category, CategoryRequest, CategoryWithProducts};

const NAME_MIN: usize = 3;
const NAME_MAX: usize = 50;

/// Category management service.
pub struct CategoryService<'a> {
    pool: &'a PgPool,
    categories: CategoryRepository<'a>,
    products: ProductRepository<'a>,
}

impl<'a> CategoryService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            categories: CategoryRepository::new(pool),
            products: ProductRepository::new(pool),
        }
    }

    /// # Errors
    ///
    /// Returns `Internal` if the database query fails.
    pub async fn list(&self) -> Result<Vec<Category>, ServiceError> {
        Ok(self.categories.list().await?)
    }

    /// Get a category with its products.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the category does not exist.
    pub async fn get(&self, id: CategoryId) -> Result<CategoryWithProducts, ServiceError> {
        let category = self
            .categories
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(Entity::Category, id))?;
        let products = self.products.list_by_category(id).await?;

        Ok(CategoryWithProducts { category, products })
    }

    /// # Errors
    ///
    /// Returns `BadRequest` if the name is missing, invalid or taken.
    #[tracing::instrument(skip(self))]
    pub async fn create(&self, req: CategoryRequest) -> Result<Category, ServiceError> {
        let name = req
            .name
            .as_deref()
            .ok_or_else(|| Violation::invalid("name", "is required"))?;
        let name = validation::text("name", name, NAME_MIN, NAME_MAX)?;

        let category = self
            .categories
            .create(&name)
            .await
            .map_err(|e| name_taken(e, &name))?;

        tracing::info!(category_id = %category.id, "Category created");
        Ok(category)
    }

    /// Rename a category. An empty request leaves it unchanged.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the category does not exist and `BadRequest` if
    /// the new name is invalid or taken.
    #[tracing::instrument(skip(self))]
    pub async fn update(
        &self,
        id: CategoryId,
        req: CategoryRequest,
    ) -> Result<Category, ServiceError> {
        let name = req
            .name
            .as_deref()
            .map(|n| validation::text("name", n, NAME_MIN, NAME_MAX))
            .transpose()?;

        self.categories
            .update(id, name.as_deref())
            .await
            .map_err(|e| name_taken(e, name.as_deref().unwrap_or_default()))?
            .ok_or_else(|| ServiceError::not_found(Entity::Category, id))
    }

    /// Delete a category that owns no products.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the category does not exist and `BadRequest` if
    /// products are still filed under it.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: CategoryId) -> Result<(), ServiceError> {
        let mut tx = self.pool.begin().await?;

        if !categories::lock_category(&mut *tx, id).await? {
            return Err(ServiceError::not_found(Entity::Category, id));
        }

        let product_count = categories::count_products(&mut *tx, id).await?;
        if product_count > 0 {
            return Err(Violation::CategoryHasProducts {
                category_id: id,
                product_count,
            }
            .into());
        }

        categories::delete_category(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!(category_id = %id, "Category deleted");
        Ok(())
    }
}

fn name_taken(e: RepositoryError, name: &str) -> ServiceError {
    match e {
        RepositoryError::Conflict(_) => Violation::CategoryNameTaken {
            name: name.to_owned(),
        }
        .into(),
        other => other.into(),
    }
}
