//! Product catalog management.

use sqlx::PgPool;

use ecommerce_core::{CategoryId, Pagination, ProductId};

use super::validation;
use super::{Entity, ServiceError};
use crate::db::RepositoryError;
use crate::db::categories::CategoryRepository;
use crate::db::products::ProductRepository;
use crate::models::PageQuery;
use crate::models::product::{
    CreateProductRequest, DEFAULT_IMAGE_URL, NewProduct, Product, ProductChanges,
    UpdateProductRequest,
};

const NAME_MIN: usize = 3;
const NAME_MAX: usize = 50;

/// Product catalog service.
pub struct ProductService<'a> {
    products: ProductRepository<'a>,
    categories: CategoryRepository<'a>,
}

impl<'a> ProductService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            products: ProductRepository::new(pool),
            categories: CategoryRepository::new(pool),
        }
    }

    /// List products in insertion order. Page and limit below 1 are raised to 1.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the database query fails.
    pub async fn list(&self, query: PageQuery) -> Result<Vec<Product>, ServiceError> {
        let page = Pagination::clamped(query.page, query.limit);
        Ok(self.products.list(page).await?)
    }

    /// # Errors
    ///
    /// Returns `NotFound` if the product does not exist.
    pub async fn get(&self, id: ProductId) -> Result<Product, ServiceError> {
        self.products
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(Entity::Product, id))
    }

    /// # Errors
    ///
    /// Returns `BadRequest` for invalid fields and `NotFound` if `categoryId`
    /// names a missing category.
    #[tracing::instrument(skip_all, fields(name = %req.name))]
    pub async fn create(&self, req: CreateProductRequest) -> Result<Product, ServiceError> {
        let new_product = NewProduct {
            name: validation::text("name", &req.name, NAME_MIN, NAME_MAX)?,
            description: validation::required("description", &req.description)?,
            price: validation::price(req.price)?,
            stock: validation::stock(req.stock)?,
            img_url: match req.img_url.as_deref() {
                Some(url) => validation::image_url(url)?,
                None => DEFAULT_IMAGE_URL.to_owned(),
            },
            category_id: req.category_id,
        };

        if let Some(category_id) = new_product.category_id {
            self.require_category(category_id).await?;
        }

        let product = self
            .products
            .create(&new_product)
            .await
            .map_err(|e| missing_category(e, new_product.category_id))?;

        tracing::info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Merge the supplied fields onto a product.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product or a new `categoryId` does not exist,
    /// `BadRequest` for invalid fields.
    #[tracing::instrument(skip(self, req))]
    pub async fn update(
        &self,
        id: ProductId,
        req: UpdateProductRequest,
    ) -> Result<Product, ServiceError> {
        let changes = ProductChanges {
            name: req
                .name
                .as_deref()
                .map(|v| validation::text("name", v, NAME_MIN, NAME_MAX))
                .transpose()?,
            description: req
                .description
                .as_deref()
                .map(|v| validation::required("description", v))
                .transpose()?,
            price: req.price.map(validation::price).transpose()?,
            stock: req.stock.map(validation::stock).transpose()?,
            img_url: req
                .img_url
                .as_deref()
                .map(validation::image_url)
                .transpose()?,
            category_id: req.category_id,
        };

        if let Some(category_id) = changes.category_id {
            self.require_category(category_id).await?;
        }

        self.products
            .update(id, &changes)
            .await
            .map_err(|e| missing_category(e, changes.category_id))?
            .ok_or_else(|| ServiceError::not_found(Entity::Product, id))
    }

    /// # Errors
    ///
    /// Returns `NotFound` if the product does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: ProductId) -> Result<(), ServiceError> {
        if !self.products.delete(id).await? {
            return Err(ServiceError::not_found(Entity::Product, id));
        }
        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }

    async fn require_category(&self, id: CategoryId) -> Result<(), ServiceError> {
        match self.categories.get(id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::not_found(Entity::Category, id)),
        }
    }
}

/// The repository reports a dangling `category_id` as `NotFound`.
fn missing_category(e: RepositoryError, category_id: Option<CategoryId>) -> ServiceError {
    match (e, category_id) {
        (RepositoryError::NotFound, Some(id)) => ServiceError::not_found(Entity::Category, id),
        (other, _) => other.into(),
    }
}
