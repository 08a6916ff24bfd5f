//! Account management.

use sqlx::PgPool;

use ecommerce_core::UserId;

use super::auth::hash_password;
use super::validation;
use super::{Entity, ServiceError, Violation};
use crate::db::RepositoryError;
use crate::db::users::{self, UserRepository};
use crate::models::PageQuery;
use crate::models::user::{CreateUserRequest, NewUser, UpdateUserRequest, User, UserChanges};

/// Account management service.
pub struct UserService<'a> {
    pool: &'a PgPool,
    users: UserRepository<'a>,
}

impl<'a> UserService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            users: UserRepository::new(pool),
        }
    }

    /// List accounts page by page.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` if `page` or `limit` is below 1.
    pub async fn list(&self, query: PageQuery) -> Result<Vec<User>, ServiceError> {
        let page = validation::page(query)?;
        Ok(self.users.list(page).await?)
    }

    /// # Errors
    ///
    /// Returns `NotFound` if the user does not exist.
    pub async fn get(&self, id: UserId) -> Result<User, ServiceError> {
        self.users
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(Entity::User, id))
    }

    /// Validate and register a new account.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` for invalid fields or an email that is already taken.
    #[tracing::instrument(skip_all, fields(email = %req.email))]
    pub async fn create(&self, req: CreateUserRequest) -> Result<User, ServiceError> {
        let name = validation::text("name", &req.name, 3, 80)?;
        let email = validation::email(&req.email)?;
        validation::password(&req.password, &req.confirm_password)?;
        let address = validation::text("address", &req.address, 3, 80)?;
        let phone = validation::phone(req.phone)?;
        let country = validation::text("country", &req.country, 5, 20)?;
        let city = validation::text("city", &req.city, 5, 20)?;

        let new_user = NewUser {
            name,
            email,
            password_hash: hash_password(&req.password)?,
            phone: Some(phone),
            country: Some(country),
            address: Some(address),
            city: Some(city),
        };

        let user = self
            .users
            .create(&new_user)
            .await
            .map_err(email_taken)?;

        tracing::info!(user_id = %user.id, "User created");
        Ok(user)
    }

    /// Merge the supplied fields onto an account.
    ///
    /// A new password is re-hashed. When `confirmPassword` is sent it must
    /// match.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user does not exist, `BadRequest` for invalid
    /// fields or an email that belongs to someone else.
    #[tracing::instrument(skip(self, req))]
    pub async fn update(&self, id: UserId, req: UpdateUserRequest) -> Result<User, ServiceError> {
        let password_hash = match req.password.as_deref() {
            Some(password) => {
                let confirm = req.confirm_password.as_deref().unwrap_or(password);
                validation::password(password, confirm)?;
                Some(hash_password(password)?)
            }
            None => None,
        };

        let changes = UserChanges {
            name: req
                .name
                .as_deref()
                .map(|v| validation::text("name", v, 3, 80))
                .transpose()?,
            email: req.email.as_deref().map(validation::email).transpose()?,
            password_hash,
            phone: req.phone.map(validation::phone).transpose()?,
            country: req
                .country
                .as_deref()
                .map(|v| validation::text("country", v, 5, 20))
                .transpose()?,
            address: req
                .address
                .as_deref()
                .map(|v| validation::text("address", v, 3, 80))
                .transpose()?,
            city: req
                .city
                .as_deref()
                .map(|v| validation::text("city", v, 5, 20))
                .transpose()?,
        };

        self.users
            .update(id, &changes)
            .await
            .map_err(email_taken)?
            .ok_or_else(|| ServiceError::not_found(Entity::User, id))
    }

    /// Grant admin rights.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn promote(&self, id: UserId) -> Result<User, ServiceError> {
        let user = self
            .users
            .set_admin(id, true)
            .await?
            .ok_or_else(|| ServiceError::not_found(Entity::User, id))?;

        tracing::info!(user_id = %user.id, "User promoted to admin");
        Ok(user)
    }

    /// Delete an account that owns no orders.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user does not exist and `BadRequest` if they
    /// still own orders.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: UserId) -> Result<(), ServiceError> {
        let mut tx = self.pool.begin().await?;

        if !users::lock_user(&mut *tx, id).await? {
            return Err(ServiceError::not_found(Entity::User, id));
        }

        let order_count = users::count_orders(&mut *tx, id).await?;
        if order_count > 0 {
            return Err(Violation::UserHasOrders {
                user_id: id,
                order_count,
            }
            .into());
        }

        users::delete_user(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }
}

fn email_taken(e: RepositoryError) -> ServiceError {
    match e {
        RepositoryError::Conflict(_) => Violation::EmailTaken.into(),
        other => other.into(),
    }
}
