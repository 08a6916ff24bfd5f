//! Product image uploads.
//!
//! Images are written to a local directory under a fresh UUID name and
//! served back by the router under `/uploads/`.

use std::path::{Path, PathBuf};

use sqlx::PgPool;
use uuid::Uuid;

use ecommerce_core::ProductId;

use super::{Entity, ServiceError, Violation};
use crate::config::ApiConfig;
use crate::db::products::ProductRepository;

/// Accepted image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
}

impl ImageFormat {
    /// Match a file extension (case-insensitive).
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }

    /// Match a MIME type.
    #[must_use]
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        match content_type.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::Webp),
            _ => None,
        }
    }

    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
        }
    }
}

/// A file received from a multipart form.
#[derive(Debug)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Local directory that holds uploaded images.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl ImageStore {
    #[must_use]
    pub const fn new(dir: PathBuf, max_bytes: usize) -> Self {
        Self { dir, max_bytes }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub const fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Check size, extension and content type of an upload.
    ///
    /// # Errors
    ///
    /// Returns `Violation::InvalidField` on the `file` field.
    pub fn check(&self, upload: &ImageUpload) -> Result<ImageFormat, Violation> {
        if upload.bytes.is_empty() {
            return Err(Violation::invalid("file", "is empty"));
        }
        if upload.bytes.len() > self.max_bytes {
            return Err(Violation::invalid(
                "file",
                format_args!("must be at most {} bytes", self.max_bytes),
            ));
        }

        let by_name = upload
            .file_name
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .and_then(ImageFormat::from_extension)
            .ok_or_else(|| Violation::invalid("file", "must be a jpg, jpeg, png or webp file"))?;

        if let Some(content_type) = upload.content_type.as_deref()
            && ImageFormat::from_content_type(content_type) != Some(by_name)
        {
            return Err(Violation::invalid(
                "file",
                format_args!("content type {content_type} does not match the file extension"),
            ));
        }

        Ok(by_name)
    }

    /// Write image bytes under a fresh name and return that name.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory or file cannot be written.
    pub async fn save(&self, format: ImageFormat, bytes: &[u8]) -> std::io::Result<String> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let file_name = format!("{}.{}", Uuid::new_v4(), format.extension());
        tokio::fs::write(self.dir.join(&file_name), bytes).await?;
        Ok(file_name)
    }

    /// Remove a previously saved image, ignoring files that are already gone.
    ///
    /// # Errors
    ///
    /// Returns an I/O error for anything other than a missing file.
    pub async fn remove(&self, file_name: &str) -> std::io::Result<()> {
        match tokio::fs::remove_file(self.dir.join(file_name)).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// Attaches uploaded images to products.
pub struct UploadService<'a> {
    products: ProductRepository<'a>,
    store: &'a ImageStore,
    config: &'a ApiConfig,
}

impl<'a> UploadService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, store: &'a ImageStore, config: &'a ApiConfig) -> Self {
        Self {
            products: ProductRepository::new(pool),
            store,
            config,
        }
    }

    /// Store an image and point the product's `imgUrl` at it.
    ///
    /// Returns the public URL of the image. A previously uploaded image of
    /// the product is removed once the product no longer refers to it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product does not exist, `BadRequest` if the
    /// file is rejected, `Internal` if it cannot be written.
    #[tracing::instrument(skip(self, upload), fields(size = upload.bytes.len()))]
    pub async fn product_image(
        &self,
        product_id: ProductId,
        upload: ImageUpload,
    ) -> Result<String, ServiceError> {
        if self.products.get(product_id).await?.is_none() {
            return Err(ServiceError::not_found(Entity::Product, product_id));
        }

        let format = self.store.check(&upload)?;
        let file_name = self.store.save(format, &upload.bytes).await?;
        let url = self.config.upload_url(&file_name);

        let previous = match self.products.replace_image(product_id, &url).await {
            Ok(Some(previous)) => previous,
            Ok(None) => {
                // Deleted while the file was being written.
                self.discard(&file_name).await;
                return Err(ServiceError::not_found(Entity::Product, product_id));
            }
            Err(e) => {
                self.discard(&file_name).await;
                return Err(e.into());
            }
        };

        if let Some(old) = self.config.uploaded_file_name(&previous)
            && old != file_name
        {
            self.discard(old).await;
        }

        tracing::info!(product_id = %product_id, file_name, "Product image uploaded");
        Ok(url)
    }

    async fn discard(&self, file_name: &str) {
        if let Err(e) = self.store.remove(file_name).await {
            tracing::warn!(file_name, error = %e, "Failed to remove image file");
        }
    }
}
