//! Product image upload.

use axum::{
    Json,
    extract::{
        Multipart, State,
        multipart::MultipartRejection,
    },
};
use serde::Serialize;

use ecommerce_core::ProductId;

use crate::error::{AppError, Result};
use crate::extract::ApiPath;
use crate::middleware::RequireAuth;
use crate::services::uploads::{ImageUpload, UploadService};
use crate::state::AppState;

/// Multipart field that carries the image.
const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub img_url: String,
}

/// `POST /file-upload/uploadImage/{productId}`
pub async fn upload_product_image(
    RequireAuth(_): RequireAuth,
    State(state): State<AppState>,
    ApiPath(product_id): ApiPath<ProductId>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>> {
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(String::from);
        let content_type = field.content_type().map(String::from);
        let bytes = field.bytes().await?;
        upload = Some(ImageUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
        break;
    }

    let upload = upload.ok_or_else(|| {
        AppError::BadRequest(format!("multipart field `{FILE_FIELD}` is required"))
    })?;

    let img_url = UploadService::new(state.pool(), state.images(), state.config())
        .product_image(product_id, upload)
        .await?;

    Ok(Json(UploadResponse { img_url }))
}
