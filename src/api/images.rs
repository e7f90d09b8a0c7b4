//! Image asset endpoints
//!
//! - GET    /api/imagenes/ftp-list - Files stored on the image host
//! - POST   /api/imagenes/upload-ftp - Upload a file (multipart)
//! - DELETE /api/imagenes/eliminar-ftp - Delete a stored file
//! - POST   /api/imagenes/asignar/:id - Assign an image to a service
//! - DELETE /api/imagenes/remover/:id - Remove a service's image
//! - GET    /api/imagenes/resumen - Coverage summary
//! - GET    /api/imagenes/pendientes - Services without an image
//! - GET    /api/imagenes/all - Every service with its image

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::client::ClinicClient;
use super::error::{ApiError, ApiResult};

/// A file stored on the image host
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub modified_at: Option<String>,
}

/// Upload acknowledgement
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub url: String,
    #[serde(default)]
    pub file_name: Option<String>,
}

/// A service and its assigned image
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ServiceImage {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Coverage summary
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ImageSummary {
    #[serde(default)]
    pub total_servicios: u32,
    #[serde(default)]
    pub con_imagen: u32,
    #[serde(default)]
    pub sin_imagen: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AssignBody<'a> {
    image_url: &'a str,
}

impl ClinicClient {
    /// Files stored on the image host
    pub async fn stored_files(&self) -> ApiResult<Vec<StoredFile>> {
        self.get_json("/api/imagenes/ftp-list").await
    }

    /// Upload a file
    pub async fn upload_image(
        &self,
        file_name: &str,
        mime: &str,
        bytes: Vec<u8>,
    ) -> ApiResult<UploadResult> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime)
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("image", part);

        self.call_multipart("/api/imagenes/upload-ftp", form).await
    }

    /// Delete a stored file
    pub async fn delete_stored_file(&self, file_name: &str) -> ApiResult<()> {
        let path = format!(
            "/api/imagenes/eliminar-ftp?fileName={}",
            urlencoding::encode(file_name)
        );
        self.call_empty::<()>(Method::DELETE, &path, None).await
    }

    /// Assign an image to a service
    pub async fn assign_image(&self, service_id: i64, image_url: &str) -> ApiResult<()> {
        self.call_empty(
            Method::POST,
            &format!("/api/imagenes/asignar/{}", service_id),
            Some(&AssignBody { image_url }),
        )
        .await
    }

    /// Remove a service's image
    pub async fn remove_image(&self, service_id: i64) -> ApiResult<()> {
        self.call_empty::<()>(
            Method::DELETE,
            &format!("/api/imagenes/remover/{}", service_id),
            None,
        )
        .await
    }

    /// Coverage summary
    pub async fn image_summary(&self) -> ApiResult<ImageSummary> {
        self.get_json("/api/imagenes/resumen").await
    }

    /// Services still missing an image
    pub async fn pending_services(&self) -> ApiResult<Vec<ServiceImage>> {
        self.get_json("/api/imagenes/pendientes").await
    }

    /// Every service with its image
    pub async fn service_images(&self) -> ApiResult<Vec<ServiceImage>> {
        self.get_json("/api/imagenes/all").await
    }
}
