//! Image management page
//!
//! Administers the images shown for each service: files on the image
//! host, uploads, and the assignment of an image to a service. Failures
//! here also fill a detailed error panel meant for administrators.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::future::join4;

use super::{Notifier, Outcome, Page};
use crate::api::images::{ImageSummary, ServiceImage, StoredFile};
use crate::api::{ApiError, ClinicClient};
use crate::notification::{DismissReason, NotificationRequest};

/// Largest accepted upload
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Accepted extensions and their MIME types
const IMAGE_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
    ("gif", "image/gif"),
];

/// MIME type for an accepted image file name
pub fn image_mime(file_name: &str) -> Option<&'static str> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let ext = ext.to_lowercase();
    IMAGE_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
}

/// Check a file before uploading it
pub fn validate_upload(file_name: &str, size: usize) -> Result<&'static str, String> {
    let mime = image_mime(file_name).ok_or_else(|| {
        "Formato no permitido. Usa JPG, JPEG, PNG, WEBP o GIF.".to_string()
    })?;
    if size == 0 {
        return Err("El archivo está vacío.".to_string());
    }
    if size > MAX_UPLOAD_BYTES {
        return Err("El archivo supera el límite de 5 MB.".to_string());
    }
    Ok(mime)
}

/// Technical details of the last failure
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorDetails {
    pub message: String,
    pub status: Option<u16>,
    pub url: Option<String>,
    pub method: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ErrorDetails {
    pub fn from_error(err: &ApiError) -> Self {
        let (method, url) = match err.endpoint() {
            Some((method, url)) => (Some(method.to_string()), Some(url.to_string())),
            None => (None, None),
        };
        Self {
            message: err.to_string(),
            status: err.status(),
            url,
            method,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Default)]
pub struct ImagesPage {
    summary: ImageSummary,
    pending: Vec<ServiceImage>,
    services: Vec<ServiceImage>,
    files: Vec<StoredFile>,
    error_details: Option<ErrorDetails>,
    slot: Notifier,
}

impl ImagesPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&self) -> &ImageSummary {
        &self.summary
    }

    pub fn pending(&self) -> &[ServiceImage] {
        &self.pending
    }

    pub fn services(&self) -> &[ServiceImage] {
        &self.services
    }

    pub fn files(&self) -> &[StoredFile] {
        &self.files
    }

    /// Detailed error panel, if the last failure is still shown
    pub fn error_details(&self) -> Option<&ErrorDetails> {
        self.error_details.as_ref()
    }

    pub fn dismiss_error_details(&mut self) {
        self.error_details = None;
    }

    fn fail(&mut self, err: &ApiError, context: &str) -> Outcome {
        self.error_details = Some(ErrorDetails::from_error(err));
        self.slot.failure(err, context)
    }

    /// Upload a file to the image host
    pub async fn upload(&mut self, client: &ClinicClient, file_name: &str, bytes: Vec<u8>) -> Outcome {
        let mime = match validate_upload(file_name, bytes.len()) {
            Ok(mime) => mime,
            Err(message) => return self.slot.notify(NotificationRequest::error(message)),
        };

        match client.upload_image(file_name, mime, bytes).await {
            Ok(uploaded) => {
                tracing::info!(url = %uploaded.url, "Image uploaded");
                self.files.push(StoredFile {
                    name: uploaded.file_name.unwrap_or_else(|| file_name.to_string()),
                    url: uploaded.url,
                    size: None,
                    modified_at: None,
                });
                self.slot
                    .notify(NotificationRequest::success("Imagen subida correctamente."))
            }
            Err(e) => self.fail(&e, "No se pudo subir la imagen."),
        }
    }

    /// Delete a file from the image host
    pub async fn delete_file(&mut self, client: &ClinicClient, name: &str) -> Outcome {
        match client.delete_stored_file(name).await {
            Ok(()) => {
                self.files.retain(|f| f.name != name);
                self.slot
                    .notify(NotificationRequest::success("Archivo eliminado."))
            }
            Err(e) => self.fail(&e, "No se pudo eliminar el archivo."),
        }
    }

    /// Assign an image URL to a service
    pub async fn assign(&mut self, client: &ClinicClient, service_id: i64, url: &str) -> Outcome {
        match client.assign_image(service_id, url).await {
            Ok(()) => {
                if self.set_image(service_id, Some(url.to_string())) == Some(false) {
                    self.summary.con_imagen += 1;
                    self.summary.sin_imagen = self.summary.sin_imagen.saturating_sub(1);
                }
                self.pending.retain(|s| s.id != service_id);
                self.slot
                    .notify(NotificationRequest::success("Imagen asignada al servicio."))
            }
            Err(e) => self.fail(&e, "No se pudo asignar la imagen."),
        }
    }

    /// Remove a service's image
    pub async fn remove(&mut self, client: &ClinicClient, service_id: i64) -> Outcome {
        match client.remove_image(service_id).await {
            Ok(()) => {
                if self.set_image(service_id, None) == Some(true) {
                    self.summary.con_imagen = self.summary.con_imagen.saturating_sub(1);
                    self.summary.sin_imagen += 1;
                }
                if let Some(service) = self.services.iter().find(|s| s.id == service_id) {
                    if !self.pending.iter().any(|s| s.id == service_id) {
                        self.pending.push(service.clone());
                    }
                }
                self.slot
                    .notify(NotificationRequest::success("Imagen removida del servicio."))
            }
            Err(e) => self.fail(&e, "No se pudo remover la imagen."),
        }
    }

    /// Set a service's image, returning whether it had one before.
    /// `None` when the service is not among the loaded ones.
    fn set_image(&mut self, service_id: i64, url: Option<String>) -> Option<bool> {
        let service = self.services.iter_mut().find(|s| s.id == service_id)?;
        let had = service.image_url.is_some();
        service.image_url = url;
        Some(had)
    }
}

#[async_trait]
impl Page for ImagesPage {
    fn title(&self) -> &'static str {
        "Gestión de imágenes"
    }

    async fn load(&mut self, client: &ClinicClient) -> Outcome {
        let (summary, pending, services, files) = join4(
            client.image_summary(),
            client.pending_services(),
            client.service_images(),
            client.stored_files(),
        )
        .await;

        let mut first_error = None;
        match summary {
            Ok(summary) => self.summary = summary,
            Err(e) => first_error = first_error.or(Some(e)),
        }
        match pending {
            Ok(pending) => self.pending = pending,
            Err(e) => first_error = first_error.or(Some(e)),
        }
        match services {
            Ok(services) => self.services = services,
            Err(e) => first_error = first_error.or(Some(e)),
        }
        match files {
            Ok(files) => self.files = files,
            Err(e) => first_error = first_error.or(Some(e)),
        }

        match first_error {
            Some(e) => self.fail(&e, "No se pudo cargar la información de imágenes."),
            None => Outcome::Quiet,
        }
    }

    fn notification(&self) -> &NotificationRequest {
        self.slot.current()
    }

    fn close_notification(&mut self, reason: DismissReason) {
        self.slot.close(reason);
    }
}
