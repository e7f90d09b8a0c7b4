//! Public content endpoints
//!
//! - GET  /api/preguntas/acerca-de - About entries
//! - POST /api/contacto/msj - Contact form submission
//! - GET  /api/servicios/noticias - News feed
//! - GET  /api/preguntas/faq - Published questions
//! - POST /api/preguntas/verificar-correo - Patient email lookup
//! - POST /api/preguntas/nueva - Question submission

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::client::{ClinicClient, Deadline};
use super::error::ApiResult;

/// About entry (`{tipo, descripcion}`)
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AboutEntry {
    pub tipo: String,
    pub descripcion: String,
}

/// Contact form submission
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ContactMessage {
    pub nombre: String,
    pub email: String,
    pub telefono: String,
    pub mensaje: String,
}

/// Contact submission acknowledgement
#[derive(Debug, Clone, Deserialize)]
pub struct ContactAck {
    /// `false` when the backend refused the message despite a 2xx status
    #[serde(default = "accepted")]
    pub ok: bool,
    #[serde(default)]
    pub message: Option<String>,
}

fn accepted() -> bool {
    true
}

/// News article
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Article {
    #[serde(default)]
    pub id: Option<i64>,
    pub titulo: String,
    #[serde(default)]
    pub descripcion: String,
    #[serde(default)]
    pub imagen: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub fecha_publicacion: Option<String>,
    #[serde(default)]
    pub fuente: Option<String>,
}

/// Published FAQ entry
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct FaqEntry {
    pub id: i64,
    pub pregunta: String,
    #[serde(default)]
    pub respuesta: String,
}

/// Result of the patient email lookup
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct EmailCheck {
    pub exists: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub apellido_paterno: Option<String>,
    #[serde(default)]
    pub paciente_id: Option<i64>,
}

/// New question posted from the FAQ page
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewQuestion {
    pub email: String,
    pub nombre: String,
    pub pregunta: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paciente_id: Option<i64>,
}

#[derive(Serialize)]
struct EmailBody<'a> {
    email: &'a str,
}

impl ClinicClient {
    /// Fetch the About entries
    pub async fn about_entries(&self) -> ApiResult<Vec<AboutEntry>> {
        self.get_json("/api/preguntas/acerca-de").await
    }

    /// Submit the contact form
    pub async fn send_contact(&self, message: &ContactMessage) -> ApiResult<ContactAck> {
        self.call_json(Method::POST, "/api/contacto/msj", Some(message), Deadline::Default)
            .await
    }

    /// Fetch the news feed
    pub async fn news(&self) -> ApiResult<Vec<Article>> {
        self.get_json("/api/servicios/noticias").await
    }

    /// Fetch published questions
    pub async fn faqs(&self) -> ApiResult<Vec<FaqEntry>> {
        self.get_json("/api/preguntas/faq").await
    }

    /// Check whether an email belongs to a registered patient
    pub async fn check_email(&self, email: &str) -> ApiResult<EmailCheck> {
        self.call_json(
            Method::POST,
            "/api/preguntas/verificar-correo",
            Some(&EmailBody { email }),
            Deadline::Default,
        )
        .await
    }

    /// Submit a new question
    pub async fn submit_question(&self, question: &NewQuestion) -> ApiResult<()> {
        self.call_empty(Method::POST, "/api/preguntas/nueva", Some(question))
            .await
    }
}
