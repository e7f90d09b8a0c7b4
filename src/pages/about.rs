//! About page
//!
//! Shows the clinic's mission, vision, values and history, as published in
//! `{tipo, descripcion}` entries.

use async_trait::async_trait;

use super::{Notifier, Outcome, Page};
use crate::api::content::AboutEntry;
use crate::api::ClinicClient;
use crate::notification::{DismissReason, NotificationRequest};

/// Kind of About entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Section {
    Mission,
    Vision,
    Values,
    History,
    Other,
}

impl Section {
    pub fn from_tipo(tipo: &str) -> Self {
        match tipo.trim().to_lowercase().as_str() {
            "misión" | "mision" => Section::Mission,
            "visión" | "vision" => Section::Vision,
            "valores" | "valor" => Section::Values,
            "historia" => Section::History,
            _ => Section::Other,
        }
    }

    pub fn heading(&self) -> &'static str {
        match self {
            Section::Mission => "Misión",
            Section::Vision => "Visión",
            Section::Values => "Valores",
            Section::History => "Historia",
            Section::Other => "Más información",
        }
    }
}

#[derive(Default)]
pub struct AboutPage {
    sections: Vec<(Section, Vec<String>)>,
    slot: Notifier,
}

impl AboutPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sections in display order, each with its paragraphs
    pub fn sections(&self) -> &[(Section, Vec<String>)] {
        &self.sections
    }

    fn apply(&mut self, entries: Vec<AboutEntry>) {
        let mut sections: Vec<(Section, Vec<String>)> = Vec::new();
        for entry in entries {
            let section = Section::from_tipo(&entry.tipo);
            match sections.iter_mut().find(|(s, _)| *s == section) {
                Some((_, paragraphs)) => paragraphs.push(entry.descripcion),
                None => sections.push((section, vec![entry.descripcion])),
            }
        }
        sections.sort_by_key(|(s, _)| *s);
        self.sections = sections;
    }
}

#[async_trait]
impl Page for AboutPage {
    fn title(&self) -> &'static str {
        "Acerca de"
    }

    async fn load(&mut self, client: &ClinicClient) -> Outcome {
        match client.about_entries().await {
            Ok(entries) => {
                self.apply(entries);
                Outcome::Quiet
            }
            Err(e) => self
                .slot
                .failure(&e, "No se pudo cargar la información de la clínica."),
        }
    }

    fn notification(&self) -> &NotificationRequest {
        self.slot.current()
    }

    fn close_notification(&mut self, reason: DismissReason) {
        self.slot.close(reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::Severity;
    use crate::testing::{unreachable_client, MockBackend};
    use axum::{routing::get, Json, Router};

    #[tokio::test]
    async fn test_load_groups_entries() {
        let backend = MockBackend::start(Router::new().route(
            "/api/preguntas/acerca-de",
            get(|| async {
                Json(serde_json::json!([
                    {"tipo": "Valores", "descripcion": "Honestidad"},
                    {"tipo": "Misión", "descripcion": "Sonrisas sanas"},
                    {"tipo": "Valores", "descripcion": "Respeto"},
                    {"tipo": "Otro", "descripcion": "Horario extendido"}
                ]))
            }),
        ))
        .await;

        let mut page = AboutPage::new();
        let outcome = page.load(&backend.client()).await;
        assert_eq!(outcome, Outcome::Quiet);

        let sections = page.sections();
        assert_eq!(sections[0].0, Section::Mission);
        assert_eq!(sections[1], (Section::Values, vec!["Honestidad".to_string(), "Respeto".to_string()]));
        assert_eq!(sections[2].0, Section::Other);
    }

    #[tokio::test]
    async fn test_load_failure_notifies() {
        let mut page = AboutPage::new();
        let outcome = page.load(&unreachable_client()).await;
        let note = outcome.notification().unwrap();
        assert_eq!(note.severity, Severity::Error);
        assert!(page.notification().open);
    }

    #[test]
    fn test_section_parsing() {
        assert_eq!(Section::from_tipo("mision"), Section::Mission);
        assert_eq!(Section::from_tipo(" Visión "), Section::Vision);
        assert_eq!(Section::from_tipo("cualquiera"), Section::Other);
    }
}
