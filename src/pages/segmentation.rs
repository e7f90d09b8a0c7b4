//! Patient segmentation dashboard
//!
//! Filters can change faster than the scoring service answers, so every
//! request carries a ticket and only the latest answer is applied.

use async_trait::async_trait;

use super::{Notifier, Outcome, Page};
use crate::api::ml::{FilterOptions, SegmentStats, Segmentation, SegmentationFilters, SegmentedPatient};
use crate::api::{ApiResult, ClinicClient, RequestTracker, Ticket};
use crate::notification::{DismissReason, NotificationRequest};

#[derive(Default)]
pub struct SegmentationPage {
    options: FilterOptions,
    pub filters: SegmentationFilters,
    patients: Vec<SegmentedPatient>,
    stats: SegmentStats,
    query: String,
    tracker: RequestTracker,
    slot: Notifier,
}

impl SegmentationPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    pub fn stats(&self) -> &SegmentStats {
        &self.stats
    }

    pub fn search(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Patients whose name matches the search text
    pub fn visible(&self) -> Vec<&SegmentedPatient> {
        let needle = self.query.trim().to_lowercase();
        self.patients
            .iter()
            .filter(|p| needle.is_empty() || p.full_name().to_lowercase().contains(&needle))
            .collect()
    }

    /// Share of patients in `segment`, as a percentage
    pub fn share(&self, segment: &str) -> f64 {
        let count = self.stats.distribucion.get(segment).copied().unwrap_or(0);
        if self.stats.total == 0 {
            0.0
        } else {
            f64::from(count) * 100.0 / f64::from(self.stats.total)
        }
    }

    /// Take a ticket for a new segmentation request
    pub fn begin(&self) -> Ticket {
        self.tracker.begin()
    }

    /// Apply a segmentation answer if `ticket` is still the latest.
    ///
    /// Returns `None` when the answer was stale and dropped.
    pub fn accept(&mut self, ticket: Ticket, result: ApiResult<Segmentation>) -> Option<Outcome> {
        if !self.tracker.is_current(ticket) {
            tracing::debug!(ticket = ?ticket, "Discarding stale segmentation answer");
            return None;
        }

        Some(match result {
            Ok(segmentation) => {
                let count = segmentation.pacientes.len();
                self.patients = segmentation.pacientes;
                self.stats = segmentation.estadisticas;
                self.slot.notify(NotificationRequest::info(format!(
                    "Segmentación actualizada: {} pacientes.",
                    count
                )))
            }
            Err(e) => self.slot.failure(&e, "No se pudo segmentar a los pacientes."),
        })
    }

    /// Run the segmentation with the current filters
    pub async fn apply_filters(&mut self, client: &ClinicClient) -> Outcome {
        let ticket = self.begin();
        let result = client.segment_patients(&self.filters).await;
        self.accept(ticket, result).unwrap_or(Outcome::Quiet)
    }

    pub fn clear_filters(&mut self) {
        self.filters = SegmentationFilters::default();
    }
}

impl Drop for SegmentationPage {
    fn drop(&mut self) {
        self.tracker.invalidate();
    }
}

#[async_trait]
impl Page for SegmentationPage {
    fn title(&self) -> &'static str {
        "Segmentación de pacientes"
    }

    async fn load(&mut self, client: &ClinicClient) -> Outcome {
        match client.filter_options().await {
            Ok(options) => {
                self.options = options;
                Outcome::Quiet
            }
            Err(e) => self.slot.failure(&e, "No se pudieron cargar los filtros."),
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
    use crate::api::ApiError;
    use crate::notification::Severity;
    use crate::testing::MockBackend;
    use axum::{
        routing::{get, post},
        Json, Router,
    };

    fn segmentation(names: &[&str]) -> Segmentation {
        Segmentation {
            pacientes: names
                .iter()
                .enumerate()
                .map(|(i, n)| SegmentedPatient {
                    id: i as i64,
                    nombre: n.to_string(),
                    apellido_paterno: None,
                    edad: None,
                    genero: None,
                    segmento: None,
                    total_citas: None,
                    citas_canceladas: None,
                })
                .collect(),
            estadisticas: SegmentStats::default(),
        }
    }

    #[test]
    fn test_stale_answer_is_dropped() {
        let mut page = SegmentationPage::new();
        let first = page.begin();
        let second = page.begin();

        assert!(page.accept(second, Ok(segmentation(&["Nueva"]))).is_some());
        assert!(page.accept(first, Ok(segmentation(&["Vieja", "Otra"]))).is_none());
        assert!(page.accept(first, Err(ApiError::Timeout(10))).is_none());

        let names: Vec<String> = page.visible().iter().map(|p| p.full_name()).collect();
        assert_eq!(names, vec!["Nueva"]);
        assert_eq!(page.notification().severity, Severity::Info);
    }

    #[tokio::test]
    async fn test_load_and_apply() {
        let backend = MockBackend::start(
            Router::new()
                .route(
                    "/api/ml/filter-options",
                    get(|| async {
                        Json(serde_json::json!({"segmentos": ["Frecuente", "Ocasional"], "generos": ["F", "M"]}))
                    }),
                )
                .route(
                    "/api/ml/patients-segmentation",
                    post(|Json(body): Json<serde_json::Value>| async move {
                        assert_eq!(body, serde_json::json!({"segmento": "Frecuente"}));
                        Json(serde_json::json!({
                            "pacientes": [
                                {"id": 1, "nombre": "Ana", "apellido_paterno": "Ruiz", "segmento": "Frecuente"},
                                {"id": 2, "nombre": "Luis", "apellido_paterno": "Pérez", "segmento": "Frecuente"}
                            ],
                            "estadisticas": {"total_pacientes": 8, "distribucion": {"Frecuente": 2, "Ocasional": 6}}
                        }))
                    }),
                ),
        )
        .await;
        let client = backend.client();
        let mut page = SegmentationPage::new();

        assert_eq!(page.load(&client).await, Outcome::Quiet);
        assert_eq!(page.options().segmentos.len(), 2);

        page.filters.segmento = Some("Frecuente".to_string());
        let outcome = page.apply_filters(&client).await;
        assert!(outcome.notification().unwrap().message.contains("2 pacientes"));
        assert_eq!(page.stats().total, 8);
        assert_eq!(page.share("Ocasional"), 75.0);
        assert_eq!(page.share("Nadie"), 0.0);

        page.search("pérez");
        assert_eq!(page.visible().len(), 1);
    }
}
