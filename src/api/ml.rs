//! ML scoring endpoints
//!
//! The scoring service is external; these calls only ship inputs and
//! decode its answers.
//!
//! - GET  /api/ml/filter-options - Segmentation filter metadata
//! - POST /api/ml/patients-segmentation - Segment patients
//! - POST /api/ml/predict-no-show - No-show risk for an appointment

use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::client::{ClinicClient, Deadline};
use super::error::ApiResult;

/// Filter metadata offered by the segmentation service
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct FilterOptions {
    #[serde(default)]
    pub segmentos: Vec<String>,
    #[serde(default)]
    pub generos: Vec<String>,
    #[serde(default)]
    pub edad_min: Option<u32>,
    #[serde(default)]
    pub edad_max: Option<u32>,
}

/// Filters applied to a segmentation request
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SegmentationFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segmento: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genero: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edad_min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edad_max: Option<u32>,
}

/// A segmented patient
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SegmentedPatient {
    pub id: i64,
    pub nombre: String,
    #[serde(default)]
    pub apellido_paterno: Option<String>,
    #[serde(default)]
    pub edad: Option<u32>,
    #[serde(default)]
    pub genero: Option<String>,
    #[serde(default)]
    pub segmento: Option<String>,
    #[serde(default)]
    pub total_citas: Option<u32>,
    #[serde(default)]
    pub citas_canceladas: Option<u32>,
}

impl SegmentedPatient {
    /// "Nombre Apellido" as displayed in the table
    pub fn full_name(&self) -> String {
        match &self.apellido_paterno {
            Some(last) if !last.is_empty() => format!("{} {}", self.nombre, last),
            _ => self.nombre.clone(),
        }
    }
}

/// Aggregate statistics of a segmentation run
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct SegmentStats {
    #[serde(default, alias = "total_pacientes")]
    pub total: u32,
    #[serde(default)]
    pub distribucion: BTreeMap<String, u32>,
}

/// Segmentation answer
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Segmentation {
    #[serde(default)]
    pub pacientes: Vec<SegmentedPatient>,
    #[serde(default)]
    pub estadisticas: SegmentStats,
}

/// Appointment features scored by the no-show model
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct NoShowInput {
    pub paciente_id: i64,
    pub edad: u32,
    pub genero: String,
    pub dias_anticipacion: u32,
    pub citas_previas: u32,
    pub inasistencias_previas: u32,
    pub hora_cita: u32,
    pub dia_semana: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tipo_tratamiento: Option<String>,
}

/// Model answer envelope
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct NoShowResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub prediction: Option<NoShowPrediction>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Predicted no-show risk
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct NoShowPrediction {
    pub probability: f64,
    pub risk_level: String,
    #[serde(default)]
    pub risk_factors: Vec<String>,
}

impl ClinicClient {
    /// Fetch segmentation filter metadata
    pub async fn filter_options(&self) -> ApiResult<FilterOptions> {
        self.get_json("/api/ml/filter-options").await
    }

    /// Run patient segmentation with the given filters
    pub async fn segment_patients(&self, filters: &SegmentationFilters) -> ApiResult<Segmentation> {
        self.call_json(
            Method::POST,
            "/api/ml/patients-segmentation",
            Some(filters),
            Deadline::Default,
        )
        .await
    }

    /// Score an appointment for no-show risk
    pub async fn predict_no_show(&self, input: &NoShowInput) -> ApiResult<NoShowResponse> {
        self.call_json(
            Method::POST,
            "/api/ml/predict-no-show",
            Some(input),
            Deadline::Default,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segmentation_decodes_partial_body() {
        let body = r#"{"pacientes":[{"id":1,"nombre":"Ana","apellido_paterno":"Ruiz"}],
                       "estadisticas":{"total_pacientes":1,"distribucion":{"frecuente":1}}}"#;
        let parsed: Segmentation = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.pacientes[0].full_name(), "Ana Ruiz");
        assert_eq!(parsed.estadisticas.total, 1);
        assert_eq!(parsed.estadisticas.distribucion.get("frecuente"), Some(&1));
    }

    #[test]
    fn test_filters_skip_unset_fields() {
        let filters = SegmentationFilters {
            genero: Some("F".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&filters).unwrap();
        assert_eq!(json, serde_json::json!({"genero": "F"}));
    }
}
