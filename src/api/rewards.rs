//! Gamification reward endpoints
//!
//! - GET    /api/gamificacion/recompensas - List rewards
//! - POST   /api/gamificacion/recompensas - Create a reward
//! - PUT    /api/gamificacion/recompensas/:id - Update a reward
//! - DELETE /api/gamificacion/recompensas/:id - Delete a reward

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::client::{ClinicClient, Deadline};
use super::error::ApiResult;

/// A reward patients can redeem with points
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Reward {
    pub id: i64,
    pub nombre: String,
    #[serde(default)]
    pub descripcion: String,
    #[serde(default)]
    pub tipo: String,
    pub puntos_requeridos: u32,
    #[serde(default)]
    pub icono: Option<String>,
    #[serde(default = "default_active")]
    pub estado: bool,
}

fn default_active() -> bool {
    true
}

/// Fields sent when creating or updating a reward
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RewardInput {
    pub nombre: String,
    pub descripcion: String,
    pub tipo: String,
    pub puntos_requeridos: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icono: Option<String>,
    pub estado: bool,
}

impl From<&Reward> for RewardInput {
    fn from(reward: &Reward) -> Self {
        Self {
            nombre: reward.nombre.clone(),
            descripcion: reward.descripcion.clone(),
            tipo: reward.tipo.clone(),
            puntos_requeridos: reward.puntos_requeridos,
            icono: reward.icono.clone(),
            estado: reward.estado,
        }
    }
}

impl ClinicClient {
    /// List every reward
    pub async fn rewards(&self) -> ApiResult<Vec<Reward>> {
        self.get_json("/api/gamificacion/recompensas").await
    }

    /// Create a reward
    pub async fn create_reward(&self, input: &RewardInput) -> ApiResult<Reward> {
        self.call_json(
            Method::POST,
            "/api/gamificacion/recompensas",
            Some(input),
            Deadline::Default,
        )
        .await
    }

    /// Update a reward
    pub async fn update_reward(&self, id: i64, input: &RewardInput) -> ApiResult<Reward> {
        self.call_json(
            Method::PUT,
            &format!("/api/gamificacion/recompensas/{}", id),
            Some(input),
            Deadline::Default,
        )
        .await
    }

    /// Delete a reward
    pub async fn delete_reward(&self, id: i64) -> ApiResult<()> {
        self.call_empty::<()>(
            Method::DELETE,
            &format!("/api/gamificacion/recompensas/{}", id),
            None,
        )
        .await
    }
}
