//! News page

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use super::{Notifier, Outcome, Page};
use crate::api::content::Article;
use crate::api::ClinicClient;
use crate::notification::{DismissReason, NotificationRequest};

#[derive(Default)]
pub struct NewsPage {
    articles: Vec<Article>,
    query: String,
    slot: Notifier,
}

/// Publication time used for ordering; undated articles sort last
fn published_at(article: &Article) -> Option<DateTime<Utc>> {
    let raw = article.fecha_publicacion.as_deref()?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

impl NewsPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the search text
    pub fn search(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Articles matching the search, newest first
    pub fn visible(&self) -> Vec<&Article> {
        let needle = self.query.trim().to_lowercase();
        self.articles
            .iter()
            .filter(|a| {
                needle.is_empty()
                    || a.titulo.to_lowercase().contains(&needle)
                    || a.descripcion.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn total(&self) -> usize {
        self.articles.len()
    }
}

#[async_trait]
impl Page for NewsPage {
    fn title(&self) -> &'static str {
        "Noticias"
    }

    async fn load(&mut self, client: &ClinicClient) -> Outcome {
        match client.news().await {
            Ok(mut articles) => {
                articles.sort_by(|a, b| published_at(b).cmp(&published_at(a)));
                tracing::debug!(count = articles.len(), "News loaded");
                self.articles = articles;
                Outcome::Quiet
            }
            Err(e) => self.slot.failure(&e, "No se pudieron cargar las noticias."),
        }
    }

    fn notification(&self) -> &NotificationRequest {
        self.slot.current()
    }

    fn close_notification(&mut self, reason: DismissReason) {
        self.slot.close(reason);
    }
}
