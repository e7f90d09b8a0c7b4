//! In-process mock of the clinic backend for tests
//!
//! Serves an axum router on an ephemeral port and counts hits per
//! `METHOD /path`, so tests can assert that validation failures never
//! reach the network.

use axum::{extract::Request, middleware::Next, response::Response, Router};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

use crate::api::{ClientConfig, ClinicClient};

pub(crate) struct MockBackend {
    pub base_url: String,
    hits: Arc<Mutex<HashMap<String, usize>>>,
    handle: JoinHandle<()>,
}

impl MockBackend {
    /// Serve `router` on 127.0.0.1 with hit counting
    pub async fn start(router: Router) -> Self {
        let hits: Arc<Mutex<HashMap<String, usize>>> = Arc::default();
        let counter = Arc::clone(&hits);

        let app = router.layer(axum::middleware::from_fn(
            move |req: Request, next: Next| {
                let counter = Arc::clone(&counter);
                async move {
                    let key = format!("{} {}", req.method(), req.uri().path());
                    *counter.lock().unwrap().entry(key).or_insert(0) += 1;
                    let response: Response = next.run(req).await;
                    response
                }
            },
        ));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            hits,
            handle,
        }
    }

    /// Hits recorded for `"METHOD /path"`
    pub fn hits(&self, key: &str) -> usize {
        self.hits.lock().unwrap().get(key).copied().unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.hits.lock().unwrap().values().sum()
    }

    /// Client pointed at this backend with short deadlines
    pub fn client(&self) -> ClinicClient {
        self.client_with(|_| {})
    }

    pub fn client_with(&self, tweak: impl FnOnce(&mut ClientConfig)) -> ClinicClient {
        let mut config = ClientConfig {
            base_url: self.base_url.clone(),
            request_timeout_ms: 2_000,
            login_timeout_ms: 2_000,
            verification_timeout_ms: 2_000,
        };
        tweak(&mut config);
        ClinicClient::new(config).unwrap()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A client pointed at a port nothing listens on
pub(crate) fn unreachable_client() -> ClinicClient {
    ClinicClient::new(ClientConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        request_timeout_ms: 1_000,
        login_timeout_ms: 1_000,
        verification_timeout_ms: 1_000,
    })
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, routing::get, Json};
    use tower::util::ServiceExt;

    fn router() -> Router {
        Router::new().route(
            "/api/servicios/noticias",
            get(|| async { Json(serde_json::json!([])) }),
        )
    }

    #[tokio::test]
    async fn test_router_answers_in_process() {
        let response = router()
            .oneshot(
                axum::http::Request::builder()
                    .uri("/api/servicios/noticias")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_hits_are_counted() {
        let backend = MockBackend::start(router()).await;
        let client = backend.client();

        let news = client.news().await.unwrap();
        assert!(news.is_empty());
        assert_eq!(backend.hits("GET /api/servicios/noticias"), 1);
        assert_eq!(backend.total_hits(), 1);
    }

    #[tokio::test]
    async fn test_unknown_route_is_a_rejection() {
        let backend = MockBackend::start(router()).await;
        let err = backend.client().rewards().await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }
}
