//! Clinic Backend REST Client
//!
//! HTTP client for the clinic's JSON-over-HTTPS backend. Every call runs
//! under a deadline, carries an `X-Request-Id` and has its failures
//! normalised into [`ApiError`].

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;

use super::error::{ApiError, ApiResult, ErrorBody};

/// Default backend origin
pub const DEFAULT_BASE_URL: &str = "https://back-end-4803.onrender.com";

/// Clinic backend REST client
#[derive(Clone)]
pub struct ClinicClient {
    client: Client,
    config: ClientConfig,
}

/// Configuration for the clinic client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend origin (e.g., "https://back-end-4803.onrender.com")
    pub base_url: String,
    /// Deadline for ordinary calls in milliseconds
    pub request_timeout_ms: u64,
    /// Deadline for the login call in milliseconds
    pub login_timeout_ms: u64,
    /// Deadline for verification-code calls in milliseconds
    pub verification_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_ms: 30_000,
            login_timeout_ms: 10_000,
            verification_timeout_ms: 15_000,
        }
    }
}

/// Which deadline applies to a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    Default,
    Login,
    Verification,
}

impl ClinicClient {
    /// Create a new client with the given configuration
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("clinic-portal/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config })
    }

    /// Get the current configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Absolute URL for a backend path
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Resolve a deadline to a duration
    pub fn deadline(&self, deadline: Deadline) -> Duration {
        let ms = match deadline {
            Deadline::Default => self.config.request_timeout_ms,
            Deadline::Login => self.config.login_timeout_ms,
            Deadline::Verification => self.config.verification_timeout_ms,
        };
        Duration::from_millis(ms)
    }

    /// GET a JSON document
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.call_json::<(), T>(Method::GET, path, None, Deadline::Default)
            .await
    }

    /// Send a JSON body (or none) and decode a JSON answer
    pub(crate) async fn call_json<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        deadline: Deadline,
    ) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        let mut builder = self.client.request(method.clone(), &url);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let limit = self.deadline(deadline);
        with_deadline(limit, async {
            let response = self.execute(builder, &method, &url, limit).await?;
            let text = response
                .text()
                .await
                .map_err(|e| ApiError::from_transport(e, limit.as_millis() as u64))?;
            serde_json::from_str(&text)
                .map_err(|e| ApiError::Decode(format!("{} {}: {}", method, url, e)))
        })
        .await
        .map_err(|e| e.during(&method, &url))
    }

    /// Send a JSON body (or none) and discard the answer
    pub(crate) async fn call_empty<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> ApiResult<()>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        let mut builder = self.client.request(method.clone(), &url);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let limit = self.deadline(Deadline::Default);
        with_deadline(limit, async {
            self.execute(builder, &method, &url, limit).await?;
            Ok(())
        })
        .await
        .map_err(|e| e.during(&method, &url))
    }

    /// Send a multipart form and decode a JSON answer
    pub(crate) async fn call_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> ApiResult<T> {
        let url = self.url(path);
        let builder = self.client.post(&url).multipart(form);

        let limit = self.deadline(Deadline::Default);
        with_deadline(limit, async {
            let response = self.execute(builder, &Method::POST, &url, limit).await?;
            response
                .json()
                .await
                .map_err(|e| ApiError::Decode(format!("POST {}: {}", url, e)))
        })
        .await
        .map_err(|e| e.during(&Method::POST, &url))
    }

    /// Send a prepared request and reject non-2xx answers
    async fn execute(
        &self,
        builder: RequestBuilder,
        method: &Method,
        url: &str,
        limit: Duration,
    ) -> ApiResult<Response> {
        let request_id = uuid::Uuid::new_v4().to_string();
        tracing::debug!(request_id = %request_id, method = %method, url = %url, "Sending request");

        let response = builder
            .header("X-Request-Id", &request_id)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(request_id = %request_id, error = %e, "Request failed");
                ApiError::from_transport(e, limit.as_millis() as u64)
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = ErrorBody::extract(&text);
        tracing::warn!(
            request_id = %request_id,
            status = status.as_u16(),
            url = %url,
            "Backend rejected request"
        );

        Err(ApiError::Status {
            status: status.as_u16(),
            message,
            url: url.to_string(),
            method: method.clone(),
        })
    }
}

/// Run a backend call under a deadline.
///
/// The future is dropped (and with it the in-flight request) once the
/// deadline elapses.
pub async fn with_deadline<T, F>(limit: Duration, fut: F) -> ApiResult<T>
where
    F: Future<Output = ApiResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(ApiError::Timeout(limit.as_millis() as u64)),
    }
}

/// Fetch a backend JSON body that may carry a `message` even on error
/// statuses, such as the login endpoint.
pub(crate) async fn call_with_body<B, T>(
    client: &ClinicClient,
    path: &str,
    body: &B,
    deadline: Deadline,
) -> ApiResult<(u16, T)>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let url = client.url(path);
    let limit = client.deadline(deadline);

    with_deadline(limit, async {
        let response = client
            .client
            .post(&url)
            .json(body)
            .header("X-Request-Id", uuid::Uuid::new_v4().to_string())
            .send()
            .await
            .map_err(|e| ApiError::from_transport(e, limit.as_millis() as u64))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::from_transport(e, limit.as_millis() as u64))?;

        match serde_json::from_str::<T>(&text) {
            Ok(parsed) => Ok((status, parsed)),
            Err(_) if status >= 400 => Err(ApiError::Status {
                status,
                message: ErrorBody::extract(&text),
                url: url.clone(),
                method: Method::POST,
            }),
            Err(e) => Err(ApiError::Decode(format!("POST {}: {}", url, e))),
        }
    })
    .await
    .map_err(|e| e.during(&Method::POST, &url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.login_timeout_ms, 10_000);
        assert_eq!(config.verification_timeout_ms, 15_000);
    }

    #[test]
    fn test_url_join() {
        let client = ClinicClient::new(ClientConfig {
            base_url: "http://localhost:9000/".to_string(),
            ..ClientConfig::default()
        })
        .unwrap();

        assert_eq!(
            client.url("/api/users/login"),
            "http://localhost:9000/api/users/login"
        );
        assert_eq!(
            client.url("api/servicios/noticias"),
            "http://localhost:9000/api/servicios/noticias"
        );
    }

    #[test]
    fn test_deadlines() {
        let client = ClinicClient::new(ClientConfig::default()).unwrap();
        assert_eq!(client.deadline(Deadline::Login), Duration::from_secs(10));
        assert_eq!(client.deadline(Deadline::Verification), Duration::from_secs(15));
        assert_eq!(client.deadline(Deadline::Default), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_deadline_times_out() {
        let result: ApiResult<()> = with_deadline(Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(ApiError::Timeout(50))));
    }

    #[tokio::test]
    async fn test_with_deadline_passes_result_through() {
        let result = with_deadline(Duration::from_secs(1), async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
