//! Authentication endpoints
//!
//! - POST /api/users/login - Credential login
//! - POST /api/send-verification-code - Email a one-time code
//! - POST /api/verify-verification-code - Check a one-time code

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::client::{call_with_body, ClinicClient, Deadline};
use super::error::ApiResult;

/// Login credentials
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Login answer. The same shape is used for success and rejection.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub failed_attempts: Option<u32>,
    #[serde(default)]
    pub lock_status: Option<bool>,
    #[serde(default)]
    pub lock_until: Option<String>,
    #[serde(default)]
    pub user_type: Option<String>,
    #[serde(default)]
    pub user: Option<LoginUser>,
}

/// User summary returned on successful login
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct LoginUser {
    #[serde(default)]
    pub tipo: Option<String>,
    #[serde(default)]
    pub nombre: Option<String>,
}

impl LoginResponse {
    /// Whether the backend reports the account as locked
    pub fn is_locked(&self) -> bool {
        self.lock_status.unwrap_or(false)
    }

    /// User type from either of the shapes the backend sends
    pub fn resolved_user_type(&self) -> Option<&str> {
        self.user_type
            .as_deref()
            .or_else(|| self.user.as_ref().and_then(|u| u.tipo.as_deref()))
    }
}

/// Answer of the verification endpoints
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user_type: Option<String>,
}

#[derive(Serialize)]
struct SendCodeBody<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct VerifyCodeBody<'a> {
    email: &'a str,
    token: &'a str,
}

impl ClinicClient {
    /// Attempt a login.
    ///
    /// Returns the HTTP status alongside the parsed body, since lockout and
    /// failed-attempt details arrive on 4xx answers.
    pub async fn login(&self, credentials: &Credentials) -> ApiResult<(u16, LoginResponse)> {
        call_with_body(self, "/api/users/login", credentials, Deadline::Login).await
    }

    /// Ask the backend to email a verification code
    pub async fn send_verification_code(&self, email: &str) -> ApiResult<VerificationResponse> {
        self.call_json(
            Method::POST,
            "/api/send-verification-code",
            Some(&SendCodeBody { email }),
            Deadline::Verification,
        )
        .await
    }

    /// Check a verification code
    pub async fn verify_verification_code(
        &self,
        email: &str,
        code: &str,
    ) -> ApiResult<VerificationResponse> {
        self.call_json(
            Method::POST,
            "/api/verify-verification-code",
            Some(&VerifyCodeBody { email, token: code }),
            Deadline::Verification,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_lock_shape() {
        let body = r#"{"lockStatus": true, "lockUntil": "2025-01-01T00:00:00Z"}"#;
        let parsed: LoginResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.is_locked());
        assert_eq!(parsed.lock_until.as_deref(), Some("2025-01-01T00:00:00Z"));
        assert_eq!(parsed.failed_attempts, None);
    }

    #[test]
    fn test_user_type_resolution() {
        let flat: LoginResponse =
            serde_json::from_str(r#"{"message":"ok","userType":"administrador"}"#).unwrap();
        assert_eq!(flat.resolved_user_type(), Some("administrador"));

        let nested: LoginResponse =
            serde_json::from_str(r#"{"user":{"tipo":"paciente","nombre":"Ana"}}"#).unwrap();
        assert_eq!(nested.resolved_user_type(), Some("paciente"));

        let none: LoginResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(none.resolved_user_type(), None);
        assert!(!none.is_locked());
    }
}
