//! Client for the ClinicDesk auth API.
//!
//! Strictly a collaborator of the session core: it exchanges credentials
//! for a token and identity, and nothing more. Failures surface verbatim
//! to the submitting screen and are never retried automatically; the
//! session controller is only touched after a successful response.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::Role;

use super::ApiError;

/// Default base URL for the clinic API.
const DEFAULT_API_BASE_URL: &str = "https://api.clinicdesk.health";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Identity returned by a successful login or registration.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountResponse {
    pub token: String,
    pub name: String,
    pub role: Role,
    #[serde(rename = "doctorId")]
    pub doctor_id: Option<i64>,
    #[serde(rename = "nurseId")]
    pub nurse_id: Option<i64>,
}

impl AccountResponse {
    /// The role-specific principal id as the session core carries it.
    pub fn user_id(&self) -> String {
        self.doctor_id
            .or(self.nurse_id)
            .map(|id| id.to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
    role: Role,
}

/// Auth API client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
}

impl AuthClient {
    /// Create a client against the given base URL, or the default when none
    /// is configured.
    pub fn new(base_url: Option<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
        })
    }

    /// Exchange credentials for a token and identity.
    pub async fn login(&self, email: &str, password: &str) -> Result<AccountResponse, ApiError> {
        let url = format!("{}/auth/login", self.base_url);
        debug!(%url, "sending login request");

        let response = self
            .client
            .post(&url)
            .json(&LoginRequest { email, password })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body));
        }

        let account: AccountResponse = response.json().await?;
        debug!(role = %account.role, "login accepted");
        Ok(account)
    }

    /// Register a new staff account. Returns the same shape as login so the
    /// caller can sign in immediately.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<AccountResponse, ApiError> {
        let url = format!("{}/auth/register", self.base_url);
        debug!(%url, "sending registration request");

        let response = self
            .client
            .post(&url)
            .json(&RegisterRequest {
                name,
                email,
                password,
                role,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body));
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_response_prefers_doctor_id() {
        let account = AccountResponse {
            token: "a.b.c".to_string(),
            name: "Alice".to_string(),
            role: Role::Doctor,
            doctor_id: Some(7),
            nurse_id: None,
        };
        assert_eq!(account.user_id(), "7");
    }

    #[test]
    fn test_account_response_falls_back_to_nurse_id() {
        let account = AccountResponse {
            token: "a.b.c".to_string(),
            name: "Bea".to_string(),
            role: Role::Nurse,
            doctor_id: None,
            nurse_id: Some(9),
        };
        assert_eq!(account.user_id(), "9");
    }

    #[test]
    fn test_account_response_parses_camel_case() {
        let json = r#"{"token":"a.b.c","name":"Alice","role":"Doctor","doctorId":7,"nurseId":null}"#;
        let account: AccountResponse = serde_json::from_str(json).unwrap();
        assert_eq!(account.doctor_id, Some(7));
        assert_eq!(account.role, Role::Doctor);
    }
}
