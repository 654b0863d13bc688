//! Identity-provider boundary: the `AuthProvider` trait and its HTTP
//! implementation over the provider's REST endpoints.
//!
//! Every call returns either a success payload or one taxonomy error; the
//! provider's enum-like error codes are mapped in `AppError`. No call is
//! retried here.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, AppResult};

/// Success payload of `signUp` / `signInWithPassword`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub id_token: String,
    pub email: String,
    pub local_id: String,
    /// Token lifetime in seconds; the provider sends it as a string.
    pub expires_in: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub registered: bool,
}

impl TokenResponse {
    pub fn expires_in_secs(&self) -> AppResult<i64> {
        self.expires_in
            .parse::<i64>()
            .map_err(|_| AppError::unknown(format!("unparseable token lifetime: {:?}", self.expires_in)))
    }
}

/// Account metadata from `lookup`, keyed by a one-time token.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub local_id: String,
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Out-of-band email request; one endpoint serves both flavors with a
/// different `requestType`.
#[derive(Debug, Clone)]
pub enum OobRequest {
    PasswordReset { email: String },
    VerifyEmail { id_token: String },
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> AppResult<TokenResponse>;
    async fn sign_in_with_password(&self, email: &str, password: &str) -> AppResult<TokenResponse>;
    async fn send_oob_code(&self, request: OobRequest) -> AppResult<()>;
    async fn lookup(&self, id_token: &str) -> AppResult<AccountInfo>;
}

pub struct HttpAuthProvider {
    base: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpAuthProvider {
    /// `base` is the provider root, e.g.
    /// `https://identitytoolkit.googleapis.com/v1`.
    pub fn new(base: &str, api_key: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, op: &str) -> String {
        format!("{}/accounts:{}?key={}", self.base, op, self.api_key)
    }

    async fn post_json(&self, op: &str, body: &serde_json::Value) -> AppResult<serde_json::Value> {
        let resp = self
            .client
            .post(self.endpoint(op))
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::unknown(format!("identity provider unreachable: {e}")))?;
        let status = resp.status();
        let val: serde_json::Value = resp.json().await.unwrap_or_else(|_| json!({}));
        if !status.is_success() {
            return Err(provider_error(&val, status.as_u16()));
        }
        Ok(val)
    }
}

/// Extract the provider's enum-like error code from an error body and map
/// it onto the taxonomy; bodies without one become `Unknown` with the
/// status preserved.
fn provider_error(body: &serde_json::Value, status: u16) -> AppError {
    match body.get("error").and_then(|e| e.get("message")).and_then(|m| m.as_str()) {
        Some(code) => AppError::from_provider_code(code),
        None => AppError::unknown(format!("identity provider error: HTTP {status}")),
    }
}

#[async_trait]
impl AuthProvider for HttpAuthProvider {
    async fn sign_up(&self, email: &str, password: &str) -> AppResult<TokenResponse> {
        let val = self
            .post_json(
                "signUp",
                &json!({"email": email, "password": password, "returnSecureToken": true}),
            )
            .await?;
        serde_json::from_value(val).map_err(|e| AppError::unknown(format!("malformed signUp response: {e}")))
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> AppResult<TokenResponse> {
        let val = self
            .post_json(
                "signInWithPassword",
                &json!({"email": email, "password": password, "returnSecureToken": true}),
            )
            .await?;
        serde_json::from_value(val)
            .map_err(|e| AppError::unknown(format!("malformed signInWithPassword response: {e}")))
    }

    async fn send_oob_code(&self, request: OobRequest) -> AppResult<()> {
        let body = match request {
            OobRequest::PasswordReset { email } => {
                json!({"requestType": "PASSWORD_RESET", "email": email})
            }
            OobRequest::VerifyEmail { id_token } => {
                json!({"requestType": "VERIFY_EMAIL", "idToken": id_token})
            }
        };
        self.post_json("sendOobCode", &body).await?;
        Ok(())
    }

    async fn lookup(&self, id_token: &str) -> AppResult<AccountInfo> {
        let val = self.post_json("lookup", &json!({"idToken": id_token})).await?;
        let user = val
            .get("users")
            .and_then(|u| u.get(0))
            .cloned()
            .ok_or_else(|| AppError::unknown("lookup returned no account for token"))?;
        serde_json::from_value(user).map_err(|e| AppError::unknown(format!("malformed lookup response: {e}")))
    }
}
