#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tempfile::TempDir;

use convoke::config::Config;
use convoke::context::AppContext;
use convoke::error::{AppError, AppResult};
use convoke::events::{DocumentStore, MemoryDocumentStore};
use convoke::identity::{AccountInfo, AuthProvider, OobRequest, TokenResponse};

/// Scripted identity provider. Defaults to a verified account with a
/// one-hour token; tests flip the knobs they care about.
pub struct MockAuthProvider {
    pub email_verified: Mutex<bool>,
    pub expires_in: Mutex<String>,
    pub sign_in_error: Mutex<Option<AppError>>,
    pub oob_fails: Mutex<bool>,
    /// Request types seen by `send_oob_code`, in order.
    pub oob_seen: Mutex<Vec<&'static str>>,
    pub sign_in_calls: Mutex<u32>,
}

impl MockAuthProvider {
    pub fn new() -> Self {
        Self {
            email_verified: Mutex::new(true),
            expires_in: Mutex::new("3600".to_string()),
            sign_in_error: Mutex::new(None),
            oob_fails: Mutex::new(false),
            oob_seen: Mutex::new(Vec::new()),
            sign_in_calls: Mutex::new(0),
        }
    }

    pub fn unverified() -> Self {
        let p = Self::new();
        *p.email_verified.lock() = false;
        p
    }

    pub fn with_expires_in(secs: &str) -> Self {
        let p = Self::new();
        *p.expires_in.lock() = secs.to_string();
        p
    }

    fn token(&self, email: &str, serial: u32) -> TokenResponse {
        TokenResponse {
            id_token: format!("tok-{serial}"),
            email: email.to_string(),
            local_id: "u1".to_string(),
            expires_in: self.expires_in.lock().clone(),
            refresh_token: String::new(),
            registered: true,
        }
    }
}

#[async_trait]
impl AuthProvider for MockAuthProvider {
    async fn sign_up(&self, email: &str, _password: &str) -> AppResult<TokenResponse> {
        Ok(self.token(email, 0))
    }

    async fn sign_in_with_password(&self, email: &str, _password: &str) -> AppResult<TokenResponse> {
        if let Some(err) = self.sign_in_error.lock().clone() {
            return Err(err);
        }
        let mut calls = self.sign_in_calls.lock();
        *calls += 1;
        Ok(self.token(email, *calls))
    }

    async fn send_oob_code(&self, request: OobRequest) -> AppResult<()> {
        let kind = match request {
            OobRequest::PasswordReset { .. } => "PASSWORD_RESET",
            OobRequest::VerifyEmail { .. } => "VERIFY_EMAIL",
        };
        self.oob_seen.lock().push(kind);
        if *self.oob_fails.lock() {
            return Err(AppError::unknown("oob send failed"));
        }
        Ok(())
    }

    async fn lookup(&self, _id_token: &str) -> AppResult<AccountInfo> {
        Ok(AccountInfo {
            local_id: "u1".to_string(),
            email: "looked-up@example.com".to_string(),
            email_verified: *self.email_verified.lock(),
            display_name: None,
        })
    }
}

pub fn test_config(data_dir: &Path) -> Config {
    Config {
        identity_url: "http://127.0.0.1:0".to_string(),
        api_key: "test-key".to_string(),
        store_url: None,
        events_collection: "events".to_string(),
        data_dir: data_dir.to_path_buf(),
    }
}

/// A context wired over the given mock provider and a shared in-memory
/// document store; the temp dir keeps prefs isolated per test.
pub fn context_with(
    provider: Arc<MockAuthProvider>,
) -> (AppContext, Arc<MemoryDocumentStore>, TempDir) {
    let tmp = TempDir::new().expect("temp dir");
    let docs = Arc::new(MemoryDocumentStore::new());
    let ctx = AppContext::new(
        test_config(tmp.path()),
        provider,
        Arc::<MemoryDocumentStore>::clone(&docs) as Arc<dyn DocumentStore>,
    )
    .expect("context");
    (ctx, docs, tmp)
}
