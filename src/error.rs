//! Unified application error model and mapping helpers.
//! This module provides the common error enum surfaced by the session
//! lifecycle and the event repository, along with the mapper from the
//! identity provider's enum-like error codes.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AppError {
    InvalidCredentials { message: String },
    EmailAlreadyExists { message: String },
    EmailNotFound { message: String },
    WeakPassword { message: String },
    InvalidEmailFormat { message: String },
    RateLimited { message: String },
    EmailNotVerified { message: String },
    Unauthenticated { message: String },
    Unknown { message: String },
}

impl AppError {
    pub fn kind_str(&self) -> &'static str {
        match self {
            AppError::InvalidCredentials { .. } => "invalid_credentials",
            AppError::EmailAlreadyExists { .. } => "email_already_exists",
            AppError::EmailNotFound { .. } => "email_not_found",
            AppError::WeakPassword { .. } => "weak_password",
            AppError::InvalidEmailFormat { .. } => "invalid_email_format",
            AppError::RateLimited { .. } => "rate_limited",
            AppError::EmailNotVerified { .. } => "email_not_verified",
            AppError::Unauthenticated { .. } => "unauthenticated",
            AppError::Unknown { .. } => "unknown",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::InvalidCredentials { message }
            | AppError::EmailAlreadyExists { message }
            | AppError::EmailNotFound { message }
            | AppError::WeakPassword { message }
            | AppError::InvalidEmailFormat { message }
            | AppError::RateLimited { message }
            | AppError::EmailNotVerified { message }
            | AppError::Unauthenticated { message }
            | AppError::Unknown { message } => message.as_str(),
        }
    }

    pub fn invalid_credentials<S: Into<String>>(msg: S) -> Self { AppError::InvalidCredentials { message: msg.into() } }
    pub fn email_already_exists<S: Into<String>>(msg: S) -> Self { AppError::EmailAlreadyExists { message: msg.into() } }
    pub fn email_not_found<S: Into<String>>(msg: S) -> Self { AppError::EmailNotFound { message: msg.into() } }
    pub fn weak_password<S: Into<String>>(msg: S) -> Self { AppError::WeakPassword { message: msg.into() } }
    pub fn invalid_email_format<S: Into<String>>(msg: S) -> Self { AppError::InvalidEmailFormat { message: msg.into() } }
    pub fn rate_limited<S: Into<String>>(msg: S) -> Self { AppError::RateLimited { message: msg.into() } }
    pub fn email_not_verified<S: Into<String>>(msg: S) -> Self { AppError::EmailNotVerified { message: msg.into() } }
    pub fn unauthenticated<S: Into<String>>(msg: S) -> Self { AppError::Unauthenticated { message: msg.into() } }
    pub fn unknown<S: Into<String>>(msg: S) -> Self { AppError::Unknown { message: msg.into() } }

    /// Map an identity-provider error code to the taxonomy.
    ///
    /// Provider codes are enum-like strings (`EMAIL_EXISTS`, `INVALID_PASSWORD`,
    /// ...) sometimes carrying a free-text suffix after a colon, e.g.
    /// `TOO_MANY_ATTEMPTS_TRY_LATER : Please try again later.` — hence prefix
    /// matching. Unrecognized codes pass through as `Unknown` with the raw
    /// message preserved for diagnostics.
    pub fn from_provider_code(code: &str) -> Self {
        let head = code.split(':').next().unwrap_or(code).trim();
        match head {
            "EMAIL_EXISTS" => AppError::email_already_exists("An account with this email already exists."),
            "EMAIL_NOT_FOUND" => AppError::email_not_found("No account was found for this email."),
            "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
                AppError::invalid_credentials("The email or password is incorrect.")
            }
            "WEAK_PASSWORD" => AppError::weak_password("The password is too weak."),
            "INVALID_EMAIL" => AppError::invalid_email_format("The email address is badly formatted."),
            "TOO_MANY_ATTEMPTS_TRY_LATER" => AppError::rate_limited("Too many attempts. Please try again later."),
            _ => AppError::unknown(code.to_string()),
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        // Default mapping: unclassified failures keep their original text
        AppError::Unknown { message: err.to_string() }
    }
}
