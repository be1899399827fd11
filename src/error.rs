// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Domain errors and their HTTP representation.
//!
//! [`DomainError`] is what the envelope and sharing layers return.
//! [`ApiError`] is what handlers return; every domain error maps onto exactly
//! one status and a stable `error_code`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::crypto::CryptoError;
use crate::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    /// Bad input shape or enum value; the caller can correct it.
    #[error("{0}")]
    Validation(String),

    /// Missing file or grant. Ownership mismatches are reported identically.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Wrong audience or bad passphrase.
    #[error("{0}")]
    Forbidden(&'static str),

    #[error("this link has expired")]
    Expired,

    /// One-time grant already used.
    #[error("this link has already been used")]
    Consumed,

    /// Public grant on the private entry point or the reverse.
    #[error("{0}")]
    WrongChannel(&'static str),

    /// AEAD tag verification failed. Never retried.
    #[error("integrity check failed")]
    Integrity,

    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<CryptoError> for DomainError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::Integrity => DomainError::Integrity,
            other => DomainError::Internal(other.to_string()),
        }
    }
}

impl DomainError {
    /// Map a storage lookup failure, turning a missing entity into
    /// `NotFound(resource)` and passing everything else through.
    pub fn lookup(resource: &'static str) -> impl Fn(StorageError) -> DomainError {
        move |e| match e {
            StorageError::NotFound(_) => DomainError::NotFound(resource),
            other => DomainError::Storage(other),
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    error_code: &'static str,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation_error", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "forbidden", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(msg) => ApiError::bad_request(msg),
            DomainError::NotFound(_) => ApiError::not_found(e.to_string()),
            DomainError::Forbidden(_) => ApiError::forbidden(e.to_string()),
            DomainError::Expired => ApiError::new(StatusCode::GONE, "expired", e.to_string()),
            DomainError::Consumed => ApiError::new(StatusCode::GONE, "consumed", e.to_string()),
            DomainError::WrongChannel(_) => {
                ApiError::new(StatusCode::BAD_REQUEST, "wrong_channel", e.to_string())
            }
            DomainError::Integrity => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "integrity_error",
                "Stored file failed integrity verification",
            ),
            DomainError::Storage(inner) => {
                tracing::error!(error = %inner, "Storage failure");
                ApiError::internal("Internal storage error")
            }
            DomainError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal failure");
                ApiError::internal("Internal server error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            error_code: self.code,
        });
        (self.status, body).into_response()
    }
}
