//! API error types and responses.

use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use licensekit_license::LicenseError;
use licensekit_revocation::RevocationError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// API error type.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request body rejected: {0}")]
    BadJson(#[from] JsonRejection),

    #[error(transparent)]
    License(#[from] LicenseError),

    #[error(transparent)]
    Revocation(#[from] RevocationError),
}

/// API error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadJson(_) => StatusCode::BAD_REQUEST,
            ApiError::License(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::License(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Revocation(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Revocation(RevocationError::ConcurrentUpdateFailed { .. }) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Revocation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::BadJson(_) => "BAD_REQUEST",
            ApiError::License(e) => match e {
                LicenseError::InvalidProduct => "INVALID_PRODUCT",
                LicenseError::KeyUnavailable { .. } => "KEY_UNAVAILABLE",
                LicenseError::SigningFailed(_) => "SIGNING_FAILED",
                LicenseError::InvalidTokenFormat(_)
                | LicenseError::InvalidSignature
                | LicenseError::InvalidPayload(_) => "INVALID_TOKEN",
                LicenseError::Serialization(_) => "INTERNAL_ERROR",
            },
            ApiError::Revocation(e) => match e {
                RevocationError::InvalidId { .. } => "INVALID_ID",
                RevocationError::ConcurrentUpdateFailed { .. } => "CONCURRENT_UPDATE",
                RevocationError::CorruptRecord(_) | RevocationError::Storage(_) => {
                    "REVOCATION_STORE_ERROR"
                }
            },
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::BadJson(_) => "Could not decode json request".to_string(),
            ApiError::License(LicenseError::KeyUnavailable { .. }) => {
                "Could not load private key for signing".to_string()
            }
            ApiError::License(LicenseError::SigningFailed(_) | LicenseError::Serialization(_)) => {
                "Could not encode the license".to_string()
            }
            ApiError::License(e) => e.to_string(),
            ApiError::Revocation(RevocationError::ConcurrentUpdateFailed { .. }) => {
                "The revocations file is busy, retry later".to_string()
            }
            ApiError::Revocation(RevocationError::InvalidId { id, .. }) => {
                format!("Invalid license id {id:?}")
            }
            ApiError::Revocation(_) => {
                "An error occurred updating the revocations file".to_string()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        error!(status = status.as_u16(), "[{}] {}", message, self);

        let body = ErrorResponse {
            error: message,
            code: self.code().to_string(),
        };
        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
        }
        response
    }
}
