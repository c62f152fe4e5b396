use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error body returned to API callers.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// HTTP status category (e.g. "Bad Request")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

/// Error taxonomy of the gateway.
///
/// Build-time failures (`MissingAddressData`, `UnknownOrder`) surface to
/// the checkout flow. Malformed notifications (`EmptyBody`,
/// `MissingTransactionReference`, `BadCredentials`) propagate before any
/// state mutation so the provider retries a delivery that recorded
/// nothing. Refused or unknown outcomes are not errors at all; the
/// reconciliation service absorbs them.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("missing billing address data")]
    MissingAddressData,

    #[error("empty notification body")]
    EmptyBody,

    #[error("notification is missing the transaction or order reference")]
    MissingTransactionReference,

    #[error("notification credentials rejected")]
    BadCredentials,

    #[error("unknown order reference: {0}")]
    UnknownOrder(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for GatewayError {
    fn from(err: validator::ValidationErrors) -> Self {
        GatewayError::Validation(err.to_string())
    }
}

impl GatewayError {
    /// Single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingAddressData => StatusCode::UNPROCESSABLE_ENTITY,
            Self::EmptyBody | Self::MissingTransactionReference | Self::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::BadCredentials => StatusCode::UNAUTHORIZED,
            Self::UnknownOrder(_) => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message suitable for HTTP responses. Internal errors return a
    /// generic message to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::Database(_) => "Database error".to_string(),
            Self::Config(_) | Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = ErrorResponse {
            error: status
                .canonical_reason()
                .unwrap_or("Unknown")
                .to_string(),
            message: self.response_message(),
            timestamp: Utc::now().to_rfc3339(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_notifications_map_to_bad_request() {
        assert_eq!(GatewayError::EmptyBody.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            GatewayError::MissingTransactionReference.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn credential_failures_map_to_unauthorized() {
        assert_eq!(
            GatewayError::BadCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let err = GatewayError::Config("md5_salt missing".to_string());
        assert_eq!(err.response_message(), "Internal server error");
    }

    #[test]
    fn missing_address_is_a_recoverable_validation_failure() {
        assert_eq!(
            GatewayError::MissingAddressData.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
