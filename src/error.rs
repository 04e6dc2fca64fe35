//! Error handling for gym-desk
//!
//! Centralized error types and handling for the application.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::cash_closing::ReconciliationError;
use crate::models::money::MoneyError;
use crate::models::sale::CartError;
use crate::models::service::ServiceTypeError;
use crate::services::mailer::MailerError;
use crate::services::timezone_service::TimezoneError;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Reconciliation(#[from] ReconciliationError),

    #[error("{0}")]
    Cart(#[from] CartError),

    #[error("{0}")]
    ServiceType(#[from] ServiceTypeError),

    #[error("{0}")]
    Money(#[from] MoneyError),

    #[error("{0}")]
    Timezone(#[from] TimezoneError),

    #[error("Mail error: {0}")]
    Mailer(#[from] MailerError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Mail delivery stopped after {sent} message(s): {reason}")]
    MailDelivery { sent: usize, reason: String },

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Service unavailable")]
    ServiceUnavailable,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_)
            | AppError::Internal(_)
            | AppError::Io(_)
            | AppError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Reconciliation(err) => match err {
                ReconciliationError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                ReconciliationError::Conflict(_) => StatusCode::CONFLICT,
                ReconciliationError::PersistenceFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Cart(err) => match err {
                CartError::ProductNotFound(_) => StatusCode::NOT_FOUND,
                CartError::InsufficientStock { .. } => StatusCode::CONFLICT,
                CartError::Empty | CartError::InvalidQuantity(_) | CartError::NoSuchLine(_) => {
                    StatusCode::BAD_REQUEST
                }
            },
            AppError::ServiceType(_)
            | AppError::Money(_)
            | AppError::Timezone(_)
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Mailer(_) | AppError::MailDelivery { .. } => StatusCode::BAD_GATEWAY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DatabaseError",
            AppError::Reconciliation(err) => match err {
                ReconciliationError::InvalidInput(_) => "InvalidInput",
                ReconciliationError::Conflict(_) => "Conflict",
                ReconciliationError::PersistenceFailure(_) => "PersistenceFailure",
            },
            AppError::Cart(err) => match err {
                CartError::ProductNotFound(_) => "NotFound",
                CartError::InsufficientStock { .. } => "InsufficientStock",
                CartError::Empty => "EmptyCart",
                CartError::InvalidQuantity(_) | CartError::NoSuchLine(_) => "ValidationError",
            },
            AppError::ServiceType(_)
            | AppError::Money(_)
            | AppError::Timezone(_)
            | AppError::Validation(_) => "ValidationError",
            AppError::Mailer(_) => "MailerError",
            AppError::MailDelivery { .. } => "MailDelivery",
            AppError::NotFound(_) => "NotFound",
            AppError::Conflict(_) => "Conflict",
            AppError::Forbidden(_) => "Forbidden",
            AppError::Unauthorized => "Unauthorized",
            AppError::Internal(_) => "InternalError",
            AppError::ServiceUnavailable => "ServiceUnavailable",
            AppError::Serialization(_) => "SerializationError",
            AppError::Io(_) => "IoError",
        }
    }

    /// Check if this error should be logged as an error vs warning
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error() && !matches!(self, AppError::ServiceUnavailable)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn not_found(resource: &str) -> Self {
        AppError::NotFound(format!("{} not found", resource))
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        AppError::Conflict(message.into())
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        AppError::Internal(message.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();

        if self.is_server_error() {
            crate::logging::log_error(&message, error_code);
        } else {
            crate::logging::log_warning(&message, error_code);
        }

        let body = Json(json!({
            "error": error_code,
            "message": message,
            "timestamp": chrono::Utc::now().timestamp()
        }));

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
