//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{CatalogError, DomainError, OrderError};
use serde::Serialize;
use store::StoreError;

const INTERNAL_MESSAGE: &str = "Internal server error";
const INVALID_FORM: &str = "Form is invalid";

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Domain logic error.
    Domain(DomainError),
    /// A rejected form, returned with its errors and the submitted values.
    Rejected {
        message: String,
        errors: serde_json::Value,
        form: serde_json::Value,
    },
}

impl ApiError {
    /// Attaches the submitted form to a validation failure so the client can
    /// redisplay every value that was entered. Other errors pass through.
    pub fn with_form<F: Serialize>(self, form: &F) -> Self {
        let errors = match &self {
            ApiError::Domain(DomainError::Order(OrderError::Invalid(errors))) => {
                serde_json::to_value(errors).ok()
            }
            ApiError::Domain(DomainError::Catalog(CatalogError::Invalid(errors))) => {
                serde_json::to_value(errors).ok()
            }
            _ => None,
        };
        let Some(errors) = errors else {
            return self;
        };

        match serde_json::to_value(form) {
            Ok(form) => ApiError::Rejected {
                message: INVALID_FORM.to_string(),
                errors,
                form,
            },
            Err(_) => self,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    form: Option<serde_json::Value>,
}

impl ErrorBody {
    fn message(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            errors: None,
            form: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorBody::message(msg)),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Rejected {
                message,
                errors,
                form,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorBody {
                    error: message,
                    errors: Some(errors),
                    form: Some(form),
                },
            ),
        };

        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, ErrorBody) {
    match err {
        DomainError::Order(order_err) => match order_err {
            OrderError::Invalid(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorBody {
                    error: INVALID_FORM.to_string(),
                    errors: serde_json::to_value(&errors).ok(),
                    form: None,
                },
            ),
            OrderError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                ErrorBody::message(order_err.to_string()),
            ),
            OrderError::InvalidStatus(_) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::message(order_err.to_string()),
            ),
            OrderError::SaveFailed => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::message(order_err.to_string()),
            ),
        },
        DomainError::Catalog(catalog_err) => match catalog_err {
            CatalogError::Invalid(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorBody {
                    error: INVALID_FORM.to_string(),
                    errors: serde_json::to_value(&errors).ok(),
                    form: None,
                },
            ),
            CatalogError::CategoryNotFound(_) | CatalogError::ProductNotFound(_) => (
                StatusCode::NOT_FOUND,
                ErrorBody::message(catalog_err.to_string()),
            ),
            CatalogError::CategoryInUse(_) | CatalogError::ProductInUse { .. } => (
                StatusCode::CONFLICT,
                ErrorBody::message(catalog_err.to_string()),
            ),
        },
        DomainError::Store(store_err) => store_error_to_response(store_err),
    }
}

fn store_error_to_response(err: StoreError) -> (StatusCode, ErrorBody) {
    match &err {
        StoreError::NotFound { .. } => (StatusCode::NOT_FOUND, ErrorBody::message(err.to_string())),
        StoreError::Referenced { .. } => {
            (StatusCode::CONFLICT, ErrorBody::message(err.to_string()))
        }
        _ => {
            tracing::error!(error = %err, "store error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::message(INTERNAL_MESSAGE),
            )
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}
