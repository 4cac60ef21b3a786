//! Shared validation helpers for inbound HTTP adapters.
//!
//! Domain validation errors become `400 invalid_request` payloads whose
//! `details` name the offending field and a stable code.

use actix_web::web;
use serde_json::json;

use crate::domain::{
    DeliveryValidationError, Error, LoginValidationError, PageValidationError,
    UnknownDeliveryStatus, UserValidationError,
};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidValue,
    NoChanges,
    LimitTooLarge,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidValue => "invalid_value",
            ErrorCode::NoChanges => "no_changes",
            ErrorCode::LimitTooLarge => "limit_too_large",
        }
    }
}

/// Builder for validation errors with optional field context.
struct ValidationError {
    field: Option<&'static str>,
    message: String,
}

impl ValidationError {
    fn new(field: Option<&'static str>, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    fn with_code(self, code: ErrorCode) -> Error {
        let details = match self.field {
            Some(field) => json!({ "field": field, "code": code.as_str() }),
            None => json!({ "code": code.as_str() }),
        };
        Error::invalid_request(self.message).with_details(details)
    }
}

pub(crate) fn user_validation_error(err: UserValidationError) -> Error {
    let code = match err {
        UserValidationError::NoChanges => ErrorCode::NoChanges,
        _ => ErrorCode::InvalidValue,
    };
    ValidationError::new(err.field(), err.to_string()).with_code(code)
}

pub(crate) fn delivery_validation_error(err: DeliveryValidationError) -> Error {
    let code = match err {
        DeliveryValidationError::NoChanges => ErrorCode::NoChanges,
        _ => ErrorCode::InvalidValue,
    };
    ValidationError::new(err.field(), err.to_string()).with_code(code)
}

pub(crate) fn unknown_status_error(err: UnknownDeliveryStatus) -> Error {
    ValidationError::new(Some("status"), err.to_string()).with_code(ErrorCode::InvalidValue)
}

pub(crate) fn page_validation_error(err: PageValidationError) -> Error {
    ValidationError::new(Some("limit"), err.to_string()).with_code(ErrorCode::LimitTooLarge)
}

pub(crate) fn login_validation_error(err: LoginValidationError) -> Error {
    let field = match err {
        LoginValidationError::EmptyUsername => "username",
        LoginValidationError::EmptyPassword => "password",
    };
    ValidationError::new(Some(field), err.to_string()).with_code(ErrorCode::InvalidValue)
}

/// JSON body extraction that reports failures in the domain error shape.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        Error::invalid_request(format!("invalid request body: {err}")).into()
    })
}

/// Query string extraction that reports failures in the domain error shape.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        Error::invalid_request(format!("invalid query string: {err}")).into()
    })
}

/// Treat blank query values as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|raw| !raw.trim().is_empty())
}
