//! Actix rendering of domain errors.
//!
//! Every failure leaves as the camelCase `Error` JSON plus the request's
//! `trace-id` header. 401s carry a bearer challenge. Internal failures are
//! logged in full and replaced by a generic message on the wire.

use actix_web::http::header::WWW_AUTHENTICATE;
use actix_web::{HttpResponse, HttpResponseBuilder, ResponseError, http::StatusCode};
use tracing::error;

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

/// Handler result whose error renders through [`ResponseError`].
pub type ApiResult<T> = Result<T, Error>;

const BEARER_CHALLENGE: &str = "Bearer";
const REDACTED_MESSAGE: &str = "Internal server error";

/// Body actually sent to the client.
fn public_payload(err: &Error) -> Error {
    if err.code() != ErrorCode::InternalError {
        return err.clone();
    }
    error!(
        message = err.message(),
        trace_id = err.trace_id().unwrap_or_default(),
        "internal error redacted from response"
    );
    let redacted = Error::internal(REDACTED_MESSAGE);
    match err.trace_id() {
        Some(id) => redacted.with_trace_id(id.to_owned()),
        None => redacted,
    }
}

fn stamp_headers(builder: &mut HttpResponseBuilder, err: &Error) {
    if let Some(id) = err.trace_id() {
        builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
    }
    if err.code() == ErrorCode::Unauthorized {
        builder.insert_header((WWW_AUTHENTICATE, BEARER_CHALLENGE));
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self.code() {
            ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        stamp_headers(&mut builder, self);
        builder.json(public_payload(self))
    }
}
