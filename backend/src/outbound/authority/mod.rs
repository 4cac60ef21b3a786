//! Remote token validation against the users service.

mod dto;
mod http_validator;

pub use http_validator::{HttpTokenValidator, SubjectFallback, SubjectField};
