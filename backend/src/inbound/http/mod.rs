//! HTTP inbound adapter exposing REST endpoints.

pub mod auth;
pub mod authenticated;
pub mod deliveries;
pub mod error;
pub mod health;
pub mod state;
pub mod users;
pub mod validation;

pub use authenticated::Authenticated;
pub use error::ApiResult;
