//! Users authority and delivery services.
//!
//! The users service issues and validates bearer tokens and fronts its user
//! table with a cache-coherent store. The delivery service manages delivery
//! records and authenticates every request against the users service.

pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use domain::TraceId;
pub use middleware::Trace;
