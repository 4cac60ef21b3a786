//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **authority**: reqwest client validating tokens against the users service
//! - **cache**: Redis-backed and in-memory `CacheStore` implementations
//! - **memory**: in-process repositories used when no database is configured
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **security**: Argon2 password hashing and HS256 token issuance
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod authority;
pub mod cache;
pub mod memory;
pub mod persistence;
pub mod security;
