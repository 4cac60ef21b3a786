//! Process-local repositories used when no database is configured.
//!
//! Each instance owns its own state; nothing is shared between instances or
//! kept in globals. Data is lost when the process exits.

mod delivery_repository;
mod user_repository;

pub use delivery_repository::MemoryDeliveryRepository;
pub use user_repository::MemoryUserRepository;
