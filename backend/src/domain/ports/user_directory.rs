//! Driving port for user CRUD.
//!
//! HTTP handlers depend on this trait rather than on the cache-coherent store
//! directly so they can be tested against a mock.

use async_trait::async_trait;

use crate::domain::{Error, NewUser, PageRequest, User, UserChanges, UserFilter, UserId, UserPage};

/// User CRUD as seen by the HTTP layer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Read-through single-user lookup.
    async fn get(&self, id: UserId) -> Result<User, Error>;

    /// Single-user lookup straight from the durable store.
    async fn get_uncached(&self, id: UserId) -> Result<User, Error>;

    /// Read-through listing.
    async fn list(&self, filter: &UserFilter, page: PageRequest) -> Result<UserPage, Error>;

    /// Listing straight from the durable store.
    async fn list_uncached(&self, filter: &UserFilter, page: PageRequest)
    -> Result<UserPage, Error>;

    /// Register a user; duplicate username or email yields `Conflict`.
    async fn create(&self, user: NewUser) -> Result<User, Error>;

    /// Apply a partial update; unknown ids yield `NotFound`.
    async fn update(&self, id: UserId, changes: UserChanges) -> Result<User, Error>;

    /// Remove a user and return its last snapshot.
    async fn delete(&self, id: UserId) -> Result<User, Error>;
}
