//! Read-through, write-invalidate user store.
//!
//! Reads consult the cache first and fall back to the durable repository,
//! populating the cache on a found record. Mutations commit durably, then
//! invalidate (`users:get:{id}` plus every `users:list:*` entry), then
//! repopulate the single-record entry, and only then return. Missing records
//! are never cached.
//!
//! The cache is advisory. Read failures and undecodable entries degrade to a
//! durable read. Invalidation failures after a commit are logged at `error`
//! and the mutation is still acknowledged; affected entries age out within
//! one TTL.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, error, warn};

use super::ports::{
    CacheKey, CacheStore, PasswordHasher, USER_LIST_PREFIX, UserDirectory, UserPersistenceError,
    UserRegistration, UserRepository,
};
use super::{Error, NewUser, PageRequest, User, UserChanges, UserFilter, UserId, UserPage};

/// Lifetime of cached user entries unless configured otherwise.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

const USER_NOT_FOUND: &str = "User not found";

/// Map repository failures onto domain errors.
pub(crate) fn map_user_persistence_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            error!(%message, "user repository unavailable");
            Error::service_unavailable("User store unavailable")
        }
        UserPersistenceError::Query { message } => {
            error!(%message, "user repository query failed");
            Error::internal("User store query failed")
        }
        UserPersistenceError::Conflict { field } => {
            let message = match field.as_str() {
                "email" => "Email already registered",
                "username" => "Username already taken",
                _ => "Username or email already exists",
            };
            Error::conflict(message).with_details(json!({ "field": field }))
        }
    }
}

/// User store keeping a shared cache coherent with the durable repository.
///
/// # Examples
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// use courier::domain::CacheCoherentUserStore;
/// use courier::outbound::cache::MemoryCacheStore;
/// use courier::outbound::memory::MemoryUserRepository;
/// use courier::outbound::security::Argon2PasswordHasher;
///
/// let store = CacheCoherentUserStore::new(
///     Arc::new(MemoryUserRepository::default()),
///     Arc::new(MemoryCacheStore::default()),
///     Arc::new(Argon2PasswordHasher),
/// )
/// .with_ttl(Duration::from_secs(60));
/// # let _ = store;
/// ```
#[derive(Clone)]
pub struct CacheCoherentUserStore {
    repository: Arc<dyn UserRepository>,
    cache: Arc<dyn CacheStore>,
    hasher: Arc<dyn PasswordHasher>,
    ttl: Duration,
}

impl CacheCoherentUserStore {
    /// Build a store with the default TTL.
    pub fn new(
        repository: Arc<dyn UserRepository>,
        cache: Arc<dyn CacheStore>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            repository,
            cache,
            hasher,
            ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Override the lifetime of cached entries.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Fetch one user, preferring the cache.
    pub async fn get_by_id(&self, id: UserId) -> Result<User, Error> {
        let key = CacheKey::user(id);
        if let Some(user) = self.read_cached::<User>(&key).await {
            return Ok(user);
        }
        let user = self.load_user(id).await?;
        self.populate(&key, &user).await;
        Ok(user)
    }

    /// Fetch one page of users, preferring the cache.
    pub async fn list(&self, filter: &UserFilter, page: PageRequest) -> Result<UserPage, Error> {
        let key = CacheKey::user_list(filter, page);
        if let Some(listing) = self.read_cached::<UserPage>(&key).await {
            return Ok(listing);
        }
        let listing = self.load_page(filter, page).await?;
        self.populate(&key, &listing).await;
        Ok(listing)
    }

    /// Insert a user, then sweep listings and seed its single-record entry.
    pub async fn create(&self, user: NewUser) -> Result<User, Error> {
        let password_hash = self.hasher.hash(user.password()).map_err(|err| {
            error!(error = %err, "password hashing failed");
            Error::internal("failed to hash password")
        })?;
        let registration = UserRegistration {
            username: user.username().clone(),
            email: user.email().clone(),
            password_hash,
            name: user.name().to_owned(),
            surname: user.surname().to_owned(),
            age: user.age(),
        };
        let created = self
            .repository
            .insert(&registration)
            .await
            .map_err(map_user_persistence_error)?;

        self.sweep_listings().await;
        self.populate(&CacheKey::user(created.id()), &created).await;
        Ok(created)
    }

    /// Apply a partial update, then invalidate and repopulate.
    pub async fn update(&self, id: UserId, changes: &UserChanges) -> Result<User, Error> {
        let updated = self
            .repository
            .update(id, changes)
            .await
            .map_err(map_user_persistence_error)?
            .ok_or_else(|| Error::not_found(USER_NOT_FOUND))?;

        let key = CacheKey::user(id);
        self.evict(&key).await;
        self.sweep_listings().await;
        self.populate(&key, &updated).await;
        Ok(updated)
    }

    /// Delete a user, then invalidate; returns the pre-delete snapshot.
    pub async fn delete(&self, id: UserId) -> Result<User, Error> {
        let removed = self
            .repository
            .delete(id)
            .await
            .map_err(map_user_persistence_error)?
            .ok_or_else(|| Error::not_found(USER_NOT_FOUND))?;

        self.evict(&CacheKey::user(id)).await;
        self.sweep_listings().await;
        Ok(removed)
    }

    async fn load_user(&self, id: UserId) -> Result<User, Error> {
        self.repository
            .find_by_id(id)
            .await
            .map_err(map_user_persistence_error)?
            .ok_or_else(|| Error::not_found(USER_NOT_FOUND))
    }

    async fn load_page(&self, filter: &UserFilter, page: PageRequest) -> Result<UserPage, Error> {
        let users = self
            .repository
            .find_many(filter, page)
            .await
            .map_err(map_user_persistence_error)?;
        Ok(UserPage {
            users,
            limit: page.limit(),
            offset: page.next_offset(),
        })
    }

    async fn read_cached<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let bytes = match self.cache.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(err) => {
                warn!(%key, error = %err, "cache read failed; using durable store");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                debug!(%key, "cache hit");
                Some(value)
            }
            Err(err) => {
                warn!(%key, error = %err, "discarding undecodable cache entry");
                if let Err(err) = self.cache.delete(key).await {
                    warn!(%key, error = %err, "failed to discard undecodable cache entry");
                }
                None
            }
        }
    }

    async fn populate<T: Serialize>(&self, key: &CacheKey, value: &T) {
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(%key, error = %err, "failed to encode cache entry");
                return;
            }
        };
        if let Err(err) = self.cache.set(key, &bytes, self.ttl).await {
            warn!(%key, error = %err, "cache populate failed");
        }
    }

    async fn evict(&self, key: &CacheKey) {
        if let Err(err) = self.cache.delete(key).await {
            error!(%key, error = %err, "cache invalidation failed after commit");
        }
    }

    async fn sweep_listings(&self) {
        let keys = match self.cache.scan_prefix(USER_LIST_PREFIX).await {
            Ok(keys) => keys,
            Err(err) => {
                error!(prefix = USER_LIST_PREFIX, error = %err, "listing sweep failed after commit");
                return;
            }
        };
        debug!(count = keys.len(), "sweeping cached listings");
        for key in keys {
            self.evict(&key).await;
        }
    }
}

#[async_trait]
impl UserDirectory for CacheCoherentUserStore {
    async fn get(&self, id: UserId) -> Result<User, Error> {
        self.get_by_id(id).await
    }

    async fn get_uncached(&self, id: UserId) -> Result<User, Error> {
        self.load_user(id).await
    }

    async fn list(&self, filter: &UserFilter, page: PageRequest) -> Result<UserPage, Error> {
        CacheCoherentUserStore::list(self, filter, page).await
    }

    async fn list_uncached(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> Result<UserPage, Error> {
        self.load_page(filter, page).await
    }

    async fn create(&self, user: NewUser) -> Result<User, Error> {
        CacheCoherentUserStore::create(self, user).await
    }

    async fn update(&self, id: UserId, changes: UserChanges) -> Result<User, Error> {
        CacheCoherentUserStore::update(self, id, &changes).await
    }

    async fn delete(&self, id: UserId) -> Result<User, Error> {
        CacheCoherentUserStore::delete(self, id).await
    }
}
