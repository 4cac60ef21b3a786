//! Canonical cache keys for user reads.
//!
//! Keys are namespaced so a single prefix sweep can drop every cached
//! listing: `users:get:{id}` for single records and `users:list:{query}` for
//! listings, where `{query}` is the form-encoded filter and paging tuple with
//! absent filters omitted and fields in a fixed order.

use thiserror::Error;
use url::form_urlencoded;

use crate::domain::{PageRequest, UserFilter, UserId};

/// Prefix shared by every cached single-user entry.
pub const USER_GET_PREFIX: &str = "users:get:";
/// Prefix shared by every cached listing; swept on any mutation.
pub const USER_LIST_PREFIX: &str = "users:list:";

/// Validated cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Construct a cache key after validating that it is non-empty and trimmed.
    pub fn new(value: impl Into<String>) -> Result<Self, CacheKeyValidationError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(CacheKeyValidationError::Empty);
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(CacheKeyValidationError::ContainsWhitespace);
        }
        Ok(Self(raw))
    }

    /// Key for a single user snapshot.
    ///
    /// # Examples
    /// ```
    /// use courier::domain::UserId;
    /// use courier::domain::ports::CacheKey;
    ///
    /// let key = CacheKey::user(UserId::new(7).unwrap());
    /// assert_eq!(key.as_str(), "users:get:7");
    /// ```
    pub fn user(id: UserId) -> Self {
        Self(format!("{USER_GET_PREFIX}{id}"))
    }

    /// Key for one listing query.
    ///
    /// Equal `(filter, page)` tuples always produce equal keys; any differing
    /// component produces a different key.
    ///
    /// # Examples
    /// ```
    /// use courier::domain::{PageRequest, UserFilter};
    /// use courier::domain::ports::CacheKey;
    ///
    /// let filter = UserFilter { name: Some("Ada".into()), ..UserFilter::default() };
    /// let key = CacheKey::user_list(&filter, PageRequest::new(50, 0).unwrap());
    /// assert_eq!(key.as_str(), "users:list:name=Ada&limit=50&offset=0");
    /// ```
    pub fn user_list(filter: &UserFilter, page: PageRequest) -> Self {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if let Some(username) = &filter.username {
            query.append_pair("username", username);
        }
        if let Some(name) = &filter.name {
            query.append_pair("name", name);
        }
        if let Some(surname) = &filter.surname {
            query.append_pair("surname", surname);
        }
        query.append_pair("limit", &page.limit().to_string());
        query.append_pair("offset", &page.offset().to_string());
        Self(format!("{USER_LIST_PREFIX}{}", query.finish()))
    }

    /// Borrow the underlying key as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Validation errors returned when constructing [`CacheKey`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheKeyValidationError {
    /// Key is empty after trimming whitespace.
    #[error("cache key must not be empty")]
    Empty,
    /// Key contains whitespace, which Redis clients would need to quote.
    #[error("cache key must not contain whitespace")]
    ContainsWhitespace,
}
