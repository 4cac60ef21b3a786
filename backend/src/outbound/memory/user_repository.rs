//! In-memory `UserRepository` with the same uniqueness rules as PostgreSQL.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{
    StoredCredentials, UserPersistenceError, UserRegistration, UserRepository,
};
use crate::domain::{PageRequest, User, UserChanges, UserFilter, UserId, UserParts};

#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    password_hash: String,
}

#[derive(Debug, Default)]
struct State {
    rows: BTreeMap<i64, StoredUser>,
    last_id: i64,
}

impl State {
    fn conflicting_field(
        &self,
        except: Option<UserId>,
        username: &str,
        email: &str,
    ) -> Option<&'static str> {
        let others = self
            .rows
            .values()
            .filter(|row| Some(row.user.id()) != except);
        for row in others {
            if row.user.username().as_str() == username {
                return Some("username");
            }
            if row.user.email().as_str() == email {
                return Some("email");
            }
        }
        None
    }
}

/// Mutex-guarded user table ordered by id.
#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    state: Mutex<State>,
}

impl MemoryUserRepository {
    fn lock(&self) -> Result<MutexGuard<'_, State>, UserPersistenceError> {
        self.state
            .lock()
            .map_err(|_| UserPersistenceError::connection("user table lock poisoned"))
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn insert(&self, registration: &UserRegistration) -> Result<User, UserPersistenceError> {
        let mut state = self.lock()?;
        if let Some(field) = state.conflicting_field(
            None,
            registration.username.as_str(),
            registration.email.as_str(),
        ) {
            return Err(UserPersistenceError::conflict(field));
        }
        let next_id = state.last_id + 1;
        let id =
            UserId::new(next_id).map_err(|err| UserPersistenceError::query(err.to_string()))?;
        let user = User::try_from_parts(UserParts {
            id,
            username: registration.username.clone(),
            email: registration.email.clone(),
            name: registration.name.clone(),
            surname: registration.surname.clone(),
            age: registration.age,
        })
        .map_err(|err| UserPersistenceError::query(err.to_string()))?;
        state.last_id = next_id;
        state.rows.insert(
            next_id,
            StoredUser {
                user: user.clone(),
                password_hash: registration.password_hash.clone(),
            },
        );
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(self.lock()?.rows.get(&id.get()).map(|row| row.user.clone()))
    }

    async fn find_many(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> Result<Vec<User>, UserPersistenceError> {
        let state = self.lock()?;
        Ok(state
            .rows
            .values()
            .map(|row| &row.user)
            .filter(|user| filter.matches(user))
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .cloned()
            .collect())
    }

    async fn update(
        &self,
        id: UserId,
        changes: &UserChanges,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut state = self.lock()?;
        let Some(current) = state.rows.get(&id.get()).map(|row| row.user.clone()) else {
            return Ok(None);
        };
        let updated = current.with_changes(changes);
        if let Some(field) = state.conflicting_field(
            Some(id),
            updated.username().as_str(),
            updated.email().as_str(),
        ) {
            return Err(UserPersistenceError::conflict(field));
        }
        if let Some(row) = state.rows.get_mut(&id.get()) {
            row.user = updated.clone();
        }
        Ok(Some(updated))
    }

    async fn delete(&self, id: UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(self.lock()?.rows.remove(&id.get()).map(|row| row.user))
    }

    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<StoredCredentials>, UserPersistenceError> {
        let state = self.lock()?;
        Ok(state
            .rows
            .values()
            .find(|row| row.user.username().as_str() == username)
            .map(|row| StoredCredentials {
                user: row.user.clone(),
                password_hash: row.password_hash.clone(),
            }))
    }
}
