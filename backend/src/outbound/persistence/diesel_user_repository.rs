//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! Unique-constraint violations surface as `UserPersistenceError::Conflict`
//! naming the offending column. Updates run inside a transaction so a
//! violation leaves the row untouched.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{
    StoredCredentials, UserPersistenceError, UserRegistration, UserRepository,
};
use crate::domain::{
    Email, PageRequest, User, UserChanges, UserFilter, UserId, UserParts, UserValidationError,
    Username,
};

use super::diesel_basic_error_mapping::{
    map_basic_diesel_error, map_basic_pool_error, unique_violation_field,
};
use super::models::{NewUserRow, UserChangeset, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    map_basic_pool_error(error, UserPersistenceError::connection)
}

fn map_diesel_error(error: DieselError) -> UserPersistenceError {
    if let DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) = &error {
        return UserPersistenceError::conflict(unique_violation_field(&**info));
    }
    map_basic_diesel_error(
        error,
        UserPersistenceError::query,
        UserPersistenceError::connection,
    )
}

/// Convert a row to a domain user, rejecting rows that break invariants.
fn row_to_user(row: UserRow) -> Result<User, UserPersistenceError> {
    let row_id = row.id;
    let corrupt = move |err: UserValidationError| {
        UserPersistenceError::query(format!("invalid user row {row_id}: {err}"))
    };
    User::try_from_parts(UserParts {
        id: UserId::new(row.id).map_err(corrupt)?,
        username: Username::new(&row.username).map_err(corrupt)?,
        email: Email::new(&row.email).map_err(corrupt)?,
        name: row.name,
        surname: row.surname,
        age: row.age,
    })
    .map_err(corrupt)
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(&self, registration: &UserRegistration) -> Result<User, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewUserRow {
            username: registration.username.as_str(),
            email: registration.email.as_str(),
            password_hash: &registration.password_hash,
            name: &registration.name,
            surname: &registration.surname,
            age: registration.age,
        };

        let stored: UserRow = diesel::insert_into(users::table)
            .values(&row)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        row_to_user(stored)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::id.eq(id.get()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_user).transpose()
    }

    async fn find_many(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> Result<Vec<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = users::table
            .select(UserRow::as_select())
            .order(users::id.asc())
            .limit(i64::from(page.limit()))
            .offset(i64::from(page.offset()))
            .into_boxed();
        if let Some(username) = &filter.username {
            query = query.filter(users::username.eq(username.clone()));
        }
        if let Some(name) = &filter.name {
            query = query.filter(users::name.eq(name.clone()));
        }
        if let Some(surname) = &filter.surname {
            query = query.filter(users::surname.eq(surname.clone()));
        }

        let rows: Vec<UserRow> = query.load(&mut conn).await.map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_user).collect()
    }

    async fn update(
        &self,
        id: UserId,
        changes: &UserChanges,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changeset = UserChangeset {
            name: changes.name(),
            surname: changes.surname(),
            email: changes.email().map(Email::as_str),
            age: changes.age(),
        };

        let row: Option<UserRow> = conn
            .transaction(|conn| {
                async move {
                    diesel::update(users::table.filter(users::id.eq(id.get())))
                        .set(&changeset)
                        .returning(UserRow::as_returning())
                        .get_result(conn)
                        .await
                        .optional()
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        row.map(row_to_user).transpose()
    }

    async fn delete(&self, id: UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = diesel::delete(users::table.filter(users::id.eq(id.get())))
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_user).transpose()
    }

    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<StoredCredentials>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::username.eq(username))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(|row| {
            let password_hash = row.password_hash.clone();
            row_to_user(row).map(|user| StoredCredentials {
                user,
                password_hash,
            })
        })
        .transpose()
    }
}
