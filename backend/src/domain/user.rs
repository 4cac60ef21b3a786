//! User records owned by the users service.
//!
//! Wire and cache encodings share the same JSON shape:
//! `{"id":1,"username":"ada","email":"ada@example.com","name":"Ada","surname":"Lovelace","age":36}`.
//! Password material never appears on a [`User`]; it only travels inward on
//! [`NewUser`] and is hashed before it reaches a repository.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Maximum accepted username length in characters.
pub const USERNAME_MAX: usize = 64;

/// Validation errors raised while building user values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// Id is zero or negative.
    #[error("user id must be a positive integer")]
    InvalidId,
    /// Username is blank after trimming.
    #[error("username must not be empty")]
    EmptyUsername,
    /// Username exceeds [`USERNAME_MAX`].
    #[error("username must be at most {max} characters")]
    UsernameTooLong {
        /// Accepted maximum, in characters.
        max: usize,
    },
    /// Email does not look like `local@domain`.
    #[error("email address is not valid")]
    InvalidEmail,
    /// Name is blank after trimming.
    #[error("name must not be empty")]
    EmptyName,
    /// Surname is blank after trimming.
    #[error("surname must not be empty")]
    EmptySurname,
    /// Age is below zero.
    #[error("age must not be negative")]
    NegativeAge,
    /// Password is the empty string.
    #[error("password must not be empty")]
    EmptyPassword,
    /// Partial update carried no fields.
    #[error("at least one field must be updated")]
    NoChanges,
}

impl UserValidationError {
    /// Name of the offending field, when the failure is tied to one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidId => Some("user_id"),
            Self::EmptyUsername | Self::UsernameTooLong { .. } => Some("username"),
            Self::InvalidEmail => Some("email"),
            Self::EmptyName => Some("name"),
            Self::EmptySurname => Some("surname"),
            Self::NegativeAge => Some("age"),
            Self::EmptyPassword => Some("password"),
            Self::NoChanges => None,
        }
    }
}

/// Positive integer identifier assigned by the durable store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct UserId(i64);

impl UserId {
    /// Validate and wrap a raw identifier.
    ///
    /// # Examples
    /// ```
    /// use courier::domain::UserId;
    ///
    /// assert_eq!(UserId::new(5).unwrap().get(), 5);
    /// assert!(UserId::new(0).is_err());
    /// ```
    pub fn new(raw: i64) -> Result<Self, UserValidationError> {
        if raw <= 0 {
            return Err(UserValidationError::InvalidId);
        }
        Ok(Self(raw))
    }

    /// Raw numeric value.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for UserId {
    type Error = UserValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for i64 {
    fn from(value: UserId) -> Self {
        value.0
    }
}

/// Unique login handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Trim and validate a username.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyUsername);
        }
        if trimmed.chars().count() > USERNAME_MAX {
            return Err(UserValidationError::UsernameTooLong { max: USERNAME_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the username text.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Username {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Unique contact address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Trim and validate an email address.
    ///
    /// # Examples
    /// ```
    /// use courier::domain::Email;
    ///
    /// assert!(Email::new("ada@example.com").is_ok());
    /// assert!(Email::new("not-an-email").is_err());
    /// ```
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = raw.as_ref().trim();
        if !email_regex().is_match(trimmed) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the address text.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

fn non_empty(
    raw: impl Into<String>,
    error: UserValidationError,
) -> Result<String, UserValidationError> {
    let raw = raw.into();
    if raw.trim().is_empty() {
        return Err(error);
    }
    Ok(raw)
}

fn non_negative(age: Option<i32>) -> Result<Option<i32>, UserValidationError> {
    match age {
        Some(value) if value < 0 => Err(UserValidationError::NegativeAge),
        other => Ok(other),
    }
}

/// Persisted user snapshot.
///
/// ## Invariants
/// - `name` and `surname` are non-empty once trimmed.
/// - `age`, when present, is non-negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UserDto", into = "UserDto")]
pub struct User {
    id: UserId,
    username: Username,
    email: Email,
    name: String,
    surname: String,
    age: Option<i32>,
}

/// Field bundle used to assemble a [`User`] from storage rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserParts {
    /// Store-assigned id.
    pub id: UserId,
    /// Unique login name.
    pub username: Username,
    /// Unique contact address.
    pub email: Email,
    /// Given name.
    pub name: String,
    /// Family name.
    pub surname: String,
    /// Age in years, if known.
    pub age: Option<i32>,
}

impl User {
    /// Assemble a user after validating the free-text fields.
    pub fn try_from_parts(parts: UserParts) -> Result<Self, UserValidationError> {
        let UserParts {
            id,
            username,
            email,
            name,
            surname,
            age,
        } = parts;
        Ok(Self {
            id,
            username,
            email,
            name: non_empty(name, UserValidationError::EmptyName)?,
            surname: non_empty(surname, UserValidationError::EmptySurname)?,
            age: non_negative(age)?,
        })
    }

    /// Store-assigned id.
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Unique login name.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Unique contact address.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Given name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Family name.
    pub fn surname(&self) -> &str {
        self.surname.as_str()
    }

    /// Age in years, if known.
    pub fn age(&self) -> Option<i32> {
        self.age
    }

    /// Return a copy with `changes` applied over the current values.
    pub fn with_changes(&self, changes: &UserChanges) -> Self {
        Self {
            id: self.id,
            username: self.username.clone(),
            email: changes.email.clone().unwrap_or_else(|| self.email.clone()),
            name: changes.name.clone().unwrap_or_else(|| self.name.clone()),
            surname: changes
                .surname
                .clone()
                .unwrap_or_else(|| self.surname.clone()),
            age: changes.age.or(self.age),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserDto {
    id: i64,
    username: String,
    email: String,
    name: String,
    surname: String,
    age: Option<i32>,
}

impl From<User> for UserDto {
    fn from(value: User) -> Self {
        Self {
            id: value.id.get(),
            username: value.username.into(),
            email: value.email.into(),
            name: value.name,
            surname: value.surname,
            age: value.age,
        }
    }
}

impl TryFrom<UserDto> for User {
    type Error = UserValidationError;

    fn try_from(value: UserDto) -> Result<Self, Self::Error> {
        User::try_from_parts(UserParts {
            id: UserId::new(value.id)?,
            username: Username::new(value.username)?,
            email: Email::new(value.email)?,
            name: value.name,
            surname: value.surname,
            age: value.age,
        })
    }
}

/// Registration payload carrying the plaintext password.
///
/// The password is zeroised on drop and never leaves the users service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    username: Username,
    email: Email,
    password: Zeroizing<String>,
    name: String,
    surname: String,
    age: Option<i32>,
}

/// Raw registration fields as received from an inbound adapter.
#[derive(Debug, Clone, Default)]
pub struct NewUserInput<'a> {
    /// Requested login name.
    pub username: &'a str,
    /// Requested contact address.
    pub email: &'a str,
    /// Plaintext password.
    pub password: &'a str,
    /// Given name.
    pub name: &'a str,
    /// Family name.
    pub surname: &'a str,
    /// Age in years.
    pub age: Option<i32>,
}

impl NewUser {
    /// Validate registration inputs.
    ///
    /// # Examples
    /// ```
    /// use courier::domain::{NewUser, NewUserInput};
    ///
    /// let user = NewUser::try_from_input(NewUserInput {
    ///     username: "ada",
    ///     email: "ada@example.com",
    ///     password: "secret",
    ///     name: "Ada",
    ///     surname: "Lovelace",
    ///     age: Some(36),
    /// })
    /// .unwrap();
    /// assert_eq!(user.username().as_str(), "ada");
    /// ```
    pub fn try_from_input(input: NewUserInput<'_>) -> Result<Self, UserValidationError> {
        if input.password.is_empty() {
            return Err(UserValidationError::EmptyPassword);
        }
        Ok(Self {
            username: Username::new(input.username)?,
            email: Email::new(input.email)?,
            password: Zeroizing::new(input.password.to_owned()),
            name: non_empty(input.name, UserValidationError::EmptyName)?,
            surname: non_empty(input.surname, UserValidationError::EmptySurname)?,
            age: non_negative(input.age)?,
        })
    }

    /// Requested login name.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Requested contact address.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Plaintext password, to be hashed before storage.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    /// Given name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Family name.
    pub fn surname(&self) -> &str {
        self.surname.as_str()
    }

    /// Age in years, if given.
    pub fn age(&self) -> Option<i32> {
        self.age
    }
}

/// Partial update applied to an existing user.
///
/// At least one field is always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserChanges {
    name: Option<String>,
    surname: Option<String>,
    email: Option<Email>,
    age: Option<i32>,
}

impl UserChanges {
    /// Validate a partial update.
    pub fn try_new(
        name: Option<String>,
        surname: Option<String>,
        email: Option<String>,
        age: Option<i32>,
    ) -> Result<Self, UserValidationError> {
        if name.is_none() && surname.is_none() && email.is_none() && age.is_none() {
            return Err(UserValidationError::NoChanges);
        }
        Ok(Self {
            name: name
                .map(|value| non_empty(value, UserValidationError::EmptyName))
                .transpose()?,
            surname: surname
                .map(|value| non_empty(value, UserValidationError::EmptySurname))
                .transpose()?,
            email: email.map(Email::new).transpose()?,
            age: non_negative(age)?,
        })
    }

    /// Replacement name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Replacement surname, if any.
    pub fn surname(&self) -> Option<&str> {
        self.surname.as_deref()
    }

    /// Replacement email, if any.
    pub fn email(&self) -> Option<&Email> {
        self.email.as_ref()
    }

    /// Replacement age, if any.
    pub fn age(&self) -> Option<i32> {
        self.age
    }
}

/// Exact-match filters applied to user listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct UserFilter {
    /// Match on login name.
    pub username: Option<String>,
    /// Match on given name.
    pub name: Option<String>,
    /// Match on family name.
    pub surname: Option<String>,
}

impl UserFilter {
    /// Whether `user` satisfies every present filter.
    pub fn matches(&self, user: &User) -> bool {
        self.username
            .as_deref()
            .is_none_or(|value| user.username().as_str() == value)
            && self.name.as_deref().is_none_or(|value| user.name() == value)
            && self
                .surname
                .as_deref()
                .is_none_or(|value| user.surname() == value)
    }
}

/// One page of users plus the paging cursor handed back to clients.
///
/// `offset` is the offset of the *next* page (`requested offset + limit`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPage {
    /// Users on this page, ordered by id.
    pub users: Vec<User>,
    /// Page size that was requested.
    pub limit: u32,
    /// Offset of the next page.
    pub offset: u32,
}
