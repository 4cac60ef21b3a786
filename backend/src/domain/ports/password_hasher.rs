//! Port for one-way password hashing.
use super::define_port_error;

define_port_error! {
    /// Hashing failures. Wrong passwords are not errors.
    pub enum PasswordHashError {
        /// The stored hash could not be parsed.
        Malformed { message: String } => "stored password hash is malformed: {message}",
        /// Hashing itself failed.
        Hashing { message: String } => "password hashing failed: {message}",
    }
}

/// Hash and verify passwords; the algorithm is an adapter choice.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    /// Produce a self-describing hash string for storage.
    fn hash(&self, password: &str) -> Result<String, PasswordHashError>;

    /// Whether `password` matches `stored_hash`.
    fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, PasswordHashError>;
}
