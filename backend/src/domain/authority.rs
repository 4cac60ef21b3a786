//! Token authority: credential checks, token minting and token resolution.
//!
//! `TokenAuthority` backs the users service's `/token` and `/validate-token`
//! endpoints. `LocalTokenValidator` adapts it to the `TokenValidator` port so
//! the users service can authenticate its own callers without an HTTP hop.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error};

use super::ports::{
    AuthError, LoginService, PasswordHasher, TokenIssuer, TokenIssuerError, TokenValidator,
    UserRepository,
};
use super::user_store::map_user_persistence_error;
use super::{
    BearerToken, Error, ErrorCode, IssuedToken, LoginCredentials, Principal, Subject, User,
};

const BAD_LOGIN: &str = "Incorrect username or password";
const BAD_TOKEN: &str = "Could not validate credentials";

/// Login service over the durable user store.
///
/// Token resolution reads the repository directly so a deleted account stops
/// authenticating immediately rather than after a cache TTL.
#[derive(Clone)]
pub struct TokenAuthority {
    repository: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    issuer: Arc<dyn TokenIssuer>,
}

impl TokenAuthority {
    /// Wire the authority to its collaborators.
    pub fn new(
        repository: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        issuer: Arc<dyn TokenIssuer>,
    ) -> Self {
        Self {
            repository,
            hasher,
            issuer,
        }
    }

    fn map_issuer_error(error: TokenIssuerError) -> Error {
        match error {
            TokenIssuerError::Invalid { message } => {
                debug!(%message, "token rejected");
                Error::unauthorized(BAD_TOKEN)
            }
            TokenIssuerError::Expired => {
                debug!("token expired");
                Error::unauthorized(BAD_TOKEN)
            }
            TokenIssuerError::Signing { message } => {
                error!(%message, "token signing failed");
                Error::internal("failed to issue token")
            }
        }
    }
}

#[async_trait]
impl LoginService for TokenAuthority {
    async fn issue_token(&self, credentials: &LoginCredentials) -> Result<IssuedToken, Error> {
        let stored = self
            .repository
            .find_credentials(credentials.username())
            .await
            .map_err(map_user_persistence_error)?
            .ok_or_else(|| Error::unauthorized(BAD_LOGIN))?;

        let matches = self
            .hasher
            .verify(credentials.password(), &stored.password_hash)
            .map_err(|err| {
                error!(error = %err, username = %credentials.username(), "stored hash unusable");
                Error::unauthorized(BAD_LOGIN)
            })?;
        if !matches {
            return Err(Error::unauthorized(BAD_LOGIN));
        }

        self.issuer
            .issue(stored.user.id(), stored.user.username().as_str())
            .map_err(Self::map_issuer_error)
    }

    async fn resolve_token(&self, token: &BearerToken) -> Result<User, Error> {
        let claims = self
            .issuer
            .verify(token.as_str())
            .map_err(Self::map_issuer_error)?;
        let user = self
            .repository
            .find_by_id(claims.user_id)
            .await
            .map_err(map_user_persistence_error)?
            .ok_or_else(|| Error::unauthorized(BAD_TOKEN))?;
        if user.username().as_str() != claims.username {
            debug!(user_id = %claims.user_id, "token names a renamed account");
            return Err(Error::unauthorized(BAD_TOKEN));
        }
        Ok(user)
    }
}

/// In-process `TokenValidator` backed by a `LoginService`.
#[derive(Clone)]
pub struct LocalTokenValidator {
    login: Arc<dyn LoginService>,
}

impl LocalTokenValidator {
    /// Validate tokens against `login` without leaving the process.
    pub fn new(login: Arc<dyn LoginService>) -> Self {
        Self { login }
    }
}

#[async_trait]
impl TokenValidator for LocalTokenValidator {
    async fn validate(&self, token: &BearerToken) -> Result<Principal, AuthError> {
        match self.login.resolve_token(token).await {
            Ok(user) => Ok(Principal::new(Subject::UserId(user.id().get()))),
            Err(err) if err.code() == ErrorCode::ServiceUnavailable => {
                Err(AuthError::authority_unavailable(err.message()))
            }
            Err(err) if err.code() == ErrorCode::Unauthorized => {
                Err(AuthError::invalid_credentials())
            }
            Err(err) => Err(AuthError::authority_unavailable(err.message())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{
        MockLoginService, MockPasswordHasher, MockTokenIssuer, MockUserRepository,
        StoredCredentials, TokenClaims, UserPersistenceError,
    };
    use crate::domain::{Email, UserId, UserParts, Username};
    use chrono::{TimeZone, Utc};
    use rstest::{fixture, rstest};

    #[fixture]
    fn ada() -> User {
        User::try_from_parts(UserParts {
            id: UserId::new(7).expect("id"),
            username: Username::new("ada").expect("username"),
            email: Email::new("ada@example.com").expect("email"),
            name: "Ada".into(),
            surname: "Lovelace".into(),
            age: None,
        })
        .expect("user")
    }

    fn credentials(password: &str) -> LoginCredentials {
        LoginCredentials::try_from_parts("ada", password).expect("credentials")
    }

    fn token() -> BearerToken {
        BearerToken::new("signed.token.value").expect("token")
    }

    fn authority(
        repository: MockUserRepository,
        hasher: MockPasswordHasher,
        issuer: MockTokenIssuer,
    ) -> TokenAuthority {
        TokenAuthority::new(Arc::new(repository), Arc::new(hasher), Arc::new(issuer))
    }

    #[rstest]
    #[tokio::test]
    async fn issues_token_for_matching_password(ada: User) {
        let mut repository = MockUserRepository::new();
        let stored = StoredCredentials {
            user: ada,
            password_hash: "hash".into(),
        };
        repository
            .expect_find_credentials()
            .withf(|username| username == "ada")
            .return_once(move |_| Ok(Some(stored)));
        let mut hasher = MockPasswordHasher::new();
        hasher
            .expect_verify()
            .withf(|password, hash| password == "pw" && hash == "hash")
            .return_once(|_, _| Ok(true));
        let mut issuer = MockTokenIssuer::new();
        let expires_at = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).single().expect("time");
        issuer
            .expect_issue()
            .withf(|id, username| id.get() == 7 && username == "ada")
            .return_once(move |_, _| {
                Ok(IssuedToken {
                    access_token: "jwt".into(),
                    expires_at,
                })
            });

        let issued = authority(repository, hasher, issuer)
            .issue_token(&credentials("pw"))
            .await
            .expect("token issued");

        assert_eq!(issued.access_token, "jwt");
    }

    #[rstest]
    #[tokio::test]
    async fn wrong_password_is_unauthorized(ada: User) {
        let mut repository = MockUserRepository::new();
        let stored = StoredCredentials {
            user: ada,
            password_hash: "hash".into(),
        };
        repository
            .expect_find_credentials()
            .return_once(move |_| Ok(Some(stored)));
        let mut hasher = MockPasswordHasher::new();
        hasher.expect_verify().return_once(|_, _| Ok(false));
        let mut issuer = MockTokenIssuer::new();
        issuer.expect_issue().never();

        let err = authority(repository, hasher, issuer)
            .issue_token(&credentials("nope"))
            .await
            .expect_err("rejected");

        assert_eq!(err.code(), ErrorCode::Unauthorized);
        assert_eq!(err.message(), BAD_LOGIN);
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_username_is_indistinguishable_from_wrong_password() {
        let mut repository = MockUserRepository::new();
        repository
            .expect_find_credentials()
            .return_once(|_| Ok(None));
        let mut hasher = MockPasswordHasher::new();
        hasher.expect_verify().never();

        let err = authority(repository, hasher, MockTokenIssuer::new())
            .issue_token(&credentials("pw"))
            .await
            .expect_err("rejected");

        assert_eq!(err.message(), BAD_LOGIN);
    }

    #[rstest]
    #[tokio::test]
    async fn resolves_token_to_live_account(ada: User) {
        let mut issuer = MockTokenIssuer::new();
        issuer.expect_verify().return_once(|_| {
            Ok(TokenClaims {
                user_id: UserId::new(7).expect("id"),
                username: "ada".into(),
            })
        });
        let mut repository = MockUserRepository::new();
        let found = ada.clone();
        repository
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(found)));

        let user = authority(repository, MockPasswordHasher::new(), issuer)
            .resolve_token(&token())
            .await
            .expect("resolved");

        assert_eq!(user, ada);
    }

    #[rstest]
    #[case(TokenIssuerError::expired())]
    #[case(TokenIssuerError::invalid("bad signature"))]
    #[tokio::test]
    async fn rejected_tokens_are_unauthorized(#[case] failure: TokenIssuerError) {
        let mut issuer = MockTokenIssuer::new();
        issuer.expect_verify().return_once(move |_| Err(failure));
        let mut repository = MockUserRepository::new();
        repository.expect_find_by_id().never();

        let err = authority(repository, MockPasswordHasher::new(), issuer)
            .resolve_token(&token())
            .await
            .expect_err("rejected");

        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[rstest]
    #[tokio::test]
    async fn deleted_account_no_longer_resolves() {
        let mut issuer = MockTokenIssuer::new();
        issuer.expect_verify().return_once(|_| {
            Ok(TokenClaims {
                user_id: UserId::new(7).expect("id"),
                username: "ada".into(),
            })
        });
        let mut repository = MockUserRepository::new();
        repository.expect_find_by_id().return_once(|_| Ok(None));

        let err = authority(repository, MockPasswordHasher::new(), issuer)
            .resolve_token(&token())
            .await
            .expect_err("rejected");

        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[rstest]
    #[tokio::test]
    async fn repository_outage_surfaces_as_unavailable() {
        let mut issuer = MockTokenIssuer::new();
        issuer.expect_verify().return_once(|_| {
            Ok(TokenClaims {
                user_id: UserId::new(7).expect("id"),
                username: "ada".into(),
            })
        });
        let mut repository = MockUserRepository::new();
        repository
            .expect_find_by_id()
            .return_once(|_| Err(UserPersistenceError::connection("refused")));

        let err = authority(repository, MockPasswordHasher::new(), issuer)
            .resolve_token(&token())
            .await
            .expect_err("unavailable");

        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }

    #[rstest]
    #[tokio::test]
    async fn local_validator_yields_user_id_principal(ada: User) {
        let mut login = MockLoginService::new();
        login.expect_resolve_token().return_once(move |_| Ok(ada));

        let principal = LocalTokenValidator::new(Arc::new(login))
            .validate(&token())
            .await
            .expect("principal");

        assert_eq!(principal.subject(), &Subject::UserId(7));
    }

    #[rstest]
    #[case(Error::unauthorized(BAD_TOKEN), AuthError::invalid_credentials())]
    #[case(
        Error::service_unavailable("User store unavailable"),
        AuthError::authority_unavailable("User store unavailable")
    )]
    #[tokio::test]
    async fn local_validator_maps_failures(#[case] failure: Error, #[case] expected: AuthError) {
        let mut login = MockLoginService::new();
        login
            .expect_resolve_token()
            .return_once(move |_| Err(failure));

        let err = LocalTokenValidator::new(Arc::new(login))
            .validate(&token())
            .await
            .expect_err("rejected");

        assert_eq!(err, expected);
    }
}
