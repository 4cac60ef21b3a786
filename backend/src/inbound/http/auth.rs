//! Token endpoints served by the users service.
//!
//! ```text
//! POST /token {"username":"ada","password":"secret"}
//! POST /validate-token   (Authorization: Bearer <token>)
//! ```

use actix_web::{Either, HttpRequest, HttpResponse, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::{Error, LoginCredentials, LoginValidationError, User};
use crate::inbound::http::ApiResult;
use crate::inbound::http::authenticated::bearer_token;
use crate::inbound::http::state::UsersState;
use crate::inbound::http::validation::login_validation_error;

/// Login request body, accepted as JSON or as an OAuth2 password form.
#[derive(Debug, Deserialize, Serialize)]
pub struct LoginRequest {
    /// Login name.
    pub username: String,
    /// Plaintext password.
    pub password: String,
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.username, &value.password)
    }
}

/// OAuth2-style token grant returned by `/token`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    /// Signed bearer token.
    pub access_token: String,
    /// Always `bearer`.
    pub token_type: String,
}

/// Body returned by `/validate-token`, consumed by remote validators.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidatedUserResponse {
    /// Login name of the token's owner.
    pub username: String,
    /// Id of the token's owner.
    pub user_id: i64,
}

impl From<User> for ValidatedUserResponse {
    fn from(user: User) -> Self {
        Self {
            username: user.username().as_str().to_owned(),
            user_id: user.id().get(),
        }
    }
}

/// Exchange credentials for a bearer token.
#[post("/token")]
pub async fn issue_token(
    state: web::Data<UsersState>,
    payload: Either<web::Json<LoginRequest>, web::Form<LoginRequest>>,
) -> ApiResult<web::Json<TokenResponse>> {
    let request = match payload {
        Either::Left(json) => json.into_inner(),
        Either::Right(form) => form.into_inner(),
    };
    let credentials = LoginCredentials::try_from(request).map_err(login_validation_error)?;
    let issued = state.login.issue_token(&credentials).await?;
    Ok(web::Json(TokenResponse {
        access_token: issued.access_token,
        token_type: "bearer".to_owned(),
    }))
}

/// Resolve the presented bearer token to its user.
#[post("/validate-token")]
pub async fn validate_token(
    state: web::Data<UsersState>,
    req: HttpRequest,
) -> ApiResult<HttpResponse> {
    let token = bearer_token(req.headers()).map_err(Error::from)?;
    let user = state.login.resolve_token(&token).await?;
    Ok(HttpResponse::Ok().json(ValidatedUserResponse::from(user)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::ports::{MockLoginService, MockUserDirectory};
    use crate::domain::{IssuedToken, UserId, UserParts, Username, Email};
    use crate::test_support::fixture_instant;
    use actix_web::http::StatusCode;
    use actix_web::http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
    use actix_web::{App, test};
    use serde_json::Value;

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

    async fn app(
        login: MockLoginService,
    ) -> impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    > {
        let state = UsersState::new(Arc::new(login), Arc::new(MockUserDirectory::new()));
        test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(issue_token)
                .service(validate_token),
        )
        .await
    }

    #[actix_web::test]
    async fn json_login_returns_a_bearer_token() {
        let mut login = MockLoginService::new();
        login
            .expect_issue_token()
            .withf(|creds| creds.username() == "ada" && creds.password() == "secret")
            .times(1)
            .return_once(|_| {
                Ok(IssuedToken {
                    access_token: "signed".into(),
                    expires_at: fixture_instant(),
                })
            });
        let app = app(login).await;

        let body: TokenResponse = test::call_and_read_body_json(
            &app,
            test::TestRequest::post()
                .uri("/token")
                .set_json(LoginRequest {
                    username: "ada".into(),
                    password: "secret".into(),
                })
                .to_request(),
        )
        .await;

        assert_eq!(
            body,
            TokenResponse {
                access_token: "signed".into(),
                token_type: "bearer".into(),
            }
        );
    }

    #[actix_web::test]
    async fn form_login_is_accepted() {
        let mut login = MockLoginService::new();
        login.expect_issue_token().times(1).return_once(|_| {
            Ok(IssuedToken {
                access_token: "signed".into(),
                expires_at: fixture_instant(),
            })
        });
        let app = app(login).await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/token")
                .set_form([("username", "ada"), ("password", "secret")])
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn wrong_credentials_are_unauthorized() {
        let mut login = MockLoginService::new();
        login
            .expect_issue_token()
            .return_once(|_| Err(Error::unauthorized("Incorrect username or password")));
        let app = app(login).await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/token")
                .set_json(LoginRequest {
                    username: "ada".into(),
                    password: "nope".into(),
                })
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert!(res.headers().contains_key(WWW_AUTHENTICATE));
    }

    #[actix_web::test]
    async fn blank_username_is_rejected_before_lookup() {
        let mut login = MockLoginService::new();
        login.expect_issue_token().never();
        let app = app(login).await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/token")
                .set_json(LoginRequest {
                    username: "  ".into(),
                    password: "secret".into(),
                })
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["details"]["field"], "username");
    }

    #[actix_web::test]
    async fn validate_token_returns_username_and_id() {
        let mut login = MockLoginService::new();
        login
            .expect_resolve_token()
            .withf(|token| token.as_str() == "signed")
            .times(1)
            .return_once(|_| Ok(ada()));
        let app = app(login).await;

        let body: ValidatedUserResponse = test::call_and_read_body_json(
            &app,
            test::TestRequest::post()
                .uri("/validate-token")
                .insert_header((AUTHORIZATION, "Bearer signed"))
                .to_request(),
        )
        .await;

        assert_eq!(
            body,
            ValidatedUserResponse {
                username: "ada".into(),
                user_id: 7,
            }
        );
    }

    #[actix_web::test]
    async fn validate_token_without_header_is_unauthorized() {
        let mut login = MockLoginService::new();
        login.expect_resolve_token().never();
        let app = app(login).await;

        let res = test::call_service(
            &app,
            test::TestRequest::post().uri("/validate-token").to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
