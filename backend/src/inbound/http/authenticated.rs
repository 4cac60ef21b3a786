//! Bearer-token authentication for HTTP handlers.
//!
//! Handlers that take an [`Authenticated`] argument only run once the
//! request's token has been accepted by the registered `TokenValidator`.
//! The validator is registered as `web::Data<dyn TokenValidator>`.

use actix_web::http::header::{AUTHORIZATION, HeaderMap};
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;
use tracing::error;

use crate::domain::ports::{AuthError, TokenValidator};
use crate::domain::{BearerToken, Error, Principal};

/// Principal resolved for the current request.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Principal);

impl Authenticated {
    /// The resolved caller.
    pub fn principal(&self) -> &Principal {
        &self.0
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// The scheme is matched case-insensitively. Anything else is
/// `AuthError::Unauthenticated`.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<BearerToken, AuthError> {
    let raw = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(AuthError::unauthenticated)?;
    let (scheme, token) = raw
        .trim()
        .split_once(' ')
        .ok_or_else(AuthError::unauthenticated)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::unauthenticated());
    }
    BearerToken::new(token).map_err(|_| AuthError::unauthenticated())
}

impl FromRequest for Authenticated {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = bearer_token(req.headers());
        let validator = req.app_data::<web::Data<dyn TokenValidator>>().cloned();
        Box::pin(async move {
            let token = token?;
            let Some(validator) = validator else {
                error!("no token validator registered");
                return Err(Error::internal("token validator not configured"));
            };
            let principal = validator.validate(&token).await?;
            Ok(Authenticated(principal))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::Subject;
    use crate::domain::ports::MockTokenValidator;
    use actix_web::http::StatusCode;
    use actix_web::http::header::{HeaderValue, WWW_AUTHENTICATE};
    use actix_web::test as actix_test;
    use actix_web::{App, HttpResponse};
    use rstest::rstest;

    fn headers(value: Option<&'static str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(value) = value {
            headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
        }
        headers
    }

    #[rstest]
    #[case(Some("Bearer abc.def"), "abc.def")]
    #[case(Some("bearer abc.def"), "abc.def")]
    #[case(Some("  BEARER   abc.def "), "abc.def")]
    fn bearer_headers_yield_tokens(#[case] header: Option<&'static str>, #[case] expected: &str) {
        let token = bearer_token(&headers(header)).expect("token");
        assert_eq!(token.as_str(), expected);
    }

    #[rstest]
    #[case(None)]
    #[case(Some("Bearer"))]
    #[case(Some("Bearer    "))]
    #[case(Some("Basic YWRhOnNlY3JldA=="))]
    #[case(Some("abc.def"))]
    fn malformed_headers_are_unauthenticated(#[case] header: Option<&'static str>) {
        assert_eq!(
            bearer_token(&headers(header)),
            Err(AuthError::Unauthenticated)
        );
    }

    async fn call(validator: MockTokenValidator, header: Option<&'static str>) -> (StatusCode, String) {
        let validator: Arc<dyn TokenValidator> = Arc::new(validator);
        let app = actix_test::init_service(
            App::new().app_data(web::Data::from(validator)).route(
                "/whoami",
                web::get().to(|auth: Authenticated| async move {
                    HttpResponse::Ok().body(auth.principal().owner())
                }),
            ),
        )
        .await;
        let mut req = actix_test::TestRequest::get().uri("/whoami");
        if let Some(value) = header {
            req = req.insert_header((AUTHORIZATION, value));
        }
        let res = actix_test::call_service(&app, req.to_request()).await;
        let status = res.status();
        let challenge = res
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        if status.is_success() {
            let body = actix_test::read_body(res).await;
            return (status, String::from_utf8(body.to_vec()).expect("utf8"));
        }
        (status, challenge)
    }

    #[actix_web::test]
    async fn accepted_tokens_reach_the_handler() {
        let mut validator = MockTokenValidator::new();
        validator
            .expect_validate()
            .withf(|token| token.as_str() == "good")
            .times(1)
            .return_once(|_| Ok(Principal::new(Subject::UserId(7))));

        assert_eq!(
            call(validator, Some("Bearer good")).await,
            (StatusCode::OK, "7".to_owned())
        );
    }

    #[actix_web::test]
    async fn missing_header_never_reaches_the_validator() {
        let mut validator = MockTokenValidator::new();
        validator.expect_validate().never();

        assert_eq!(
            call(validator, None).await,
            (StatusCode::UNAUTHORIZED, "Bearer".to_owned())
        );
    }

    #[actix_web::test]
    async fn rejected_tokens_are_challenged() {
        let mut validator = MockTokenValidator::new();
        validator
            .expect_validate()
            .times(1)
            .return_once(|_| Err(AuthError::invalid_credentials()));

        assert_eq!(
            call(validator, Some("Bearer bad")).await,
            (StatusCode::UNAUTHORIZED, "Bearer".to_owned())
        );
    }

    #[actix_web::test]
    async fn authority_outages_are_unavailable_without_challenge() {
        let mut validator = MockTokenValidator::new();
        validator
            .expect_validate()
            .times(1)
            .return_once(|_| Err(AuthError::authority_unavailable("connection refused")));

        assert_eq!(
            call(validator, Some("Bearer any")).await,
            (StatusCode::SERVICE_UNAVAILABLE, String::new())
        );
    }
}
