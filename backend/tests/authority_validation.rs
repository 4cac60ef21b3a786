//! `HttpTokenValidator` against real sockets.
//!
//! The happy path runs against a live users service on an ephemeral port.
//! Failure modes run against small stub authorities so each outcome can be
//! forced deterministically.

use std::net::TcpListener;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use actix_web::dev::ServerHandle;
use actix_web::http::StatusCode;
use actix_web::http::header::{AUTHORIZATION, LOCATION};
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use courier::domain::ports::{AuthError, TokenValidator};
use courier::domain::{BearerToken, Subject};
use courier::inbound::http::health::HealthState;
use courier::outbound::authority::{HttpTokenValidator, SubjectFallback, SubjectField};
use courier::server::{UsersServiceSettings, create_users_server};
use reqwest::Url;
use rstest::rstest;
use serde_json::{Value, json};

const TIMEOUT: Duration = Duration::from_millis(500);

fn loopback() -> (TcpListener, Url) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let addr = listener.local_addr().expect("local addr");
    let url = Url::parse(&format!("http://{addr}")).expect("url");
    (listener, url)
}

fn users_settings() -> UsersServiceSettings {
    UsersServiceSettings {
        bind_addr: None,
        database_url: None,
        redis_url: None,
        cache_ttl_seconds: None,
        token_secret: Some("integration-signing-secret".into()),
        token_ttl_seconds: None,
    }
}

async fn spawn_users_service() -> (ServerHandle, Url) {
    let (listener, url) = loopback();
    let server = create_users_server(
        web::Data::new(HealthState::new()),
        &users_settings(),
        listener,
    )
    .await
    .expect("users service");
    let handle = server.handle();
    actix_web::rt::spawn(server);
    (handle, url)
}

fn spawn_stub<F>(configure: F) -> (ServerHandle, Url)
where
    F: Fn(&mut web::ServiceConfig) + Send + Clone + 'static,
{
    let (listener, url) = loopback();
    let server = HttpServer::new(move || App::new().configure(configure.clone()))
        .workers(1)
        .listen(listener)
        .expect("listen")
        .run();
    let handle = server.handle();
    actix_web::rt::spawn(server);
    (handle, url)
}

/// Register `username` and return a fresh access token for it.
async fn register_and_login(client: &reqwest::Client, base: &Url, username: &str) -> String {
    let created = client
        .post(base.join("/users/create").expect("url"))
        .json(&json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "correct horse",
            "name": "Ada",
            "surname": "Lovelace",
        }))
        .send()
        .await
        .expect("create request");
    assert_eq!(created.status(), reqwest::StatusCode::CREATED);

    let issued: Value = client
        .post(base.join("/token").expect("url"))
        .json(&json!({ "username": username, "password": "correct horse" }))
        .send()
        .await
        .expect("token request")
        .json()
        .await
        .expect("token body");
    assert_eq!(issued["token_type"], "bearer");
    issued["access_token"]
        .as_str()
        .expect("access token")
        .to_owned()
}

fn validator(authority: &Url, field: SubjectField, fallback: SubjectFallback) -> HttpTokenValidator {
    HttpTokenValidator::new(authority, TIMEOUT, field, fallback).expect("validator")
}

fn token(raw: &str) -> BearerToken {
    BearerToken::new(raw).expect("token")
}

#[rstest]
#[case(SubjectField::Username)]
#[case(SubjectField::UserId)]
#[actix_web::test]
async fn live_authority_resolves_issued_tokens(#[case] field: SubjectField) {
    let (handle, base) = spawn_users_service().await;
    let client = reqwest::Client::new();
    let access_token = register_and_login(&client, &base, "ada").await;
    let validated: Value = client
        .post(base.join("/validate-token").expect("url"))
        .bearer_auth(&access_token)
        .send()
        .await
        .expect("validate request")
        .json()
        .await
        .expect("validate body");

    let principal = validator(&base, field, SubjectFallback::Strict)
        .validate(&token(&access_token))
        .await
        .expect("principal");

    let expected = match field {
        SubjectField::Username => Subject::Username("ada".into()),
        SubjectField::UserId => Subject::UserId(validated["user_id"].as_i64().expect("id")),
    };
    assert_eq!(principal.subject(), &expected);
    handle.stop(true).await;
}

#[actix_web::test]
async fn live_authority_rejects_forged_tokens() {
    let (handle, base) = spawn_users_service().await;

    let err = validator(&base, SubjectField::UserId, SubjectFallback::Strict)
        .validate(&token("forged.token.value"))
        .await
        .expect_err("forged token");

    assert_eq!(err, AuthError::InvalidCredentials);
    handle.stop(true).await;
}

#[actix_web::test]
async fn deleted_users_stop_validating_immediately() {
    let (handle, base) = spawn_users_service().await;
    let client = reqwest::Client::new();
    let access_token = register_and_login(&client, &base, "grace").await;
    let validator = validator(&base, SubjectField::UserId, SubjectFallback::Strict);
    let principal = validator
        .validate(&token(&access_token))
        .await
        .expect("valid before delete");
    let Subject::UserId(id) = principal.subject().clone() else {
        panic!("expected a numeric subject");
    };

    let deleted = client
        .delete(base.join(&format!("/users/delete?user_id={id}")).expect("url"))
        .bearer_auth(&access_token)
        .send()
        .await
        .expect("delete request");
    assert_eq!(deleted.status(), reqwest::StatusCode::OK);

    let err = validator
        .validate(&token(&access_token))
        .await
        .expect_err("deleted user");
    assert_eq!(err, AuthError::InvalidCredentials);
    handle.stop(true).await;
}

async fn echo_authorization(req: HttpRequest, calls: web::Data<AtomicUsize>) -> HttpResponse {
    calls.fetch_add(1, Ordering::SeqCst);
    let presented = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    HttpResponse::Ok().json(json!({ "username": presented, "user_id": 42 }))
}

#[actix_web::test]
async fn each_validation_is_one_bearer_post() {
    let calls = web::Data::new(AtomicUsize::new(0));
    let stub_calls = calls.clone();
    let (handle, base) = spawn_stub(move |cfg| {
        cfg.app_data(stub_calls.clone())
            .route("/validate-token", web::post().to(echo_authorization));
    });

    let principal = validator(&base, SubjectField::Username, SubjectFallback::Strict)
        .validate(&token("abc123"))
        .await
        .expect("principal");

    assert_eq!(principal.subject(), &Subject::Username("Bearer abc123".into()));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    handle.stop(true).await;
}

#[rstest]
#[case(StatusCode::UNAUTHORIZED)]
#[case(StatusCode::FORBIDDEN)]
#[case(StatusCode::INTERNAL_SERVER_ERROR)]
#[case(StatusCode::FOUND)]
#[case(StatusCode::TEMPORARY_REDIRECT)]
#[actix_web::test]
async fn rejecting_statuses_are_invalid_credentials(#[case] status: StatusCode) {
    let calls = Arc::new(AtomicUsize::new(0));
    let stub_calls = calls.clone();
    let (handle, base) = spawn_stub(move |cfg| {
        let calls = stub_calls.clone();
        cfg.route(
            "/validate-token",
            web::post().to(move || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    HttpResponse::build(status).finish()
                }
            }),
        );
    });

    let err = validator(&base, SubjectField::UserId, SubjectFallback::Strict)
        .validate(&token("abc123"))
        .await
        .expect_err("rejected");

    assert_eq!(err, AuthError::InvalidCredentials);
    assert_eq!(calls.load(Ordering::SeqCst), 1, "no retry after {status}");
    handle.stop(true).await;
}

#[rstest]
#[case(StatusCode::FOUND)]
#[case(StatusCode::TEMPORARY_REDIRECT)]
#[actix_web::test]
async fn redirects_are_rejected_without_being_followed(#[case] status: StatusCode) {
    let calls = Arc::new(AtomicUsize::new(0));
    let stub_calls = calls.clone();
    let (handle, base) = spawn_stub(move |cfg| {
        let redirected = stub_calls.clone();
        let followed = stub_calls.clone();
        cfg.route(
            "/validate-token",
            web::post().to(move || {
                let calls = redirected.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    HttpResponse::build(status)
                        .insert_header((LOCATION, "/elsewhere"))
                        .finish()
                }
            }),
        )
        .route(
            "/elsewhere",
            web::to(move || {
                let calls = followed.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    HttpResponse::Ok().json(json!({ "user_id": 9 }))
                }
            }),
        );
    });

    let outcome = validator(&base, SubjectField::UserId, SubjectFallback::Strict)
        .validate(&token("abc123"))
        .await;

    assert_eq!(outcome.map(|p| p.subject().clone()), Err(AuthError::InvalidCredentials));
    assert_eq!(calls.load(Ordering::SeqCst), 1, "redirect after {status} was followed");
    handle.stop(true).await;
}

#[actix_web::test]
async fn unreachable_authority_is_unavailable() {
    let (listener, base) = loopback();
    drop(listener);

    let err = validator(&base, SubjectField::UserId, SubjectFallback::Strict)
        .validate(&token("abc123"))
        .await
        .expect_err("unreachable");

    assert!(matches!(err, AuthError::AuthorityUnavailable { .. }), "{err:?}");
}

#[actix_web::test]
async fn slow_authority_times_out_as_unavailable() {
    let (handle, base) = spawn_stub(|cfg| {
        cfg.route(
            "/validate-token",
            web::post().to(|| async {
                actix_web::rt::time::sleep(Duration::from_secs(3)).await;
                HttpResponse::Ok().json(json!({ "user_id": 1 }))
            }),
        );
    });
    let started = Instant::now();

    let err = validator(&base, SubjectField::UserId, SubjectFallback::Strict)
        .validate(&token("abc123"))
        .await
        .expect_err("timeout");

    assert!(matches!(err, AuthError::AuthorityUnavailable { .. }), "{err:?}");
    assert!(started.elapsed() < Duration::from_secs(2));
    handle.stop(false).await;
}

#[rstest]
#[case(SubjectFallback::Strict, None)]
#[case(SubjectFallback::EchoToken, Some(Subject::Username("abc123".into())))]
#[actix_web::test]
async fn malformed_bodies_follow_the_fallback_policy(
    #[case] fallback: SubjectFallback,
    #[case] expected: Option<Subject>,
) {
    let (handle, base) = spawn_stub(|cfg| {
        cfg.route(
            "/validate-token",
            web::post().to(|| async { HttpResponse::Ok().body("definitely not json") }),
        );
    });

    let outcome = validator(&base, SubjectField::UserId, fallback)
        .validate(&token("abc123"))
        .await;

    match expected {
        Some(subject) => assert_eq!(outcome.expect("echo").subject(), &subject),
        None => assert!(matches!(
            outcome,
            Err(AuthError::AuthorityUnavailable { .. })
        )),
    }
    handle.stop(true).await;
}
