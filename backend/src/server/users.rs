//! Users service wiring: store, token authority and HTTP routes.

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use mockable::DefaultClock;
use tracing::{info, warn};

use super::{StartupError, UsersServiceSettings, connect_database};
use crate::Trace;
use crate::domain::ports::{
    CacheStore, LoginService, PasswordHasher, TokenIssuer, TokenValidator, UserRepository,
};
use crate::domain::{CacheCoherentUserStore, LocalTokenValidator, TokenAuthority};
use crate::inbound::http::auth::{issue_token, validate_token};
use crate::inbound::http::health::{HealthState, live, ready, users_root};
use crate::inbound::http::state::UsersState;
use crate::inbound::http::users::users_scope;
use crate::inbound::http::validation::{json_config, query_config};
use crate::outbound::cache::{MemoryCacheStore, RedisCacheStore};
use crate::outbound::memory::MemoryUserRepository;
use crate::outbound::persistence::DieselUserRepository;
use crate::outbound::security::{Argon2PasswordHasher, JwtTokenIssuer};

const REDIS_CHECKOUT_TIMEOUT: Duration = Duration::from_secs(2);

async fn build_repository(
    settings: &UsersServiceSettings,
) -> Result<Arc<dyn UserRepository>, StartupError> {
    match settings.database_url() {
        Some(url) => {
            let pool = connect_database(url).await?;
            Ok(Arc::new(DieselUserRepository::new(pool)))
        }
        None => {
            warn!("no database configured; users are kept in memory");
            Ok(Arc::new(MemoryUserRepository::default()))
        }
    }
}

async fn build_cache(settings: &UsersServiceSettings) -> Result<Arc<dyn CacheStore>, StartupError> {
    match settings.redis_url() {
        Some(url) => {
            let cache = RedisCacheStore::connect(url, REDIS_CHECKOUT_TIMEOUT).await?;
            info!("connected to Redis");
            Ok(Arc::new(cache))
        }
        None => {
            warn!("no Redis configured; using in-process cache");
            Ok(Arc::new(MemoryCacheStore::default()))
        }
    }
}

#[derive(Clone)]
struct UsersDependencies {
    health_state: web::Data<HealthState>,
    state: web::Data<UsersState>,
    validator: web::Data<dyn TokenValidator>,
}

async fn build_dependencies(
    health_state: web::Data<HealthState>,
    settings: &UsersServiceSettings,
) -> Result<UsersDependencies, StartupError> {
    let repository = build_repository(settings).await?;
    let cache = build_cache(settings).await?;
    let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2PasswordHasher);
    let secret = settings.token_secret()?;
    let issuer: Arc<dyn TokenIssuer> = Arc::new(JwtTokenIssuer::new(
        secret.as_bytes(),
        settings.token_ttl(),
        Arc::new(DefaultClock),
    )?);

    let store = CacheCoherentUserStore::new(repository.clone(), cache, hasher.clone())
        .with_ttl(settings.cache_ttl());
    let login: Arc<dyn LoginService> = Arc::new(TokenAuthority::new(repository, hasher, issuer));
    let validator: Arc<dyn TokenValidator> = Arc::new(LocalTokenValidator::new(login.clone()));

    Ok(UsersDependencies {
        health_state,
        state: web::Data::new(UsersState::new(login, Arc::new(store))),
        validator: web::Data::from(validator),
    })
}

fn build_app(
    deps: UsersDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let UsersDependencies {
        health_state,
        state,
        validator,
    } = deps;

    App::new()
        .app_data(health_state)
        .app_data(state)
        .app_data(validator)
        .app_data(json_config())
        .app_data(query_config())
        .wrap(Trace)
        .service(users_root)
        .service(issue_token)
        .service(validate_token)
        .service(users_scope())
        .service(ready)
        .service(live)
}

/// Build the users service and serve it on `listener`.
///
/// # Errors
///
/// Returns a [`StartupError`] when settings are invalid, a configured store
/// cannot be reached, or the listener cannot be adopted.
pub async fn create_users_server(
    health_state: web::Data<HealthState>,
    settings: &UsersServiceSettings,
    listener: TcpListener,
) -> Result<Server, StartupError> {
    let deps = build_dependencies(health_state.clone(), settings).await?;
    let addr = listener.local_addr()?;

    let server = HttpServer::new(move || build_app(deps.clone()))
        .listen(listener)?
        .run();

    health_state.mark_ready();
    info!(%addr, "users service listening");
    Ok(server)
}
