//! Delivery service wiring: repository, remote token validator and routes.

use std::net::TcpListener;
use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use mockable::DefaultClock;
use tracing::{info, warn};

use super::{DeliveryServiceSettings, StartupError, connect_database};
use crate::Trace;
use crate::domain::DeliveryServiceImpl;
use crate::domain::ports::{DeliveryRepository, TokenValidator};
use crate::inbound::http::deliveries::deliveries_scope;
use crate::inbound::http::health::{HealthState, delivery_root, live, ready};
use crate::inbound::http::state::DeliveryState;
use crate::inbound::http::validation::{json_config, query_config};
use crate::outbound::authority::HttpTokenValidator;
use crate::outbound::memory::MemoryDeliveryRepository;
use crate::outbound::persistence::DieselDeliveryRepository;

async fn build_repository(
    settings: &DeliveryServiceSettings,
) -> Result<Arc<dyn DeliveryRepository>, StartupError> {
    match settings.database_url() {
        Some(url) => {
            let pool = connect_database(url).await?;
            Ok(Arc::new(DieselDeliveryRepository::new(pool)))
        }
        None => {
            warn!("no database configured; deliveries are kept in memory");
            Ok(Arc::new(MemoryDeliveryRepository::default()))
        }
    }
}

fn build_validator(
    settings: &DeliveryServiceSettings,
) -> Result<Arc<dyn TokenValidator>, StartupError> {
    let validator = HttpTokenValidator::new(
        &settings.authority_url()?,
        settings.authority_timeout(),
        settings.subject_field()?,
        settings.subject_fallback()?,
    )?;
    info!(
        endpoint = %validator.endpoint(),
        timeout_ms = settings.authority_timeout().as_millis(),
        "token authority configured"
    );
    Ok(Arc::new(validator))
}

#[derive(Clone)]
struct DeliveryDependencies {
    health_state: web::Data<HealthState>,
    state: web::Data<DeliveryState>,
    validator: web::Data<dyn TokenValidator>,
}

fn build_app(
    deps: DeliveryDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let DeliveryDependencies {
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
        .service(delivery_root)
        .service(deliveries_scope())
        .service(ready)
        .service(live)
}

/// Build the delivery service and serve it on `listener`.
///
/// # Errors
///
/// Returns a [`StartupError`] when settings are invalid, the database cannot
/// be prepared, or the listener cannot be adopted.
pub async fn create_delivery_server(
    health_state: web::Data<HealthState>,
    settings: &DeliveryServiceSettings,
    listener: TcpListener,
) -> Result<Server, StartupError> {
    let validator = build_validator(settings)?;
    let repository = build_repository(settings).await?;
    let deliveries = Arc::new(DeliveryServiceImpl::new(repository, Arc::new(DefaultClock)));
    let deps = DeliveryDependencies {
        health_state: health_state.clone(),
        state: web::Data::new(DeliveryState::new(deliveries)),
        validator: web::Data::from(validator),
    };
    let addr = listener.local_addr()?;

    let server = HttpServer::new(move || build_app(deps.clone()))
        .listen(listener)?
        .run();

    health_state.mark_ready();
    info!(%addr, "delivery service listening");
    Ok(server)
}
