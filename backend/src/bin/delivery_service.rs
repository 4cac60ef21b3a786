//! Delivery service entry-point: delivery CRUD behind remote token checks.

use std::net::TcpListener;

use actix_web::web;
use courier::inbound::http::health::HealthState;
use courier::server::{DeliveryServiceSettings, create_delivery_server, init_tracing};
use ortho_config::OrthoConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_tracing();

    let settings = DeliveryServiceSettings::load()
        .map_err(|e| std::io::Error::other(format!("failed to load settings: {e}")))?;
    let bind_addr = settings.bind_addr().map_err(std::io::Error::other)?;
    let listener = TcpListener::bind(bind_addr)?;

    let health_state = web::Data::new(HealthState::new());
    let server = create_delivery_server(health_state, &settings, listener).await?;
    server.await
}
