//! Shared HTTP adapter state.
//!
//! HTTP handlers accept these bundles via `actix_web::web::Data` so they only
//! depend on domain ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{DeliveryService, LoginService, UserDirectory};

/// Ports used by the users service handlers.
#[derive(Clone)]
pub struct UsersState {
    /// Token issue and resolution.
    pub login: Arc<dyn LoginService>,
    /// User CRUD.
    pub users: Arc<dyn UserDirectory>,
}

impl UsersState {
    /// Bundle the users service ports.
    pub fn new(login: Arc<dyn LoginService>, users: Arc<dyn UserDirectory>) -> Self {
        Self { login, users }
    }
}

/// Ports used by the delivery service handlers.
///
/// Authentication is handled separately by the `Authenticated` extractor.
#[derive(Clone)]
pub struct DeliveryState {
    /// Delivery CRUD.
    pub deliveries: Arc<dyn DeliveryService>,
}

impl DeliveryState {
    /// Bundle the delivery service ports.
    pub fn new(deliveries: Arc<dyn DeliveryService>) -> Self {
        Self { deliveries }
    }
}
