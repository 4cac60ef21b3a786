//! Port abstraction for durable delivery storage.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Delivery, DeliveryFilter, DeliveryId, DeliveryPatch, PageRequest};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by delivery repository adapters.
    pub enum DeliveryPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "delivery repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "delivery repository query failed: {message}",
    }
}

/// Durable delivery store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeliveryRepository: Send + Sync {
    /// Persist a new delivery.
    async fn insert(&self, delivery: &Delivery) -> Result<(), DeliveryPersistenceError>;

    /// Fetch a delivery by identifier.
    async fn find_by_id(&self, id: DeliveryId)
    -> Result<Option<Delivery>, DeliveryPersistenceError>;

    /// Fetch deliveries matching `filter`, oldest first, within `page`.
    async fn find_many(
        &self,
        filter: DeliveryFilter,
        page: PageRequest,
    ) -> Result<Vec<Delivery>, DeliveryPersistenceError>;

    /// Apply `patch` atomically and stamp `updated_at = now`.
    async fn update(
        &self,
        id: DeliveryId,
        patch: &DeliveryPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Delivery>, DeliveryPersistenceError>;

    /// Remove a delivery, returning the pre-delete snapshot.
    async fn delete(&self, id: DeliveryId) -> Result<Option<Delivery>, DeliveryPersistenceError>;
}
