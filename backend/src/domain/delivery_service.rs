//! Delivery use-cases on behalf of authenticated principals.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{error, info};

use super::ports::{DeliveryPersistenceError, DeliveryRepository, DeliveryService};
use super::{
    Delivery, DeliveryDraft, DeliveryFilter, DeliveryId, DeliveryPatch, DeliveryStatus, Error,
    PageRequest, Principal,
};

const DELIVERY_NOT_FOUND: &str = "Delivery not found";

/// Delivery service implementing the driving port.
#[derive(Clone)]
pub struct DeliveryServiceImpl {
    repository: Arc<dyn DeliveryRepository>,
    clock: Arc<dyn Clock>,
}

impl DeliveryServiceImpl {
    /// Create a service stamping times from `clock`.
    pub fn new(repository: Arc<dyn DeliveryRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    fn map_persistence_error(error: DeliveryPersistenceError) -> Error {
        match error {
            DeliveryPersistenceError::Connection { message } => {
                error!(%message, "delivery repository unavailable");
                Error::service_unavailable("Delivery store unavailable")
            }
            DeliveryPersistenceError::Query { message } => {
                error!(%message, "delivery repository query failed");
                Error::internal("Delivery store query failed")
            }
        }
    }

    async fn apply_patch(&self, id: DeliveryId, patch: &DeliveryPatch) -> Result<Delivery, Error> {
        self.repository
            .update(id, patch, self.clock.utc())
            .await
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| Error::not_found(DELIVERY_NOT_FOUND))
    }
}

#[async_trait]
impl DeliveryService for DeliveryServiceImpl {
    async fn create(&self, principal: &Principal, draft: DeliveryDraft) -> Result<Delivery, Error> {
        let delivery = Delivery::from_draft(
            DeliveryId::random(),
            draft,
            principal.owner(),
            self.clock.utc(),
        );
        self.repository
            .insert(&delivery)
            .await
            .map_err(Self::map_persistence_error)?;
        info!(delivery_id = %delivery.id, owner = %delivery.owner, "delivery created");
        Ok(delivery)
    }

    async fn list(&self, filter: DeliveryFilter, page: PageRequest) -> Result<Vec<Delivery>, Error> {
        self.repository
            .find_many(filter, page)
            .await
            .map_err(Self::map_persistence_error)
    }

    async fn get(&self, id: DeliveryId) -> Result<Delivery, Error> {
        self.repository
            .find_by_id(id)
            .await
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| Error::not_found(DELIVERY_NOT_FOUND))
    }

    async fn update(&self, id: DeliveryId, patch: DeliveryPatch) -> Result<Delivery, Error> {
        self.apply_patch(id, &patch).await
    }

    async fn update_status(
        &self,
        id: DeliveryId,
        status: DeliveryStatus,
    ) -> Result<Delivery, Error> {
        let updated = self
            .apply_patch(id, &DeliveryPatch::status_only(status))
            .await?;
        info!(delivery_id = %id, status = %status, "delivery status changed");
        Ok(updated)
    }

    async fn delete(&self, id: DeliveryId) -> Result<Delivery, Error> {
        self.repository
            .delete(id)
            .await
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| Error::not_found(DELIVERY_NOT_FOUND))
    }
}
