//! Driving port for delivery use-cases.
use async_trait::async_trait;

use crate::domain::{
    Delivery, DeliveryDraft, DeliveryFilter, DeliveryId, DeliveryPatch, DeliveryStatus, Error,
    PageRequest, Principal,
};

/// Delivery CRUD on behalf of an authenticated principal.
#[async_trait]
pub trait DeliveryService: Send + Sync {
    /// Record a new pending delivery owned by `principal`.
    async fn create(&self, principal: &Principal, draft: DeliveryDraft) -> Result<Delivery, Error>;

    /// Page through deliveries matching `filter`.
    async fn list(&self, filter: DeliveryFilter, page: PageRequest) -> Result<Vec<Delivery>, Error>;

    /// Fetch one delivery; unknown ids yield `NotFound`.
    async fn get(&self, id: DeliveryId) -> Result<Delivery, Error>;

    /// Apply a partial edit of the descriptive fields.
    async fn update(&self, id: DeliveryId, patch: DeliveryPatch) -> Result<Delivery, Error>;

    /// Move a delivery to `status`.
    async fn update_status(&self, id: DeliveryId, status: DeliveryStatus)
    -> Result<Delivery, Error>;

    /// Remove a delivery and return its last snapshot.
    async fn delete(&self, id: DeliveryId) -> Result<Delivery, Error>;
}
