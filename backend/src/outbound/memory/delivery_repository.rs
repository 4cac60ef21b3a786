//! In-memory `DeliveryRepository`.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{DeliveryPersistenceError, DeliveryRepository};
use crate::domain::{Delivery, DeliveryFilter, DeliveryId, DeliveryPatch, PageRequest};

/// Mutex-guarded delivery table; listings are ordered oldest first.
#[derive(Debug, Default)]
pub struct MemoryDeliveryRepository {
    rows: Mutex<HashMap<DeliveryId, Delivery>>,
}

impl MemoryDeliveryRepository {
    fn lock(
        &self,
    ) -> Result<MutexGuard<'_, HashMap<DeliveryId, Delivery>>, DeliveryPersistenceError> {
        self.rows
            .lock()
            .map_err(|_| DeliveryPersistenceError::connection("delivery table lock poisoned"))
    }
}

#[async_trait]
impl DeliveryRepository for MemoryDeliveryRepository {
    async fn insert(&self, delivery: &Delivery) -> Result<(), DeliveryPersistenceError> {
        let mut rows = self.lock()?;
        if rows.contains_key(&delivery.id) {
            return Err(DeliveryPersistenceError::query(format!(
                "delivery {} already exists",
                delivery.id
            )));
        }
        rows.insert(delivery.id, delivery.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: DeliveryId,
    ) -> Result<Option<Delivery>, DeliveryPersistenceError> {
        Ok(self.lock()?.get(&id).cloned())
    }

    async fn find_many(
        &self,
        filter: DeliveryFilter,
        page: PageRequest,
    ) -> Result<Vec<Delivery>, DeliveryPersistenceError> {
        let rows = self.lock()?;
        let mut matching: Vec<&Delivery> = rows.values().filter(|d| filter.matches(d)).collect();
        matching.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.as_uuid().cmp(b.id.as_uuid()))
        });
        Ok(matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .cloned()
            .collect())
    }

    async fn update(
        &self,
        id: DeliveryId,
        patch: &DeliveryPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Delivery>, DeliveryPersistenceError> {
        let mut rows = self.lock()?;
        Ok(rows.get_mut(&id).map(|delivery| {
            delivery.apply(patch, now);
            delivery.clone()
        }))
    }

    async fn delete(&self, id: DeliveryId) -> Result<Option<Delivery>, DeliveryPersistenceError> {
        Ok(self.lock()?.remove(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DeliveryDraft, DeliveryStatus};
    use crate::test_support::fixture_instant;
    use chrono::TimeDelta;
    use rstest::rstest;

    fn delivery(minutes_after: i64) -> Delivery {
        let draft = DeliveryDraft::try_new(
            format!("parcel {minutes_after}"),
            "1 Main Street".into(),
            "555-0100".into(),
            None,
        )
        .expect("draft");
        Delivery::from_draft(
            DeliveryId::random(),
            draft,
            "ada".into(),
            fixture_instant() + TimeDelta::minutes(minutes_after),
        )
    }

    #[rstest]
    #[tokio::test]
    async fn listing_is_oldest_first_and_filtered() {
        let repository = MemoryDeliveryRepository::default();
        let late = delivery(10);
        let early = delivery(1);
        let mut done = delivery(5);
        done.status = DeliveryStatus::Delivered;
        for item in [&late, &early, &done] {
            repository.insert(item).await.expect("insert");
        }
        let page = PageRequest::new(100, 0).expect("page");

        let all = repository
            .find_many(DeliveryFilter::default(), page)
            .await
            .expect("list");
        let pending = repository
            .find_many(
                DeliveryFilter {
                    status: Some(DeliveryStatus::Pending),
                },
                page,
            )
            .await
            .expect("list");

        assert_eq!(all, vec![early.clone(), done, late.clone()]);
        assert_eq!(pending, vec![early, late]);
    }

    #[rstest]
    #[tokio::test]
    async fn update_and_delete_report_missing_rows() {
        let repository = MemoryDeliveryRepository::default();
        let id = DeliveryId::random();

        let updated = repository
            .update(
                id,
                &DeliveryPatch::status_only(DeliveryStatus::Canceled),
                fixture_instant(),
            )
            .await
            .expect("update");
        let deleted = repository.delete(id).await.expect("delete");

        assert!(updated.is_none());
        assert!(deleted.is_none());
    }
}
