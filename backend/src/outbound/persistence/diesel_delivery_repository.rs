//! PostgreSQL-backed `DeliveryRepository` implementation using Diesel ORM.
//!
//! Partial updates read the row `FOR UPDATE`, apply the patch in the domain
//! and write the full row back inside one transaction.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{DeliveryPersistenceError, DeliveryRepository};
use crate::domain::{
    Delivery, DeliveryFilter, DeliveryId, DeliveryPatch, DeliveryStatus, PageRequest,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::DeliveryRow;
use super::pool::{DbPool, PoolError};
use super::schema::deliveries;

/// Diesel-backed implementation of the `DeliveryRepository` port.
#[derive(Clone)]
pub struct DieselDeliveryRepository {
    pool: DbPool,
}

impl DieselDeliveryRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> DeliveryPersistenceError {
    map_basic_pool_error(error, DeliveryPersistenceError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> DeliveryPersistenceError {
    map_basic_diesel_error(
        error,
        DeliveryPersistenceError::query,
        DeliveryPersistenceError::connection,
    )
}

fn delivery_to_row(delivery: &Delivery) -> DeliveryRow {
    DeliveryRow {
        id: *delivery.id.as_uuid(),
        description: delivery.description.clone(),
        address: delivery.address.clone(),
        contact_phone: delivery.contact_phone.clone(),
        delivery_time: delivery.delivery_time,
        status: delivery.status.as_str().to_owned(),
        created_at: delivery.created_at,
        updated_at: delivery.updated_at,
        owner: delivery.owner.clone(),
    }
}

fn row_to_delivery(row: DeliveryRow) -> Result<Delivery, DeliveryPersistenceError> {
    let status = DeliveryStatus::from_str(&row.status).map_err(|err| {
        DeliveryPersistenceError::query(format!("invalid delivery row {}: {err}", row.id))
    })?;
    Ok(Delivery {
        id: DeliveryId::from_uuid(row.id),
        description: row.description,
        address: row.address,
        contact_phone: row.contact_phone,
        delivery_time: row.delivery_time,
        status,
        created_at: row.created_at,
        updated_at: row.updated_at,
        owner: row.owner,
    })
}

#[async_trait]
impl DeliveryRepository for DieselDeliveryRepository {
    async fn insert(&self, delivery: &Delivery) -> Result<(), DeliveryPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(deliveries::table)
            .values(&delivery_to_row(delivery))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_id(
        &self,
        id: DeliveryId,
    ) -> Result<Option<Delivery>, DeliveryPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<DeliveryRow> = deliveries::table
            .filter(deliveries::id.eq(id.as_uuid()))
            .select(DeliveryRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_delivery).transpose()
    }

    async fn find_many(
        &self,
        filter: DeliveryFilter,
        page: PageRequest,
    ) -> Result<Vec<Delivery>, DeliveryPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = deliveries::table
            .select(DeliveryRow::as_select())
            .order((deliveries::created_at.asc(), deliveries::id.asc()))
            .limit(i64::from(page.limit()))
            .offset(i64::from(page.offset()))
            .into_boxed();
        if let Some(status) = filter.status {
            query = query.filter(deliveries::status.eq(status.as_str()));
        }
        let rows: Vec<DeliveryRow> = query.load(&mut conn).await.map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_delivery).collect()
    }

    async fn update(
        &self,
        id: DeliveryId,
        patch: &DeliveryPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Delivery>, DeliveryPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<DeliveryRow> = conn
            .transaction(|conn| {
                async move {
                    let current: Option<DeliveryRow> = deliveries::table
                        .filter(deliveries::id.eq(id.as_uuid()))
                        .select(DeliveryRow::as_select())
                        .for_update()
                        .first(conn)
                        .await
                        .optional()?;
                    let Some(current) = current else {
                        return Ok(None);
                    };
                    let Ok(mut delivery) = row_to_delivery(current) else {
                        return Err(diesel::result::Error::RollbackTransaction);
                    };
                    delivery.apply(patch, now);
                    diesel::update(deliveries::table.filter(deliveries::id.eq(id.as_uuid())))
                        .set(&delivery_to_row(&delivery))
                        .returning(DeliveryRow::as_returning())
                        .get_result(conn)
                        .await
                        .optional()
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        row.map(row_to_delivery).transpose()
    }

    async fn delete(&self, id: DeliveryId) -> Result<Option<Delivery>, DeliveryPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<DeliveryRow> =
            diesel::delete(deliveries::table.filter(deliveries::id.eq(id.as_uuid())))
                .returning(DeliveryRow::as_returning())
                .get_result(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?;
        row.map(row_to_delivery).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DeliveryDraft;
    use crate::test_support::fixture_instant;
    use rstest::rstest;

    fn delivery() -> Delivery {
        let draft = DeliveryDraft::try_new(
            "Parcel".into(),
            "1 Main Street".into(),
            "555-0100".into(),
            Some(fixture_instant()),
        )
        .expect("draft");
        Delivery::from_draft(DeliveryId::random(), draft, "7".into(), fixture_instant())
    }

    #[rstest]
    fn rows_round_trip_status_labels() {
        let mut original = delivery();
        original.status = DeliveryStatus::InProgress;

        let row = delivery_to_row(&original);
        assert_eq!(row.status, "in_progress");
        assert_eq!(row_to_delivery(row).expect("valid row"), original);
    }

    #[rstest]
    fn unknown_status_is_a_query_error() {
        let mut row = delivery_to_row(&delivery());
        row.status = "lost".into();

        let err = row_to_delivery(row).expect_err("corrupt row");
        assert!(matches!(err, DeliveryPersistenceError::Query { .. }));
    }

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let err = map_pool_error(PoolError::build("bad url"));
        assert!(matches!(err, DeliveryPersistenceError::Connection { .. }));
    }
}
