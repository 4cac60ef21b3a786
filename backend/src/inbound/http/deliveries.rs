//! Delivery API handlers.
//!
//! ```text
//! POST   /deliveries/create {"description":"Parcel","address":"1 Main St","contact_phone":"555-0100"}
//! GET    /deliveries/list?skip=0&limit=100&status=pending
//! GET    /deliveries/details?delivery_id=<uuid>
//! PUT    /deliveries/update?delivery_id=<uuid> {"address":"2 Main St"}
//! PATCH  /deliveries/update_status?delivery_id=<uuid> {"status":"delivered"}
//! DELETE /deliveries/delete?delivery_id=<uuid>
//! ```
//!
//! Every route requires a bearer token accepted by the users service.

use std::str::FromStr;

use actix_web::{HttpResponse, delete, get, patch, post, put, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Delivery, DeliveryDraft, DeliveryFilter, DeliveryId, DeliveryPatch, DeliveryPatchInput,
    DeliveryStatus, Error, PageRequest,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::authenticated::Authenticated;
use crate::inbound::http::state::DeliveryState;
use crate::inbound::http::validation::{
    delivery_validation_error, non_blank, page_validation_error, unknown_status_error,
};

const DEFAULT_LIMIT: u32 = 100;

/// Body of `POST /deliveries/create`.
#[derive(Debug, Deserialize, Serialize)]
pub struct CreateDeliveryRequest {
    /// What is being delivered.
    pub description: String,
    /// Destination address.
    pub address: String,
    /// Recipient phone number.
    pub contact_phone: String,
    /// Agreed hand-over time, RFC 3339.
    #[serde(default)]
    pub delivery_time: Option<DateTime<Utc>>,
}

/// Body of `PUT /deliveries/update`; at least one field must be set.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateDeliveryRequest {
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// New address.
    #[serde(default)]
    pub address: Option<String>,
    /// New phone number.
    #[serde(default)]
    pub contact_phone: Option<String>,
    /// New hand-over time.
    #[serde(default)]
    pub delivery_time: Option<DateTime<Utc>>,
    /// New status.
    #[serde(default)]
    pub status: Option<DeliveryStatus>,
}

/// Body of `PATCH /deliveries/update_status`.
#[derive(Debug, Deserialize, Serialize)]
pub struct StatusUpdateRequest {
    /// Target status.
    pub status: DeliveryStatus,
}

/// `?delivery_id=` selector. Kept as text so a malformed id is a 404.
#[derive(Debug, Deserialize)]
pub struct DeliveryIdQuery {
    /// Hyphenated UUID of the delivery.
    pub delivery_id: String,
}

/// Paging and status filter for `GET /deliveries/list`.
#[derive(Debug, Deserialize)]
pub struct ListDeliveriesQuery {
    /// Rows to skip; defaults to 0.
    pub skip: Option<u32>,
    /// Page size; defaults to 100.
    pub limit: Option<u32>,
    /// Status label to match; blank means any.
    pub status: Option<String>,
}

impl ListDeliveriesQuery {
    fn into_parts(self) -> ApiResult<(DeliveryFilter, PageRequest)> {
        let status = non_blank(self.status)
            .map(|raw| DeliveryStatus::from_str(raw.trim()))
            .transpose()
            .map_err(unknown_status_error)?;
        let page = PageRequest::new(
            self.limit.unwrap_or(DEFAULT_LIMIT),
            self.skip.unwrap_or_default(),
        )
        .map_err(page_validation_error)?;
        Ok((DeliveryFilter { status }, page))
    }
}

/// Unparseable ids cannot name a delivery, so they are reported as missing.
fn delivery_id(query: &DeliveryIdQuery) -> ApiResult<DeliveryId> {
    DeliveryId::from_str(&query.delivery_id).map_err(|_| Error::not_found("Delivery not found"))
}

/// Record a pending delivery owned by the caller.
#[post("/create")]
pub async fn create_delivery(
    auth: Authenticated,
    state: web::Data<DeliveryState>,
    payload: web::Json<CreateDeliveryRequest>,
) -> ApiResult<HttpResponse> {
    let CreateDeliveryRequest {
        description,
        address,
        contact_phone,
        delivery_time,
    } = payload.into_inner();
    let draft = DeliveryDraft::try_new(description, address, contact_phone, delivery_time)
        .map_err(delivery_validation_error)?;
    let created = state.deliveries.create(auth.principal(), draft).await?;
    Ok(HttpResponse::Created().json(created))
}

/// Page through deliveries, oldest first.
#[get("/list")]
pub async fn list_deliveries(
    _auth: Authenticated,
    state: web::Data<DeliveryState>,
    query: web::Query<ListDeliveriesQuery>,
) -> ApiResult<web::Json<Vec<Delivery>>> {
    let (filter, page) = query.into_inner().into_parts()?;
    Ok(web::Json(state.deliveries.list(filter, page).await?))
}

/// Fetch one delivery.
#[get("/details")]
pub async fn get_delivery(
    _auth: Authenticated,
    state: web::Data<DeliveryState>,
    query: web::Query<DeliveryIdQuery>,
) -> ApiResult<web::Json<Delivery>> {
    let id = delivery_id(&query)?;
    Ok(web::Json(state.deliveries.get(id).await?))
}

/// Edit a delivery's fields.
#[put("/update")]
pub async fn update_delivery(
    _auth: Authenticated,
    state: web::Data<DeliveryState>,
    query: web::Query<DeliveryIdQuery>,
    payload: web::Json<UpdateDeliveryRequest>,
) -> ApiResult<web::Json<Delivery>> {
    let id = delivery_id(&query)?;
    let UpdateDeliveryRequest {
        description,
        address,
        contact_phone,
        delivery_time,
        status,
    } = payload.into_inner();
    let patch = DeliveryPatch::try_new(DeliveryPatchInput {
        description,
        address,
        contact_phone,
        delivery_time,
        status,
    })
    .map_err(delivery_validation_error)?;
    Ok(web::Json(state.deliveries.update(id, patch).await?))
}

/// Move a delivery to a new status.
#[patch("/update_status")]
pub async fn update_delivery_status(
    _auth: Authenticated,
    state: web::Data<DeliveryState>,
    query: web::Query<DeliveryIdQuery>,
    payload: web::Json<StatusUpdateRequest>,
) -> ApiResult<web::Json<Delivery>> {
    let id = delivery_id(&query)?;
    let status = payload.into_inner().status;
    Ok(web::Json(state.deliveries.update_status(id, status).await?))
}

/// Delete a delivery and return its last snapshot.
#[delete("/delete")]
pub async fn delete_delivery(
    _auth: Authenticated,
    state: web::Data<DeliveryState>,
    query: web::Query<DeliveryIdQuery>,
) -> ApiResult<web::Json<Delivery>> {
    let id = delivery_id(&query)?;
    Ok(web::Json(state.deliveries.delete(id).await?))
}

/// All `/deliveries` routes.
pub fn deliveries_scope() -> actix_web::Scope {
    web::scope("/deliveries")
        .service(create_delivery)
        .service(list_deliveries)
        .service(get_delivery)
        .service(update_delivery)
        .service(update_delivery_status)
        .service(delete_delivery)
}
