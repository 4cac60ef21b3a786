//! Delivery records owned by the delivery service.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors raised while building delivery values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryValidationError {
    /// Description is blank.
    #[error("description must not be empty")]
    EmptyDescription,
    /// Address is blank.
    #[error("address must not be empty")]
    EmptyAddress,
    /// Contact phone is blank.
    #[error("contact phone must not be empty")]
    EmptyContactPhone,
    /// Partial update carried no fields.
    #[error("At least one field must be updated")]
    NoChanges,
}

impl DeliveryValidationError {
    /// Name of the offending field, when the failure is tied to one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::EmptyDescription => Some("description"),
            Self::EmptyAddress => Some("address"),
            Self::EmptyContactPhone => Some("contact_phone"),
            Self::NoChanges => None,
        }
    }
}

/// Store-assigned delivery identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryId(Uuid);

impl DeliveryId {
    /// Mint a fresh identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an id read back from storage.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Underlying UUID, as stored in the `deliveries.id` column.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for DeliveryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for DeliveryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Lifecycle state of a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Recorded, not yet picked up.
    #[default]
    Pending,
    /// Out for delivery.
    InProgress,
    /// Handed over to the recipient.
    Delivered,
    /// Abandoned before delivery.
    Canceled,
}

impl DeliveryStatus {
    /// Stable storage and wire label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Delivered => "delivered",
            Self::Canceled => "canceled",
        }
    }
}

/// Error returned when a status label is unknown.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown delivery status: {0}")]
pub struct UnknownDeliveryStatus(pub String);

impl FromStr for DeliveryStatus {
    type Err = UnknownDeliveryStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "delivered" => Ok(Self::Delivered),
            "canceled" => Ok(Self::Canceled),
            other => Err(UnknownDeliveryStatus(other.to_owned())),
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted delivery.
///
/// `owner` is the textual subject of the principal that created it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    /// Store-assigned id.
    pub id: DeliveryId,
    /// What is being delivered.
    pub description: String,
    /// Where it goes.
    pub address: String,
    /// Phone number of the recipient.
    pub contact_phone: String,
    /// Scheduled hand-over time, if agreed.
    pub delivery_time: Option<DateTime<Utc>>,
    /// Current lifecycle state.
    pub status: DeliveryStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Time of the last edit; `None` until the first one.
    pub updated_at: Option<DateTime<Utc>>,
    /// Subject of the principal that created the delivery.
    pub owner: String,
}

impl Delivery {
    /// Build a new pending delivery from a validated draft.
    pub fn from_draft(
        id: DeliveryId,
        draft: DeliveryDraft,
        owner: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            description: draft.description,
            address: draft.address,
            contact_phone: draft.contact_phone,
            delivery_time: draft.delivery_time,
            status: DeliveryStatus::Pending,
            created_at: now,
            updated_at: None,
            owner,
        }
    }

    /// Apply a patch and stamp `updated_at`.
    pub fn apply(&mut self, patch: &DeliveryPatch, now: DateTime<Utc>) {
        if let Some(description) = &patch.description {
            self.description.clone_from(description);
        }
        if let Some(address) = &patch.address {
            self.address.clone_from(address);
        }
        if let Some(phone) = &patch.contact_phone {
            self.contact_phone.clone_from(phone);
        }
        if let Some(time) = patch.delivery_time {
            self.delivery_time = Some(time);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        self.updated_at = Some(now);
    }
}

fn required(
    raw: String,
    error: DeliveryValidationError,
) -> Result<String, DeliveryValidationError> {
    if raw.trim().is_empty() {
        return Err(error);
    }
    Ok(raw)
}

/// Validated creation payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryDraft {
    description: String,
    address: String,
    contact_phone: String,
    delivery_time: Option<DateTime<Utc>>,
}

impl DeliveryDraft {
    /// Validate creation inputs.
    pub fn try_new(
        description: String,
        address: String,
        contact_phone: String,
        delivery_time: Option<DateTime<Utc>>,
    ) -> Result<Self, DeliveryValidationError> {
        Ok(Self {
            description: required(description, DeliveryValidationError::EmptyDescription)?,
            address: required(address, DeliveryValidationError::EmptyAddress)?,
            contact_phone: required(contact_phone, DeliveryValidationError::EmptyContactPhone)?,
            delivery_time,
        })
    }
}

/// Partial update; at least one field is always present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryPatch {
    description: Option<String>,
    address: Option<String>,
    contact_phone: Option<String>,
    delivery_time: Option<DateTime<Utc>>,
    status: Option<DeliveryStatus>,
}

/// Raw partial update fields.
#[derive(Debug, Clone, Default)]
pub struct DeliveryPatchInput {
    /// New description.
    pub description: Option<String>,
    /// New address.
    pub address: Option<String>,
    /// New contact phone.
    pub contact_phone: Option<String>,
    /// New scheduled time.
    pub delivery_time: Option<DateTime<Utc>>,
    /// New status.
    pub status: Option<DeliveryStatus>,
}

impl DeliveryPatch {
    /// Validate a partial update.
    ///
    /// # Examples
    /// ```
    /// use courier::domain::{DeliveryPatch, DeliveryPatchInput, DeliveryValidationError};
    ///
    /// let err = DeliveryPatch::try_new(DeliveryPatchInput::default()).unwrap_err();
    /// assert_eq!(err, DeliveryValidationError::NoChanges);
    /// ```
    pub fn try_new(input: DeliveryPatchInput) -> Result<Self, DeliveryValidationError> {
        let DeliveryPatchInput {
            description,
            address,
            contact_phone,
            delivery_time,
            status,
        } = input;
        if description.is_none()
            && address.is_none()
            && contact_phone.is_none()
            && delivery_time.is_none()
            && status.is_none()
        {
            return Err(DeliveryValidationError::NoChanges);
        }
        Ok(Self {
            description: description
                .map(|value| required(value, DeliveryValidationError::EmptyDescription))
                .transpose()?,
            address: address
                .map(|value| required(value, DeliveryValidationError::EmptyAddress))
                .transpose()?,
            contact_phone: contact_phone
                .map(|value| required(value, DeliveryValidationError::EmptyContactPhone))
                .transpose()?,
            delivery_time,
            status,
        })
    }

    /// Patch that only moves the delivery to `status`.
    pub fn status_only(status: DeliveryStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// Listing filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryFilter {
    /// Only deliveries in this state.
    pub status: Option<DeliveryStatus>,
}

impl DeliveryFilter {
    /// Whether `delivery` passes the filter.
    pub fn matches(&self, delivery: &Delivery) -> bool {
        self.status.is_none_or(|status| delivery.status == status)
    }
}
