//! Domain primitives, services and ports.
//!
//! Purpose: define strongly typed entities shared by the users and delivery
//! services, the use-case services that operate on them, and the port traits
//! through which those services reach infrastructure.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - User, NewUser, UserChanges, UserFilter, UserPage: user records.
//! - Delivery, DeliveryDraft, DeliveryPatch, DeliveryStatus: delivery records.
//! - Principal, BearerToken, LoginCredentials: authentication values.
//! - CacheCoherentUserStore: read-through, write-invalidate user store.
//! - TokenAuthority, LocalTokenValidator: token issuance and resolution.
//! - DeliveryServiceImpl: delivery use-cases.

pub mod auth;
pub mod authority;
pub mod delivery;
pub mod delivery_service;
pub mod error;
pub mod page;
pub mod ports;
pub mod trace_id;
pub mod user;
pub mod user_store;

pub use self::auth::{
    BearerToken, EmptyBearerToken, IssuedToken, LoginCredentials, LoginValidationError, Principal,
    Subject,
};
pub use self::authority::{LocalTokenValidator, TokenAuthority};
pub use self::delivery::{
    Delivery, DeliveryDraft, DeliveryFilter, DeliveryId, DeliveryPatch, DeliveryPatchInput,
    DeliveryStatus, DeliveryValidationError, UnknownDeliveryStatus,
};
pub use self::delivery_service::DeliveryServiceImpl;
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::page::{MAX_PAGE_LIMIT, PageRequest, PageValidationError};
pub use self::trace_id::TraceId;
pub use self::user::{
    Email, NewUser, NewUserInput, USERNAME_MAX, User, UserChanges, UserFilter, UserId, UserPage,
    UserParts, UserValidationError, Username,
};
pub use self::user_store::{CacheCoherentUserStore, DEFAULT_CACHE_TTL};
