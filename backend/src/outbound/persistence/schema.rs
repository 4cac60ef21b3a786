//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly.

diesel::table! {
    /// Registered accounts. `username` and `email` carry unique constraints
    /// named `users_username_key` and `users_email_key`.
    users (id) {
        id -> Int8,
        username -> Varchar,
        email -> Varchar,
        password_hash -> Text,
        name -> Varchar,
        surname -> Varchar,
        age -> Nullable<Int4>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Delivery orders keyed by UUID.
    deliveries (id) {
        id -> Uuid,
        description -> Text,
        address -> Text,
        contact_phone -> Varchar,
        delivery_time -> Nullable<Timestamptz>,
        status -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Nullable<Timestamptz>,
        owner -> Varchar,
    }
}
