//! Diesel table definitions for the PostgreSQL schema.
//!
//! Must match `migrations/` exactly. Regenerate with `diesel print-schema`
//! after changing a migration.

diesel::table! {
    /// Registered user accounts.
    users (id) {
        /// Storage-assigned identifier.
        id -> Int8,
        /// Phone number, unique across all rows.
        phone -> Varchar,
        /// Display name.
        name -> Varchar,
        /// Argon2id PHC string. Never the plaintext.
        password_hash -> Text,
        created_at -> Timestamptz,
        /// Refreshed on every profile update; null until the first one.
        updated_at -> Nullable<Timestamptz>,
        login_count -> Int8,
    }
}
