//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered accounts.
    ///
    /// Rows are never physically deleted; `is_deleted` hides them from every
    /// lookup and from the partial unique indexes on `username` and `email`.
    accounts (id) {
        /// Primary key from a monotonic sequence.
        id -> Int8,
        username -> Varchar,
        email -> Varchar,
        /// Argon2id PHC string.
        password_hash -> Varchar,
        display_name -> Varchar,
        avatar_url -> Nullable<Varchar>,
        bio -> Nullable<Text>,
        github_url -> Nullable<Varchar>,
        twitter_url -> Nullable<Varchar>,
        website_url -> Nullable<Varchar>,
        note_count -> Int4,
        view_count -> Int4,
        like_count -> Int4,
        is_active -> Bool,
        is_deleted -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}
