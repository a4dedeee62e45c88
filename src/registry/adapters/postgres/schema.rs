//! Diesel schema for catalog persistence.

diesel::table! {
    /// Catalog server records.
    servers (row_id) {
        /// Store-assigned row identifier. Never leaves the adapter.
        row_id -> Int8,
        /// Namespace-prefixed server identifier.
        #[max_length = 255]
        server_id -> Varchar,
        /// Record fields other than the identifier and timestamps.
        document -> Jsonb,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only audit trail.
    audit_entries (id) {
        /// Entry identifier.
        id -> Uuid,
        /// Mutation kind (`publish`, `update`, `delete`).
        #[max_length = 16]
        action -> Varchar,
        /// Acting principal.
        #[max_length = 255]
        user_id -> Varchar,
        /// Affected server identifier.
        #[max_length = 255]
        server_id -> Nullable<Varchar>,
        /// Free-form details.
        details -> Jsonb,
        /// Entry timestamp.
        recorded_at -> Timestamptz,
    }
}
