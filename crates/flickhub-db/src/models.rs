//! Database-only row types. Rows that are returned to clients live in
//! `flickhub_types::models`.

/// Stored password hash and id for a username, used by sign-in.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub id_users: i64,
    pub pw: String,
}
