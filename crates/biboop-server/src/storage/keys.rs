//! Canonical store keys.
//!
//! A user's key is a UUIDv5 of its email; a server's key is a UUIDv5 of its
//! caller-supplied identifier inside the owner's key namespace. The same
//! natural key therefore always maps to the same row.

use uuid::Uuid;

/// Namespace for user keys.
const USER_NAMESPACE: Uuid = Uuid::from_u128(0x6b69_6f62_6f6f_7055_7365_7273_0000_0001);

/// Derive the store key for the user owning `email`.
pub fn user_key(email: &str) -> String {
    Uuid::new_v5(&USER_NAMESPACE, email.as_bytes()).to_string()
}

/// Derive the store key for server `server_id` owned by `owner_id`.
///
/// An `owner_id` that is not a UUID is hashed into the user namespace first
/// so the result stays deterministic.
pub fn server_key(owner_id: &str, server_id: &str) -> String {
    let namespace = Uuid::parse_str(owner_id)
        .unwrap_or_else(|_| Uuid::new_v5(&USER_NAMESPACE, owner_id.as_bytes()));
    Uuid::new_v5(&namespace, server_id.as_bytes()).to_string()
}
