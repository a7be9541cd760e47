//! Namespace-hashed identifier derivation.
//!
//! ```text
//! UUIDv5(IDENTITY_NAMESPACE, utf8(object_type) ++ utf8(canonical_form))
//!   → "<object_type>--<uuid>"
//! ```
//!
//! The namespace is fixed for every deployment; changing it would change
//! every derived identifier.

use uuid::Uuid;

use crate::identity::types::{CanonicalForm, Identifier};

/// Namespace shared by all derived identifiers
/// (`6ba7b810-9dad-11d1-80b4-00c04fd430c8`).
pub const IDENTITY_NAMESPACE: Uuid = Uuid::NAMESPACE_DNS;

/// Bytes fed to the v5 hash: the object type immediately followed by the
/// canonical form.
pub fn hash_name(object_type: &str, canonical: &CanonicalForm) -> Vec<u8> {
    let mut name = Vec::with_capacity(object_type.len() + canonical.as_str().len());
    name.extend_from_slice(object_type.as_bytes());
    name.extend_from_slice(canonical.as_bytes());
    name
}

/// Reproducible UUID for a canonical form.
pub fn derive_uuid(object_type: &str, canonical: &CanonicalForm) -> Uuid {
    Uuid::new_v5(&IDENTITY_NAMESPACE, &hash_name(object_type, canonical))
}

/// Reproducible identifier for a canonical form. The object type is used
/// as-is for the prefix.
pub fn derive_identifier(object_type: &str, canonical: &CanonicalForm) -> Identifier {
    Identifier::new(object_type, derive_uuid(object_type, canonical))
}

/// Random identifier used when no identity data is available.
pub fn fallback_identifier(object_type: &str) -> Identifier {
    Identifier::new(object_type, Uuid::new_v4())
}
