//! Deterministic identity for Grid-STIX objects
//!
//! Pipeline, leaves first:
//!
//! ```text
//! IdentityRegistry ──► normalize ──► derive_identifier ──► "<type>--<uuidv5>"
//!        │                 │
//!        │                 └─ no identity data ──► fallback_identifier + DiagnosticSink
//!        └─ missing_identity_properties (pre-flight)
//! ```

pub mod diagnostics;
pub mod generator;
pub mod normalize;
pub mod registry;
pub mod service;
pub mod types;
pub mod validate;

pub use diagnostics::{DiagnosticSink, FallbackEvent, FallbackReason, RecordingSink, TracingSink};
pub use generator::IDENTITY_NAMESPACE;
pub use registry::{IdentityRegistry, IdentitySpec};
pub use service::{GenerationPolicy, IdentityService};
pub use types::{
    CanonicalForm, GeneratedId, IdOrigin, Identifier, PropertyBag, PropertyValue, Scalar,
};
