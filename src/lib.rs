//! Grid-STIX Identity - deterministic, content-derived identifiers
//!
//! Records describing the same real-world grid asset, component, event or
//! relationship converge on the same identifier without a central registry.
//! Each object type declares its identity properties; those values are
//! normalized (case-folded, lists sorted, registry order) and hashed with a
//! fixed namespace into a version 5 UUID.
//!
//! ## Quick Start
//!
//! ```rust
//! use grid_stix_identity::{IdentityService, PropertyBag};
//!
//! let service = IdentityService::builtin().unwrap();
//!
//! let a = PropertyBag::new()
//!     .with("name", "Main Power Plant Generator 1")
//!     .with("x_fuel_type", ["natural_gas", "coal"]);
//! let b = PropertyBag::new()
//!     .with("name", "MAIN POWER PLANT GENERATOR 1")
//!     .with("x_fuel_type", ["COAL", "NATURAL_GAS"]);
//!
//! assert_eq!(
//!     service.generate_id("x-grid-generator", &a, None).unwrap(),
//!     service.generate_id("x-grid-generator", &b, None).unwrap(),
//! );
//! ```

// Core error handling
pub mod error;

// Registry, normalizer, generator, validator
pub mod identity;

// Essential error types
pub use error::{IdentityError, RegistryError};

// Public surface
pub use identity::{
    CanonicalForm, DiagnosticSink, FallbackEvent, FallbackReason, GeneratedId, GenerationPolicy,
    IdOrigin, IdentityRegistry, IdentityService, IdentitySpec, Identifier, PropertyBag,
    PropertyValue, RecordingSink, Scalar, TracingSink, IDENTITY_NAMESPACE,
};
