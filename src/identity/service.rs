//! IdentityService - entry point for identifier generation.
//!
//! Bundles an immutable [`IdentityRegistry`], a [`DiagnosticSink`] and a
//! [`GenerationPolicy`]. Construct it once at startup and share it (it is
//! `Send + Sync`); every operation is a pure function of its arguments and
//! the registry.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{IdentityError, Result};
use crate::identity::diagnostics::{DiagnosticSink, FallbackEvent, FallbackReason, TracingSink};
use crate::identity::generator::{derive_identifier, fallback_identifier};
use crate::identity::normalize::normalize;
use crate::identity::registry::IdentityRegistry;
use crate::identity::types::{CanonicalForm, GeneratedId, PropertyBag};
use crate::identity::validate::{missing_identity_properties, missing_in_order};

/// Environment variable naming the configuration directory.
pub const CONFIG_DIR_ENV: &str = "GRID_STIX_CONFIG_DIR";

/// File name of the identity configuration inside the config directory.
pub const CONFIG_FILE: &str = "identity_properties.yaml";

/// How to treat incomplete identity data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationPolicy {
    /// Always produce an identifier; fall back to a random one when no
    /// identity property is present.
    #[default]
    Lenient,
    /// Refuse unknown types and bags missing any required identity property.
    Strict,
}

/// Service for deriving, validating and introspecting identifiers.
#[derive(Clone)]
pub struct IdentityService {
    registry: Arc<IdentityRegistry>,
    sink: Arc<dyn DiagnosticSink>,
    policy: GenerationPolicy,
}

impl std::fmt::Debug for IdentityService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityService")
            .field("object_types", &self.registry.len())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl IdentityService {
    /// Create a lenient service that reports fallbacks through `tracing`.
    pub fn new(registry: impl Into<Arc<IdentityRegistry>>) -> Self {
        Self {
            registry: registry.into(),
            sink: Arc::new(TracingSink),
            policy: GenerationPolicy::default(),
        }
    }

    /// Service over the configuration compiled into the crate.
    pub fn builtin() -> Result<Self> {
        Ok(Self::new(IdentityRegistry::builtin()?))
    }

    /// Load from the default config path, or the built-in configuration when
    /// no config file is found.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(path),
            None => {
                tracing::debug!("No identity config file found, using built-in configuration");
                Self::builtin()
            }
        }
    }

    /// Load from a specific YAML file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let registry = IdentityRegistry::load(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "Loaded identity config");
        Ok(Self::new(registry))
    }

    /// Resolve the config file path.
    ///
    /// Checks `$GRID_STIX_CONFIG_DIR/identity_properties.yaml`, then
    /// `config/identity_properties.yaml` relative to the working directory.
    pub fn config_path() -> Option<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            let path = PathBuf::from(dir).join(CONFIG_FILE);
            if path.exists() {
                return Some(path);
            }
            tracing::warn!(
                path = %path.display(),
                "{} is set but the identity config does not exist",
                CONFIG_DIR_ENV
            );
        }

        let relative = PathBuf::from("config").join(CONFIG_FILE);
        relative.exists().then_some(relative)
    }

    /// Replace the diagnostic sink.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_policy(mut self, policy: GenerationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    pub fn policy(&self) -> GenerationPolicy {
        self.policy
    }

    // =========================================================================
    // Public surface
    // =========================================================================

    /// Identity properties registered for `object_type`, in declared order.
    pub fn get_identity_properties(&self, object_type: &str) -> &[String] {
        self.registry.get_identity_properties(object_type)
    }

    /// Required identity properties absent from `properties`.
    pub fn validate_identity_properties(
        &self,
        object_type: &str,
        properties: &PropertyBag,
    ) -> BTreeSet<String> {
        missing_identity_properties(&self.registry, object_type, properties)
    }

    /// Identifier string for an object.
    ///
    /// `explicit_id` is returned unmodified when given; otherwise the
    /// identifier is derived from the identity properties, or drawn at
    /// random when there are none.
    ///
    /// ```
    /// use grid_stix_identity::{IdentityService, PropertyBag};
    ///
    /// let service = IdentityService::builtin().unwrap();
    /// let bag = PropertyBag::new().with("name", "Main Substation");
    ///
    /// let id = service.generate_id("x-grid-substation", &bag, None).unwrap();
    /// assert!(id.starts_with("x-grid-substation--"));
    ///
    /// let custom = service.generate_id("x-grid-substation", &bag, Some("custom--1")).unwrap();
    /// assert_eq!(custom, "custom--1");
    /// ```
    pub fn generate_id(
        &self,
        object_type: &str,
        properties: &PropertyBag,
        explicit_id: Option<&str>,
    ) -> Result<String> {
        match explicit_id {
            Some(id) => Ok(id.to_string()),
            None => self.generate(object_type, properties).map(GeneratedId::into_string),
        }
    }

    /// Like [`generate_id`](Self::generate_id) but keeps the provenance.
    pub fn generate_with(
        &self,
        object_type: &str,
        properties: &PropertyBag,
        explicit_id: Option<&str>,
    ) -> Result<GeneratedId> {
        match explicit_id {
            Some(id) => Ok(GeneratedId::Explicit(id.to_string())),
            None => self.generate(object_type, properties),
        }
    }

    /// Derive an identifier, or fall back to a random one.
    pub fn generate(&self, object_type: &str, properties: &PropertyBag) -> Result<GeneratedId> {
        if self.policy == GenerationPolicy::Strict {
            self.check_strict(object_type, properties)?;
        }

        match self.canonical_form(object_type, properties)? {
            Some(canonical) => Ok(GeneratedId::Derived(derive_identifier(
                object_type,
                &canonical,
            ))),
            None => {
                let reason = if self.registry.contains(object_type) {
                    FallbackReason::NoIdentityProperties
                } else {
                    FallbackReason::UnknownObjectType
                };
                self.sink.fallback(&FallbackEvent {
                    object_type: object_type.to_string(),
                    reason,
                });
                Ok(GeneratedId::Fallback {
                    identifier: fallback_identifier(object_type),
                    reason,
                })
            }
        }
    }

    /// Canonical form of the identity properties, `None` when there are none.
    pub fn canonical_form(
        &self,
        object_type: &str,
        properties: &PropertyBag,
    ) -> Result<Option<CanonicalForm>> {
        normalize(properties, self.registry.get_identity_properties(object_type))
    }

    fn check_strict(&self, object_type: &str, properties: &PropertyBag) -> Result<()> {
        if !self.registry.contains(object_type) {
            return Err(IdentityError::UnknownObjectType {
                object_type: object_type.to_string(),
            });
        }

        let missing = missing_in_order(&self.registry, object_type, properties);
        if !missing.is_empty() {
            return Err(IdentityError::MissingIdentityProperties {
                object_type: object_type.to_string(),
                missing: missing.into_iter().map(str::to_string).collect(),
            });
        }
        Ok(())
    }
}
