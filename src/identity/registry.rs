//! Identity property registry.
//!
//! Loads the per-type identity property lists from
//! `config/identity_properties.yaml` (or any YAML in the same shape) and
//! answers lookups. The registry is built once and never mutated, so a shared
//! reference can be read from any number of threads.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::identity::normalize::is_reserved;

/// Identity configuration compiled into the crate.
pub const BUILTIN_CONFIG: &str = include_str!("../../config/identity_properties.yaml");

/// Root of the YAML configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default)]
    pub version: Option<String>,

    /// Object type name -> definition
    pub object_types: BTreeMap<String, ObjectTypeDef>,
}

/// A single object type entry in the configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectTypeDef {
    #[serde(default)]
    pub description: Option<String>,

    /// Identity-bearing properties, in canonical order
    pub identity_properties: Vec<String>,
}

/// Ordered identity properties for one object type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentitySpec {
    properties: Vec<String>,
    description: Option<String>,
}

impl IdentitySpec {
    /// Property names in declared order.
    pub fn properties(&self) -> &[String] {
        &self.properties
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn contains(&self, property: &str) -> bool {
        self.properties.iter().any(|p| p == property)
    }
}

/// Immutable mapping from object type to its identity spec.
#[derive(Debug, Clone, Default)]
pub struct IdentityRegistry {
    version: Option<String>,
    specs: BTreeMap<String, IdentitySpec>,
}

impl IdentityRegistry {
    /// Load a registry from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse a registry from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, RegistryError> {
        let config: IdentityConfig = serde_yaml::from_str(yaml)?;
        Self::from_config(config)
    }

    /// The configuration shipped with the crate.
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::from_yaml(BUILTIN_CONFIG)
    }

    /// Validate a parsed configuration and build the registry.
    pub fn from_config(config: IdentityConfig) -> Result<Self, RegistryError> {
        let mut specs = BTreeMap::new();

        for (object_type, def) in config.object_types {
            if object_type.trim().is_empty() {
                return Err(RegistryError::EmptyObjectType);
            }
            let properties = validate_properties(&object_type, def.identity_properties)?;
            specs.insert(
                object_type,
                IdentitySpec {
                    properties,
                    description: def.description,
                },
            );
        }

        tracing::debug!(
            object_types = specs.len(),
            version = config.version.as_deref().unwrap_or("unversioned"),
            "Loaded identity registry"
        );

        Ok(Self {
            version: config.version,
            specs,
        })
    }

    /// Build a registry directly from `(object_type, properties)` pairs.
    pub fn from_entries<I, T, P, S>(entries: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (T, P)>,
        T: Into<String>,
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let object_types = entries
            .into_iter()
            .map(|(object_type, properties)| {
                (
                    object_type.into(),
                    ObjectTypeDef {
                        description: None,
                        identity_properties: properties.into_iter().map(Into::into).collect(),
                    },
                )
            })
            .collect();

        Self::from_config(IdentityConfig {
            version: None,
            object_types,
        })
    }

    /// Identity properties for `object_type` in declared order.
    ///
    /// Unknown types yield an empty slice so callers degrade to fallback
    /// generation instead of failing.
    pub fn get_identity_properties(&self, object_type: &str) -> &[String] {
        self.specs
            .get(object_type)
            .map(|spec| spec.properties())
            .unwrap_or(&[])
    }

    /// Get the spec for an object type.
    pub fn spec(&self, object_type: &str) -> Option<&IdentitySpec> {
        self.specs.get(object_type)
    }

    pub fn contains(&self, object_type: &str) -> bool {
        self.specs.contains_key(object_type)
    }

    /// All registered object type names, sorted.
    pub fn object_types(&self) -> impl Iterator<Item = &str> {
        self.specs.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

fn validate_properties(
    object_type: &str,
    properties: Vec<String>,
) -> Result<Vec<String>, RegistryError> {
    if properties.is_empty() {
        return Err(RegistryError::EmptyIdentitySpec {
            object_type: object_type.to_string(),
        });
    }

    let mut seen = HashSet::new();
    for property in &properties {
        if property.trim().is_empty() {
            return Err(RegistryError::BlankPropertyName {
                object_type: object_type.to_string(),
            });
        }
        if property.chars().any(is_reserved) {
            return Err(RegistryError::ReservedCharacter {
                object_type: object_type.to_string(),
                property: property.clone(),
            });
        }
        if !seen.insert(property.as_str()) {
            return Err(RegistryError::DuplicateProperty {
                object_type: object_type.to_string(),
                property: property.clone(),
            });
        }
    }

    Ok(properties)
}
