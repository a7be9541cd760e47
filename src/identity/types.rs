//! Identity data model
//!
//! Property bags are supplied per object construction and are never retained
//! beyond a single generation call. `BTreeMap` keeps iteration deterministic;
//! the canonical form does not depend on it, but debug output and JSON
//! rendering stay stable.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{IdentityError, Result};
use crate::identity::diagnostics::FallbackReason;

// ---------------------------------------------------------------------------
// Property values
// ---------------------------------------------------------------------------

/// A single scalar property value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    fn from_json(property: &str, value: Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(Scalar::Bool(b)),
            Value::String(s) => Ok(Scalar::Text(s)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Scalar::Integer(i))
                } else if n.is_u64() {
                    Err(IdentityError::malformed(
                        property,
                        format!("integer {n} is out of range"),
                    ))
                } else {
                    n.as_f64().map(Scalar::Float).ok_or_else(|| {
                        IdentityError::malformed(property, format!("unsupported number {n}"))
                    })
                }
            }
            Value::Null => Err(IdentityError::malformed(
                property,
                "null is not allowed inside a sequence",
            )),
            Value::Array(_) => Err(IdentityError::malformed(
                property,
                "nested sequences are not supported",
            )),
            Value::Object(_) => Err(IdentityError::malformed(
                property,
                "maps are not supported as identity values",
            )),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::Integer(i)
    }
}

impl From<i32> for Scalar {
    fn from(i: i32) -> Self {
        Scalar::Integer(i64::from(i))
    }
}

impl From<u32> for Scalar {
    fn from(i: u32) -> Self {
        Scalar::Integer(i64::from(i))
    }
}

impl From<f64> for Scalar {
    fn from(f: f64) -> Self {
        Scalar::Float(f)
    }
}

/// A property value: undefined, a scalar, or an ordered sequence of scalars.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    #[default]
    Null,
    Scalar(Scalar),
    List(Vec<Scalar>),
}

impl PropertyValue {
    /// Convert a JSON value, rejecting shapes that have no canonical encoding.
    pub fn from_json(property: &str, value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(PropertyValue::Null),
            Value::Array(items) => items
                .into_iter()
                .map(|item| Scalar::from_json(property, item))
                .collect::<Result<Vec<_>>>()
                .map(PropertyValue::List),
            other => Scalar::from_json(property, other).map(PropertyValue::Scalar),
        }
    }

    /// Undefined, an empty string, or an empty sequence.
    pub fn is_empty(&self) -> bool {
        match self {
            PropertyValue::Null => true,
            PropertyValue::Scalar(Scalar::Text(s)) => s.is_empty(),
            PropertyValue::Scalar(_) => false,
            PropertyValue::List(items) => items.is_empty(),
        }
    }
}

impl From<Scalar> for PropertyValue {
    fn from(s: Scalar) -> Self {
        PropertyValue::Scalar(s)
    }
}

macro_rules! scalar_property_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for PropertyValue {
                fn from(v: $ty) -> Self {
                    PropertyValue::Scalar(Scalar::from(v))
                }
            }
        )*
    };
}

scalar_property_value!(&str, String, bool, i64, i32, u32, f64);

impl<T: Into<Scalar>> From<Vec<T>> for PropertyValue {
    fn from(items: Vec<T>) -> Self {
        PropertyValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Scalar>, const N: usize> From<[T; N]> for PropertyValue {
    fn from(items: [T; N]) -> Self {
        PropertyValue::List(items.into_iter().map(Into::into).collect())
    }
}

// ---------------------------------------------------------------------------
// PropertyBag
// ---------------------------------------------------------------------------

/// Caller-supplied mapping from property name to value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PropertyBag {
    entries: BTreeMap<String, PropertyValue>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<PropertyValue>) {
        self.entries.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.entries.get(name)
    }

    /// True when `name` is present with a non-empty value.
    pub fn has_value(&self, name: &str) -> bool {
        self.entries.get(name).is_some_and(|v| !v.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build a bag from a JSON object.
    ///
    /// ```
    /// use grid_stix_identity::PropertyBag;
    ///
    /// let bag = PropertyBag::from_json(serde_json::json!({
    ///     "name": "Main Substation Transformer",
    ///     "x_voltage_primary_kv": 138.0,
    /// }))
    /// .unwrap();
    /// assert!(bag.has_value("name"));
    /// ```
    pub fn from_json(value: Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(IdentityError::InvalidPropertyBag(
                "expected a JSON object".to_string(),
            ));
        };
        let mut bag = Self::new();
        for (name, value) in map {
            let value = PropertyValue::from_json(&name, value)?;
            bag.entries.insert(name, value);
        }
        Ok(bag)
    }
}

impl<K: Into<String>, V: Into<PropertyValue>> FromIterator<(K, V)> for PropertyBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bag = Self::new();
        for (k, v) in iter {
            bag.insert(k, v);
        }
        bag
    }
}

// ---------------------------------------------------------------------------
// CanonicalForm
// ---------------------------------------------------------------------------

/// Normalized serialization of a bag's identity properties. Hash input only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalForm(String);

impl CanonicalForm {
    pub(crate) fn new(encoded: String) -> Self {
        Self(encoded)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for CanonicalForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifier
// ---------------------------------------------------------------------------

/// Separator between the type prefix and the UUID.
pub const ID_SEPARATOR: &str = "--";

/// A `<type-prefix>--<uuid>` identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    type_prefix: String,
    uuid: Uuid,
}

impl Identifier {
    pub fn new(type_prefix: impl Into<String>, uuid: Uuid) -> Self {
        Self {
            type_prefix: type_prefix.into(),
            uuid,
        }
    }

    pub fn type_prefix(&self) -> &str {
        &self.type_prefix
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Name-derived (UUID version 5) rather than random.
    pub fn is_deterministic(&self) -> bool {
        self.uuid.get_version_num() == 5
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.type_prefix, ID_SEPARATOR, self.uuid.hyphenated())
    }
}

impl FromStr for Identifier {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| IdentityError::InvalidIdentifier {
            value: s.to_string(),
            reason: reason.to_string(),
        };

        let (prefix, uuid_text) = s
            .rsplit_once(ID_SEPARATOR)
            .ok_or_else(|| invalid("missing '--' separator"))?;
        if prefix.is_empty() {
            return Err(invalid("empty type prefix"));
        }
        // Only the 8-4-4-4-12 form is accepted
        if uuid_text.len() != 36 {
            return Err(invalid("UUID must be in 8-4-4-4-12 hexadecimal form"));
        }
        let uuid = Uuid::parse_str(uuid_text).map_err(|e| invalid(&e.to_string()))?;

        Ok(Self::new(prefix, uuid))
    }
}

// ---------------------------------------------------------------------------
// Generation result
// ---------------------------------------------------------------------------

/// Where an identifier came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdOrigin {
    Derived,
    Fallback,
    Explicit,
}

/// Outcome of identifier generation, with provenance.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedId {
    /// Name-derived from the canonical identity properties.
    Derived(Identifier),
    /// Random, because no identity data was available.
    Fallback {
        identifier: Identifier,
        reason: FallbackReason,
    },
    /// Caller-supplied, used verbatim.
    Explicit(String),
}

impl GeneratedId {
    pub fn origin(&self) -> IdOrigin {
        match self {
            GeneratedId::Derived(_) => IdOrigin::Derived,
            GeneratedId::Fallback { .. } => IdOrigin::Fallback,
            GeneratedId::Explicit(_) => IdOrigin::Explicit,
        }
    }

    /// The structured identifier, unless the value was caller-supplied.
    pub fn identifier(&self) -> Option<&Identifier> {
        match self {
            GeneratedId::Derived(id) | GeneratedId::Fallback { identifier: id, .. } => Some(id),
            GeneratedId::Explicit(_) => None,
        }
    }

    pub fn into_string(self) -> String {
        match self {
            GeneratedId::Explicit(id) => id,
            other => other.to_string(),
        }
    }
}

impl fmt::Display for GeneratedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratedId::Derived(id) | GeneratedId::Fallback { identifier: id, .. } => {
                write!(f, "{id}")
            }
            GeneratedId::Explicit(id) => f.write_str(id),
        }
    }
}
