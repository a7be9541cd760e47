//! Property normalization for identity hashing
//!
//! Turns a raw property bag into a [`CanonicalForm`]:
//! - Only registered identity properties are kept; empty values count as absent
//! - Strings are lowercased, other scalars use a fixed textual encoding
//! - Sequences are normalized element-wise and sorted
//! - Entries are emitted in the registry's declared order as `name=value`,
//!   joined with `|`
//!
//! ## Encoding
//!
//! ```text
//! bool     true | false
//! integer  decimal                      42, -7
//! float    shortest round-trip text     500.0, 13.8, 1e16   (-0.0 -> 0.0)
//! string   lowercased                   natural_gas
//! list     [e1,e2,...] sorted           [coal,natural_gas]
//! ```
//!
//! Inside string values the characters `\ | = , [ ]` are escaped with a
//! leading `\`, so a value can never imitate an entry or list boundary:
//! `a|b=c` encodes as `a\|b\=c`. Property names may not contain them at all
//! (the registry rejects such names).
//!
//! NaN and infinities have no stable encoding and are rejected.

use std::cmp::Ordering;

use crate::error::{IdentityError, Result};
use crate::identity::types::{CanonicalForm, PropertyBag, PropertyValue, Scalar};

/// Separator between `name=value` entries.
pub const ENTRY_SEPARATOR: char = '|';

/// Separator between list elements.
pub const LIST_SEPARATOR: char = ',';

/// Escape prefix for reserved characters inside string values.
pub const ESCAPE: char = '\\';

/// Characters with structural meaning in a canonical form.
pub const RESERVED: [char; 6] = [ESCAPE, ENTRY_SEPARATOR, '=', LIST_SEPARATOR, '[', ']'];

pub(crate) fn is_reserved(c: char) -> bool {
    RESERVED.contains(&c)
}

fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        if is_reserved(c) {
            out.push(ESCAPE);
        }
        out.push(c);
    }
}

/// A scalar after normalization, carrying its canonical text.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedScalar {
    Bool(bool),
    Number { value: f64, text: String },
    Text(String),
}

impl NormalizedScalar {
    /// Normalized text before escaping.
    pub fn text(&self) -> &str {
        match self {
            NormalizedScalar::Bool(true) => "true",
            NormalizedScalar::Bool(false) => "false",
            NormalizedScalar::Number { text, .. } | NormalizedScalar::Text(text) => text,
        }
    }

    /// Append the escaped encoding of this scalar to `out`.
    pub fn encode_into(&self, out: &mut String) {
        match self {
            NormalizedScalar::Text(text) => push_escaped(out, text),
            other => out.push_str(other.text()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            NormalizedScalar::Bool(_) => 0,
            NormalizedScalar::Number { .. } => 1,
            NormalizedScalar::Text(_) => 2,
        }
    }

    /// Total order: booleans < numbers < strings; numbers numerically,
    /// strings bytewise.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (NormalizedScalar::Bool(a), NormalizedScalar::Bool(b)) => a.cmp(b),
            (
                NormalizedScalar::Number { value: a, text: ta },
                NormalizedScalar::Number { value: b, text: tb },
            ) => a.total_cmp(b).then_with(|| ta.cmp(tb)),
            (NormalizedScalar::Text(a), NormalizedScalar::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Normalize one scalar.
pub fn normalize_scalar(property: &str, scalar: &Scalar) -> Result<NormalizedScalar> {
    Ok(match scalar {
        Scalar::Bool(b) => NormalizedScalar::Bool(*b),
        Scalar::Integer(i) => NormalizedScalar::Number {
            value: *i as f64,
            text: i.to_string(),
        },
        Scalar::Float(f) => NormalizedScalar::Number {
            value: *f,
            text: encode_float(property, *f)?,
        },
        Scalar::Text(s) => NormalizedScalar::Text(s.to_lowercase()),
    })
}

fn encode_float(property: &str, value: f64) -> Result<String> {
    if !value.is_finite() {
        return Err(IdentityError::malformed(
            property,
            format!("non-finite number {value}"),
        ));
    }
    if value == 0.0 {
        return Ok("0.0".to_string());
    }
    // Debug formatting is the shortest round-trip form and always keeps a
    // fractional part or exponent
    Ok(format!("{value:?}"))
}

/// Canonical text for a single property value.
pub fn encode_value(property: &str, value: &PropertyValue) -> Result<String> {
    match value {
        PropertyValue::Null => Ok(String::new()),
        PropertyValue::Scalar(scalar) => {
            let mut out = String::new();
            normalize_scalar(property, scalar)?.encode_into(&mut out);
            Ok(out)
        }
        PropertyValue::List(items) => {
            let mut normalized = items
                .iter()
                .map(|item| normalize_scalar(property, item))
                .collect::<Result<Vec<_>>>()?;
            normalized.sort_by(NormalizedScalar::total_cmp);

            let mut out = String::from("[");
            for (i, item) in normalized.iter().enumerate() {
                if i > 0 {
                    out.push(LIST_SEPARATOR);
                }
                item.encode_into(&mut out);
            }
            out.push(']');
            Ok(out)
        }
    }
}

/// Build the canonical form of `bag` restricted to `identity_properties`.
///
/// Returns `Ok(None)` when none of the identity properties carries a value;
/// the caller treats that as the signal to fall back to a random identifier.
///
/// ```
/// use grid_stix_identity::identity::normalize::normalize;
/// use grid_stix_identity::PropertyBag;
///
/// let spec = vec!["name".to_string(), "x_fuel_type".to_string()];
/// let bag = PropertyBag::new()
///     .with("x_fuel_type", ["NATURAL_GAS", "coal"])
///     .with("name", "Test Generator")
///     .with("description", "ignored");
///
/// let canonical = normalize(&bag, &spec).unwrap().unwrap();
/// assert_eq!(canonical.as_str(), "name=test generator|x_fuel_type=[coal,natural_gas]");
/// ```
pub fn normalize(
    bag: &PropertyBag,
    identity_properties: &[String],
) -> Result<Option<CanonicalForm>> {
    let mut encoded = String::new();
    let mut found = 0usize;

    for property in identity_properties {
        let Some(value) = bag.get(property).filter(|v| !v.is_empty()) else {
            continue;
        };
        if found > 0 {
            encoded.push(ENTRY_SEPARATOR);
        }
        encoded.push_str(property);
        encoded.push('=');
        encoded.push_str(&encode_value(property, value)?);
        found += 1;
    }

    if found == 0 {
        return Ok(None);
    }
    Ok(Some(CanonicalForm::new(encoded)))
}
