//! Pre-flight validation of identity properties.

use std::collections::BTreeSet;

use crate::identity::registry::IdentityRegistry;
use crate::identity::types::PropertyBag;

/// Required identity properties of `object_type` that `bag` lacks, in
/// registry order. A property counts as missing when its key is absent or
/// its value is empty.
pub fn missing_in_order<'r>(
    registry: &'r IdentityRegistry,
    object_type: &str,
    bag: &PropertyBag,
) -> Vec<&'r str> {
    registry
        .get_identity_properties(object_type)
        .iter()
        .filter(|property| !bag.has_value(property))
        .map(|property| property.as_str())
        .collect()
}

/// Set of required identity properties of `object_type` absent from `bag`.
///
/// Empty iff the bag carries every required property. Unknown types have no
/// requirements and always yield an empty set.
pub fn missing_identity_properties(
    registry: &IdentityRegistry,
    object_type: &str,
    bag: &PropertyBag,
) -> BTreeSet<String> {
    missing_in_order(registry, object_type, bag)
        .into_iter()
        .map(str::to_string)
        .collect()
}
