//! Integration tests for deterministic identity generation
//!
//! Tests verify:
//! 1. Known-answer identifiers (bit-exact UUIDv5 derivation)
//! 2. Case and list-order invariance through the public surface
//! 3. Fallback generation and its diagnostics
//! 4. Validator completeness
//! 5. Registry loading from files and config-path resolution

use std::collections::BTreeSet;
use std::io::Write;
use std::sync::Arc;
use std::thread;

use grid_stix_identity::{
    FallbackReason, GeneratedId, GenerationPolicy, IdOrigin, IdentityError, IdentityRegistry,
    IdentityService, Identifier, PropertyBag, RecordingSink,
};
use serde_json::json;

// ============================================================================
// TEST FIXTURES
// ============================================================================

const GENERATOR_YAML: &str = r#"
version: "1.0"
object_types:
  x-grid-generator:
    description: "Generation asset"
    identity_properties: [name, asset_id, power_rating_mw, fuel_type, owner_organization]
"#;

fn generator_service() -> (IdentityService, Arc<RecordingSink>) {
    let registry = IdentityRegistry::from_yaml(GENERATOR_YAML).unwrap();
    let sink = Arc::new(RecordingSink::new());
    let service = IdentityService::new(registry).with_sink(sink.clone());
    (service, sink)
}

fn builtin_service() -> (IdentityService, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::new());
    let service = IdentityService::builtin().unwrap().with_sink(sink.clone());
    (service, sink)
}

fn assert_uuid_bearing(id: &str, object_type: &str) {
    let parsed: Identifier = id.parse().unwrap();
    assert_eq!(parsed.type_prefix(), object_type);
    assert_eq!(id.len(), object_type.len() + 2 + 36);
}

// ============================================================================
// END-TO-END SCENARIO
// ============================================================================

#[test]
fn test_generator_scenario_converges() {
    let (service, sink) = generator_service();

    let first = PropertyBag::new()
        .with("name", "Main Power Plant Generator 1")
        .with("asset_id", "GEN-001")
        .with("power_rating_mw", 500.0)
        .with("fuel_type", ["natural_gas"])
        .with("owner_organization", "City Electric Utility");

    let second = PropertyBag::from_json(json!({
        "owner_organization": "CITY ELECTRIC UTILITY",
        "fuel_type": ["Natural_Gas"],
        "power_rating_mw": 500.0,
        "asset_id": "gen-001",
        "name": "main power plant generator 1",
        "description": "entered by a different operator",
    }))
    .unwrap();

    let a = service.generate_id("x-grid-generator", &first, None).unwrap();
    let b = service.generate_id("x-grid-generator", &second, None).unwrap();

    assert_eq!(a, b);
    assert_eq!(
        a,
        "x-grid-generator--140ec141-193f-5484-851b-30aa7ff5eed5"
    );
    assert!(sink.events().is_empty());
}

#[test]
fn test_known_answer_builtin_types() {
    let (service, _) = builtin_service();

    let transformer = PropertyBag::new()
        .with("name", "Main Substation Transformer")
        .with("x_asset_id", "TRANS-001")
        .with("x_voltage_primary_kv", 138.0)
        .with("x_voltage_secondary_kv", 13.8)
        .with("x_power_rating_mva", 100.0);
    assert_eq!(
        service.generate_id("x-grid-transformer", &transformer, None).unwrap(),
        "x-grid-transformer--fe6e55d6-1b61-5728-9528-ea431d787bc8"
    );

    let meter = PropertyBag::new()
        .with("name", "Test Meter")
        .with("x_asset_id", "METER-001")
        .with("x_ip_address", ["192.168.1.100", "10.0.0.1"])
        .with("x_mac_address", "00:11:22:33:44:55");
    assert_eq!(
        service.generate_id("x-grid-smartmeter", &meter, None).unwrap(),
        "x-grid-smartmeter--2144d6ff-0c39-5c4b-85ac-1d789bdc291a"
    );
}

// ============================================================================
// INVARIANTS
// ============================================================================

#[test]
fn test_case_invariance() {
    let (service, _) = builtin_service();
    let upper = PropertyBag::new()
        .with("name", "Test Generator")
        .with("x_fuel_type", ["NATURAL_GAS"]);
    let lower = PropertyBag::new()
        .with("name", "test generator")
        .with("x_fuel_type", ["natural_gas"]);

    assert_eq!(
        service.generate_id("x-grid-generator", &upper, None).unwrap(),
        service.generate_id("x-grid-generator", &lower, None).unwrap()
    );
}

#[test]
fn test_list_order_invariance() {
    let (service, _) = builtin_service();
    let a = PropertyBag::new().with("x_fuel_type", ["coal", "natural_gas"]);
    let b = PropertyBag::new().with("x_fuel_type", ["natural_gas", "coal"]);

    assert_eq!(
        service.generate_id("x-grid-generator", &a, None).unwrap(),
        service.generate_id("x-grid-generator", &b, None).unwrap()
    );
}

#[test]
fn test_content_sensitivity() {
    let (service, _) = builtin_service();
    let base = PropertyBag::new()
        .with("name", "Main Power Plant Generator")
        .with("x_asset_id", "GEN-001")
        .with("x_power_rating_mw", 500.0);

    let base_id = service.generate_id("x-grid-generator", &base, None).unwrap();
    for changed in [
        base.clone().with("x_asset_id", "GEN-002"),
        base.clone().with("x_power_rating_mw", 300.0),
        base.clone().with("name", "Different Generator"),
        base.clone().with("x_fuel_type", "coal"),
    ] {
        assert_ne!(
            service.generate_id("x-grid-generator", &changed, None).unwrap(),
            base_id
        );
    }

    // Non-identity properties do not participate
    let annotated = base.clone().with("description", "Peaking unit");
    assert_eq!(
        service.generate_id("x-grid-generator", &annotated, None).unwrap(),
        base_id
    );
}

#[test]
fn test_separator_characters_in_values_do_not_collide() {
    let registry = IdentityRegistry::from_entries([("t", ["a", "b"])]).unwrap();
    let service = IdentityService::new(registry);

    let smuggled = PropertyBag::new().with("a", "x|b=y");
    let split = PropertyBag::new().with("a", "x").with("b", "y");
    assert_ne!(
        service.generate_id("t", &smuggled, None).unwrap(),
        service.generate_id("t", &split, None).unwrap()
    );

    let one = PropertyBag::new().with("a", ["x,y"]);
    let two = PropertyBag::new().with("a", ["x", "y"]);
    assert_ne!(
        service.generate_id("t", &one, None).unwrap(),
        service.generate_id("t", &two, None).unwrap()
    );

    // Organisation names with commas stay one list element
    let (service, _) = builtin_service();
    let joint = PropertyBag::new()
        .with("name", "Peaker 7")
        .with("x_owner_organization", ["Smith, Jones"]);
    let separate = PropertyBag::new()
        .with("name", "Peaker 7")
        .with("x_owner_organization", ["Smith", " Jones"]);
    assert_ne!(
        service.generate_id("x-grid-generator", &joint, None).unwrap(),
        service.generate_id("x-grid-generator", &separate, None).unwrap()
    );
}

#[test]
fn test_object_type_separates_identifiers() {
    let (service, _) = builtin_service();
    let bag = PropertyBag::new()
        .with("name", "Shared Name")
        .with("x_asset_id", "ASSET-001");

    let generator = service.generate_id("x-grid-generator", &bag, None).unwrap();
    let transformer = service.generate_id("x-grid-transformer", &bag, None).unwrap();
    let substation = service.generate_id("x-grid-substation", &bag, None).unwrap();

    assert!(generator.starts_with("x-grid-generator--"));
    assert!(transformer.starts_with("x-grid-transformer--"));
    assert_ne!(generator[18..], transformer[20..]);
    assert_ne!(generator, substation);
}

#[test]
fn test_explicit_override() {
    let (service, sink) = builtin_service();
    let bag = PropertyBag::new().with("name", "Main Power Plant Generator");

    assert_eq!(
        service
            .generate_id("x-grid-generator", &bag, Some("custom--1"))
            .unwrap(),
        "custom--1"
    );
    // Not validated for format
    assert_eq!(
        service
            .generate_id("x-grid-generator", &PropertyBag::new(), Some("not an id"))
            .unwrap(),
        "not an id"
    );
    assert!(sink.events().is_empty());
}

// ============================================================================
// FALLBACK
// ============================================================================

#[test]
fn test_fallback_is_random_and_reported() {
    let (service, sink) = builtin_service();

    let a = service
        .generate_id("x-grid-generator", &PropertyBag::new(), None)
        .unwrap();
    let b = service
        .generate_id("x-grid-generator", &PropertyBag::new(), None)
        .unwrap();

    assert_ne!(a, b);
    assert_uuid_bearing(&a, "x-grid-generator");
    assert_uuid_bearing(&b, "x-grid-generator");
    assert!(!a.parse::<Identifier>().unwrap().is_deterministic());

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert!(events
        .iter()
        .all(|e| e.object_type == "x-grid-generator"
            && e.reason == FallbackReason::NoIdentityProperties));
}

#[test]
fn test_unknown_type_falls_back() {
    let (service, sink) = builtin_service();
    let bag = PropertyBag::new().with("name", "Mystery Device");

    let id = service.generate("x-vendor-widget", &bag).unwrap();
    assert_eq!(id.origin(), IdOrigin::Fallback);
    assert!(matches!(
        id,
        GeneratedId::Fallback {
            reason: FallbackReason::UnknownObjectType,
            ..
        }
    ));
    assert_eq!(sink.events()[0].reason, FallbackReason::UnknownObjectType);
}

#[test]
fn test_strict_policy_mirrors_validator() {
    let sink = Arc::new(RecordingSink::new());
    let service = IdentityService::builtin()
        .unwrap()
        .with_sink(sink.clone())
        .with_policy(GenerationPolicy::Strict);

    let minimal = PropertyBag::new().with("name", "Minimal Generator");
    let missing = service.validate_identity_properties("x-grid-generator", &minimal);

    match service.generate("x-grid-generator", &minimal) {
        Err(IdentityError::MissingIdentityProperties { missing: listed, .. }) => {
            assert_eq!(listed.into_iter().collect::<BTreeSet<_>>(), missing);
        }
        other => panic!("expected MissingIdentityProperties, got {other:?}"),
    }
    assert!(sink.events().is_empty());
}

// ============================================================================
// VALIDATOR
// ============================================================================

#[test]
fn test_validator_completeness() {
    let (service, _) = builtin_service();
    let required: BTreeSet<String> = service
        .get_identity_properties("x-grid-generator")
        .iter()
        .cloned()
        .collect();

    let minimal = PropertyBag::new().with("name", "Minimal Generator");
    let missing = service.validate_identity_properties("x-grid-generator", &minimal);
    let expected: BTreeSet<String> = required
        .iter()
        .filter(|p| p.as_str() != "name")
        .cloned()
        .collect();
    assert_eq!(missing, expected);

    let complete: PropertyBag = required
        .iter()
        .map(|p| (p.clone(), "value"))
        .collect();
    assert!(service
        .validate_identity_properties("x-grid-generator", &complete)
        .is_empty());
}

// ============================================================================
// CONFIGURATION
// ============================================================================

#[test]
fn test_load_registry_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(GENERATOR_YAML.as_bytes()).unwrap();

    let service = IdentityService::load_from(file.path()).unwrap();
    assert_eq!(
        service.get_identity_properties("x-grid-generator"),
        [
            "name",
            "asset_id",
            "power_rating_mw",
            "fuel_type",
            "owner_organization"
        ]
    );
    assert!(service.get_identity_properties("x-grid-transformer").is_empty());
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = IdentityService::load_from(dir.path().join("absent.yaml"));
    assert!(matches!(result, Err(IdentityError::Registry(_))));
}

#[test]
fn test_builtin_configuration_is_valid() {
    let registry = IdentityRegistry::builtin().unwrap();
    assert!(registry.len() >= 90);
    for object_type in registry.object_types() {
        assert!(object_type.starts_with("x-grid-"), "{object_type}");
        assert!(!registry.get_identity_properties(object_type).is_empty());
    }
}

// ============================================================================
// CONCURRENCY
// ============================================================================

#[test]
fn test_parallel_generation_agrees() {
    let (service, _) = builtin_service();
    let service = Arc::new(service);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                let bag = PropertyBag::new()
                    .with("name", "Residential Smart Meter")
                    .with("x_asset_id", "METER-001");
                service.generate_id("x-grid-smartmeter", &bag, None).unwrap()
            })
        })
        .collect();

    let ids: BTreeSet<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(ids.len(), 1);
}
