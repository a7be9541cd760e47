//! Grid-STIX identifier CLI
//!
//! Derives, validates and inspects deterministic identifiers from the
//! command line.
//!
//! Usage:
//!   cargo run --features cli --bin grid_id -- generate \
//!     --type x-grid-generator \
//!     --props '{"name": "Main Power Plant Generator 1", "x_fuel_type": ["natural_gas"]}'
//!
//! Examples:
//!   # Which properties make a transformer's identity?
//!   cargo run --features cli --bin grid_id -- properties --type x-grid-transformer
//!
//!   # Pre-flight check, JSON output
//!   cargo run --features cli --bin grid_id -- validate --json \
//!     --type x-grid-smartmeter --props '{"name": "Residential Smart Meter"}'
//!
//!   # Refuse to fall back to a random identifier
//!   cargo run --features cli --bin grid_id -- generate --strict \
//!     --type x-grid-substation --props '{"name": "North"}'

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;

use grid_stix_identity::identity::service::CONFIG_DIR_ENV;
use grid_stix_identity::{GeneratedId, GenerationPolicy, IdentityService, PropertyBag};

/// Deterministic identifiers for Grid-STIX objects
#[derive(Parser, Debug)]
#[command(name = "grid_id")]
#[command(about = "Derive and inspect deterministic Grid-STIX identifiers")]
struct Args {
    /// Identity config file (default: $GRID_STIX_CONFIG_DIR/identity_properties.yaml,
    /// then config/identity_properties.yaml, then the built-in configuration)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate an identifier for an object
    Generate {
        /// Object type (e.g., "x-grid-generator")
        #[arg(long = "type", short = 't')]
        object_type: String,

        /// Property bag as a JSON object
        #[arg(long, short = 'p', default_value = "{}")]
        props: String,

        /// Explicit identifier, returned unchanged
        #[arg(long)]
        id: Option<String>,

        /// Fail instead of falling back when identity properties are missing
        #[arg(long)]
        strict: bool,
    },

    /// List required identity properties missing from a property bag
    Validate {
        #[arg(long = "type", short = 't')]
        object_type: String,

        #[arg(long, short = 'p', default_value = "{}")]
        props: String,
    },

    /// Show the identity properties of an object type
    Properties {
        #[arg(long = "type", short = 't')]
        object_type: String,
    },

    /// List registered object types
    Types,
}

fn parse_props(props: &str) -> Result<PropertyBag> {
    let value: serde_json::Value =
        serde_json::from_str(props).context("--props is not valid JSON")?;
    Ok(PropertyBag::from_json(value)?)
}

fn load_service(config: Option<PathBuf>) -> Result<IdentityService> {
    match config {
        Some(path) => IdentityService::load_from(&path)
            .with_context(|| format!("Failed to load identity config {}", path.display())),
        None => IdentityService::load().with_context(|| {
            format!("Failed to load identity config (check {})", CONFIG_DIR_ENV)
        }),
    }
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let service = load_service(args.config)?;

    match args.command {
        Command::Generate {
            object_type,
            props,
            id,
            strict,
        } => {
            let service = if strict {
                service.with_policy(GenerationPolicy::Strict)
            } else {
                service
            };
            let bag = parse_props(&props)?;
            let generated = service.generate_with(&object_type, &bag, id.as_deref())?;

            if args.json {
                let canonical = service
                    .canonical_form(&object_type, &bag)?
                    .map(|c| c.to_string());
                let fallback_reason = match &generated {
                    GeneratedId::Fallback { reason, .. } => Some(*reason),
                    _ => None,
                };
                let identity = service.get_identity_properties(&object_type);
                let ignored: Vec<&str> = bag
                    .iter()
                    .map(|(name, _)| name)
                    .filter(|name| !identity.iter().any(|p| p == name))
                    .collect();
                let output = json!({
                    "id": generated.to_string(),
                    "origin": generated.origin(),
                    "fallback_reason": fallback_reason,
                    "canonical_form": canonical,
                    "ignored_properties": ignored,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("{}", generated);
            }
        }

        Command::Validate { object_type, props } => {
            let bag = parse_props(&props)?;
            let missing = service.validate_identity_properties(&object_type, &bag);

            if args.json {
                let output = json!({
                    "object_type": object_type,
                    "registered": service.registry().contains(&object_type),
                    "missing": missing,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else if missing.is_empty() {
                println!("{}: all identity properties present", object_type);
            } else {
                let missing: Vec<String> = missing.into_iter().collect();
                println!("{}: missing {}", object_type, missing.join(", "));
            }
        }

        Command::Properties { object_type } => {
            let properties = service.get_identity_properties(&object_type);

            if args.json {
                println!("{}", serde_json::to_string_pretty(properties)?);
            } else if properties.is_empty() {
                println!("{}: not registered", object_type);
            } else {
                for property in properties {
                    println!("{}", property);
                }
            }
        }

        Command::Types => {
            let registry = service.registry();

            if args.json {
                let types: Vec<&str> = registry.object_types().collect();
                println!("{}", serde_json::to_string_pretty(&types)?);
            } else {
                for object_type in registry.object_types() {
                    let description = registry
                        .spec(object_type)
                        .and_then(|spec| spec.description())
                        .unwrap_or("");
                    println!("{:<48} {}", object_type, description);
                }
            }
        }
    }

    Ok(())
}
