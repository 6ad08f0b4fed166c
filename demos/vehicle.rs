//! Vehicle State Machine
//!
//! This example drives a vehicle through its gears using a definition loaded
//! from TOML.
//!
//! Key concepts:
//! - Role rules with dependency predicates
//! - Before/after and state-entry callbacks
//! - Derived operations resolved by name
//! - Snapshots and DOT export
//!
//! Run with: RUST_LOG=turnstile=debug cargo run --example vehicle

use serde_json::json;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use turnstile::callbacks::Control;
use turnstile::core::Predicates;
use turnstile::dispatch::CapabilityDispatcher;
use turnstile::dot::definition_to_dot;
use turnstile::machine::{MachineDefinition, StateMachine};

struct Vehicle {
    title: String,
    has_toolbox: bool,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Vehicle State Machine ===\n");

    let definition = Arc::new(MachineDefinition::from_toml_str(include_str!("vehicle.toml"))?);
    let machine = StateMachine::new(Arc::clone(&definition))?
        .with_resolver(Predicates::new().with("has_key", |role| role == Some("driver")));

    let mut vehicle = CapabilityDispatcher::new(
        Vehicle {
            title: "Toybota".to_string(),
            has_toolbox: true,
        },
        machine,
    );
    vehicle.add_method("has_tools", |vehicle: &Vehicle, _, _| {
        Ok(json!(vehicle.has_toolbox))
    })?;

    vehicle.on(
        "transition",
        "after",
        |event| {
            println!("  {}: {} -> {}", event.transition, event.from, event.to);
            Ok(Control::Continue)
        },
        true,
    )?;
    vehicle.on(
        "stalled",
        "enter",
        |_| {
            println!("  (engine stalled, call a mechanic)");
            Ok(Control::Continue)
        },
        true,
    )?;

    println!("{} starts {}", vehicle.host().title, vehicle.current_state());
    println!("Thief tries to ignite: {}", vehicle.call("ignite", &[json!("thief")])?);
    println!("Driver ignites: {}", vehicle.call("ignite", &[json!("driver")])?);

    for transition in ["shift_up", "shift_up", "crash"] {
        vehicle.call(transition, &[])?;
    }

    println!("Can the driver repair? {}", vehicle.can("repair", Some("driver"))?);
    println!("Mechanic repairs: {}", vehicle.call("repair", &[json!("mechanic")])?);
    println!("Parked again: {}\n", vehicle.call("is_parked", &[])?);

    let snapshot = vehicle.machine().snapshot();
    println!(
        "Snapshot {} with {} transitions:\n{}\n",
        snapshot.id,
        snapshot.history.len(),
        snapshot.to_json()?
    );

    println!("{}", definition_to_dot(&definition, "Vehicle"));

    println!("=== Example Complete ===");
    Ok(())
}
