//! Dry-run a seeding recipe against recording hardware.
//!
//! Every relay write and stepper call is recorded instead of touching real
//! lines, and pauses return immediately, so a full tray finishes in a few
//! seconds. Useful for checking a recipe's motion sequence at the bench.
//!
//! Run with: `cargo run --example dry_run -- [recipe] [rows]`
//!
//! `recipe` is an index (1-5) or a name such as `dibble-seed-12-rows`.
//! Set `RUST_LOG=seeder_motion=debug` to see every primitive.

use std::env;
use std::sync::Arc;

use seeder_motion::{
    config::MachineConfig,
    error::Result,
    hal::mock::{HardwareEvent, HardwareLog, RecordingGpio, RecordingPeripheral},
    machine::Seeder,
    recipe::{Recipe, RunOverrides},
};
use tracing_subscriber::EnvFilter;

/// Delay that returns immediately.
struct InstantDelay;

impl embedded_hal::delay::DelayNs for InstantDelay {
    fn delay_ns(&mut self, _ns: u32) {
        // Dry runs skip settle and dwell times
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("seeder_motion=info")),
        )
        .init();

    let mut args = env::args().skip(1);
    let recipe = match args.next() {
        Some(name) => Recipe::from_name(&name)?,
        None => Recipe::Seed12RowsNoDibble,
    };
    let overrides = match args.next().and_then(|rows| rows.parse().ok()) {
        Some(rows) => RunOverrides::rows(rows),
        None => RunOverrides::rows(3),
    };

    println!("=== Seeder Dry Run ===\n");
    println!("Recipe: {} ({})", recipe.index(), recipe.name());

    // Bench setup: every motor on one controller board
    let log = HardwareLog::new();
    let config = MachineConfig::default().with_peripheral_motors();
    let mut seeder = Seeder::new(
        config,
        Arc::new(RecordingGpio::new(log.clone())),
        Arc::new(RecordingPeripheral::new(log.clone())),
        InstantDelay,
    )?;

    let report = seeder.run_recipe(recipe, overrides)?;
    println!("Seeded {} rows in {:?}\n", report.rows, report.elapsed);

    println!("--- Run log ---");
    print!("{}", seeder.log_text());

    println!("\n--- Hardware summary ---");
    let events = log.events();
    let relay_writes = events
        .iter()
        .filter(|e| matches!(e, HardwareEvent::Write { .. }))
        .count();
    println!("Relay writes: {relay_writes}");
    for port in 0..4u8 {
        let steps = log.steps_on(port);
        let total: u32 = steps.iter().map(|(n, _, _)| n).sum();
        println!("Motor {}: {} moves, {} steps", port + 1, steps.len(), total);
    }

    Ok(())
}
