//! # seeder-motion
//!
//! Motion sequencer for a tray seeding machine with four stepper motors and
//! an eight-channel relay board.
//!
//! ## Features
//!
//! - **Configuration-driven**: Describe motors, relay lines and the run log in TOML
//! - **embedded-hal 1.0**: Direct-pulse drivers are generic over `OutputPin`, pauses use `DelayNs`
//! - **Two stepper backends**: Pulse STEP/DIR lines directly, or delegate to a stepper-controller board
//! - **Drift-free pulse timing**: Every edge waits for an absolute deadline
//! - **Concurrent motion**: One thread per moving motor, joined before the next phase
//! - **Cooperative stop**: A shared token polled once per step and before every command
//! - **Five stock recipes**: One shared phase sequence driven by per-recipe tables
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use seeder_motion::{load_config, Recipe, RunOverrides, Seeder};
//!
//! let config = load_config("config/seeder.toml")?;
//! let mut seeder = Seeder::with_std_delay(config, gpio, Arc::new(NullPeripheral))?;
//!
//! // Hand the stop button a handle
//! let stop = seeder.stop_handle();
//!
//! let report = seeder.run_recipe(Recipe::DibbleSeed12Rows, RunOverrides::default())?;
//! println!("{} rows in {:?}", report.rows, report.elapsed);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

// Core modules
pub mod cancel;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod hal;
pub mod journal;
pub mod machine;
pub mod motor;
pub mod recipe;
pub mod relay;

// Re-exports for ergonomic API
pub use cancel::{CancellationToken, StopHandle};
pub use config::{load_config, parse_config, validate_config, MachineConfig, MotorConfig};
pub use coordinator::{MotionCoordinator, MotionTask, TaskHandle};
pub use error::{Error, ErrorKind, Result};
pub use journal::Journal;
pub use machine::{Controller, Seeder};
pub use motor::{Direction, StepCommand, StepOutcome, StepStyle, StepperDriver};
pub use recipe::{Recipe, RecipeEngine, RecipeTable, RunOverrides, RunReport, RunState, SeederOps};
pub use relay::{RelayBank, RelayMode};

// Unit types
pub use config::units::{Level, MotorId, Rpm};
