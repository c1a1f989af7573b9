//! Motor module for seeder-motion.
//!
//! Provides the Stepper Driver: step commands, the [`StepperBackend`]
//! interface and its two implementations (direct pulse train, delegated
//! peripheral), and the deadline pacing used for pulse timing.

mod backend;
mod builder;
mod command;
mod direct;
mod driver;
pub mod pacing;
mod peripheral;

pub use backend::StepperBackend;
pub use builder::DirectPulseDriverBuilder;
pub use command::{Direction, StepCommand, StepOutcome, StepStyle};
pub use direct::DirectPulseDriver;
pub use driver::StepperDriver;
pub use peripheral::PeripheralDriver;
