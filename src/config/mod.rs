//! Configuration module for seeder-motion.
//!
//! Provides the static machine description: which backend drives each
//! motor, which output line each relay channel maps to, and where the run
//! log goes. Loaded from TOML or built from [`MachineConfig::default`].

mod loader;
mod machine;
mod motor;
mod relay;
pub mod units;
mod validation;

pub use loader::{load_config, parse_config};
pub use machine::{LogConfig, MachineConfig};
pub use motor::{BackendConfig, MotorConfig};
pub use relay::RelayConfig;
pub use validation::validate_config;

// Re-export unit types at config level
pub use units::{Level, MotorId, Rpm};
