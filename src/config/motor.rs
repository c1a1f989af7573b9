//! Motor configuration from TOML.

use serde::Deserialize;

use super::units::{Level, MotorId, Rpm};

/// How a stepper motor is commanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// Pulse train generated directly on two output lines.
    DirectPulse {
        /// Line pulsed once per step.
        step_line: u8,
        /// Line selecting rotation direction.
        dir_line: u8,
    },
    /// Stepping delegated to a stepper-controller peripheral.
    Peripheral {
        /// Motor port on the peripheral.
        port: u8,
    },
}

impl BackendConfig {
    /// Short backend name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            BackendConfig::DirectPulse { .. } => "direct-pulse",
            BackendConfig::Peripheral { .. } => "peripheral",
        }
    }
}

/// Complete motor configuration from TOML.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MotorConfig {
    /// Motor identifier (1..=4).
    pub id: MotorId,

    /// Full steps per motor revolution (typically 200 for 1.8° motors).
    #[serde(default = "default_steps_per_revolution")]
    pub steps_per_revolution: u16,

    /// Speed used when a command does not override it.
    #[serde(rename = "speed_rpm", default = "default_speed")]
    pub speed: Rpm,

    /// Direction line level that means clockwise (forward).
    #[serde(default = "default_clockwise_level")]
    pub clockwise_level: Level,

    /// Control backend, fixed for the process lifetime.
    pub backend: BackendConfig,
}

fn default_steps_per_revolution() -> u16 {
    200
}

fn default_speed() -> Rpm {
    Rpm(25.0)
}

fn default_clockwise_level() -> Level {
    Level::High
}

impl MotorConfig {
    /// A direct-pulse motor with the stock 200 steps/rev and 25 RPM.
    pub fn direct_pulse(id: MotorId, step_line: u8, dir_line: u8) -> Self {
        Self {
            id,
            steps_per_revolution: default_steps_per_revolution(),
            speed: default_speed(),
            clockwise_level: default_clockwise_level(),
            backend: BackendConfig::DirectPulse { step_line, dir_line },
        }
    }

    /// A peripheral-delegated motor with the stock 200 steps/rev and 25 RPM.
    pub fn peripheral(id: MotorId, port: u8) -> Self {
        Self {
            id,
            steps_per_revolution: default_steps_per_revolution(),
            speed: default_speed(),
            clockwise_level: default_clockwise_level(),
            backend: BackendConfig::Peripheral { port },
        }
    }

    /// Output lines owned by this motor (empty for peripheral backends).
    pub fn lines(&self) -> impl Iterator<Item = u8> {
        let lines = match self.backend {
            BackendConfig::DirectPulse { step_line, dir_line } => [Some(step_line), Some(dir_line)],
            BackendConfig::Peripheral { .. } => [None, None],
        };
        lines.into_iter().flatten()
    }
}
