//! Machine configuration - root configuration structure.

use std::path::PathBuf;

use heapless::Vec;
use serde::Deserialize;

use super::motor::MotorConfig;
use super::relay::RelayConfig;
use super::units::{Level, MotorId};

/// Root configuration structure from TOML.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MachineConfig {
    /// Stepper motors, one entry per motor id.
    pub motors: Vec<MotorConfig, 4>,

    /// Relay channel to output line map.
    pub relays: Vec<RelayConfig, 8>,

    /// Line level that energizes (closes) a relay.
    #[serde(default)]
    pub relay_active_level: Level,

    /// Run log settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// Run log settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogConfig {
    /// Append-only log file. `None` keeps the log in memory only.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Emit operator-facing lines at info level (others go to debug).
    #[serde(default = "default_echo")]
    pub echo: bool,
}

fn default_echo() -> bool {
    true
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: None,
            echo: default_echo(),
        }
    }
}

/// Relay lines of the stock seeder board, indexed by channel - 1.
const RELAY_LINES: [u8; 8] = [14, 15, 18, 23, 24, 17, 27, 22];

/// Step and direction lines of the stock motors, indexed by motor id - 1.
const STEP_LINES: [u8; 4] = [26, 21, 6, 25];
const DIR_LINES: [u8; 4] = [19, 20, 13, 8];

impl MachineConfig {
    /// Get a motor configuration by id.
    pub fn motor(&self, id: MotorId) -> Option<&MotorConfig> {
        self.motors.iter().find(|m| m.id == id)
    }

    /// Get the output line of a relay channel.
    pub fn relay_line(&self, channel: u8) -> Option<u8> {
        self.relays
            .iter()
            .find(|r| r.channel == channel)
            .map(|r| r.line)
    }

    /// List all configured relay channels.
    pub fn channels(&self) -> impl Iterator<Item = u8> + '_ {
        self.relays.iter().map(|r| r.channel)
    }

    /// Replace every motor with a peripheral-backed motor on port `id - 1`.
    ///
    /// Useful for bench setups where all motors hang off one controller board.
    pub fn with_peripheral_motors(mut self) -> Self {
        for motor in self.motors.iter_mut() {
            let speed = motor.speed;
            *motor = MotorConfig::peripheral(motor.id, motor.id.value() - 1);
            motor.speed = speed;
        }
        self
    }
}

impl Default for MachineConfig {
    /// The stock seeder: four direct-pulse motors and an active-low
    /// eight-channel relay board.
    fn default() -> Self {
        let mut motors = Vec::new();
        for (id, (step_line, dir_line)) in MotorId::all().zip(STEP_LINES.into_iter().zip(DIR_LINES)) {
            let _ = motors.push(MotorConfig::direct_pulse(id, step_line, dir_line));
        }

        let mut relays = Vec::new();
        for (channel, line) in (1..=RelayConfig::MAX_CHANNEL).zip(RELAY_LINES) {
            let _ = relays.push(RelayConfig::new(channel, line));
        }

        Self {
            motors,
            relays,
            relay_active_level: Level::Low,
            log: LogConfig::default(),
        }
    }
}
