//! Configuration validation.

use crate::error::{ConfigError, Result};

use super::relay::RelayConfig;
use super::{BackendConfig, MachineConfig, MotorConfig};

/// Validate a machine configuration.
///
/// Checks:
/// - Motor ids are unique
/// - Steps per revolution and speeds are positive
/// - Relay channels are in 1..=8 and unique
/// - No output line is driven by two outputs (relay map is bijective)
/// - No peripheral port is shared by two motors
pub fn validate_config(config: &MachineConfig) -> Result<()> {
    let mut seen_motors = [false; 256];
    for motor in config.motors.iter() {
        let id = motor.id.value();
        if seen_motors[usize::from(id)] {
            return Err(ConfigError::DuplicateMotor(id).into());
        }
        seen_motors[usize::from(id)] = true;
        validate_motor(motor)?;
    }

    let mut seen_channels = [false; 256];
    for relay in config.relays.iter() {
        validate_relay(relay)?;
        if seen_channels[usize::from(relay.channel)] {
            return Err(ConfigError::DuplicateChannel(relay.channel).into());
        }
        seen_channels[usize::from(relay.channel)] = true;
    }

    let mut seen_lines = [false; 256];
    let lines = config
        .relays
        .iter()
        .map(|r| r.line)
        .chain(config.motors.iter().flat_map(MotorConfig::lines));
    for line in lines {
        if seen_lines[usize::from(line)] {
            return Err(ConfigError::DuplicateLine(line).into());
        }
        seen_lines[usize::from(line)] = true;
    }

    let mut seen_ports = [false; 256];
    for motor in config.motors.iter() {
        if let BackendConfig::Peripheral { port } = motor.backend {
            if seen_ports[usize::from(port)] {
                return Err(ConfigError::DuplicatePort(port).into());
            }
            seen_ports[usize::from(port)] = true;
        }
    }

    Ok(())
}

fn validate_motor(config: &MotorConfig) -> Result<()> {
    if config.steps_per_revolution == 0 {
        return Err(ConfigError::InvalidStepsPerRevolution(config.id.value()).into());
    }

    if config.speed.edge_interval(config.steps_per_revolution).is_none() {
        return Err(ConfigError::InvalidSpeed {
            motor: config.id.value(),
            speed: config.speed.value(),
        }
        .into());
    }

    Ok(())
}

fn validate_relay(config: &RelayConfig) -> Result<()> {
    if config.channel == 0 || config.channel > RelayConfig::MAX_CHANNEL {
        return Err(ConfigError::InvalidChannel(config.channel).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::units::{MotorId, Rpm};
    use crate::error::Error;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&MachineConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_speed() {
        let mut config = MachineConfig::default();
        config.motors[0].speed = Rpm(0.0);

        let result = validate_config(&config);
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidSpeed { motor: 1, .. }))
        ));
    }

    #[test]
    fn test_relay_line_shared_with_motor() {
        let mut config = MachineConfig::default();
        // Motor 1 step line
        config.relays[0].line = 26;

        assert_eq!(
            validate_config(&config),
            Err(Error::Config(ConfigError::DuplicateLine(26)))
        );
    }

    #[test]
    fn test_duplicate_motor_id() {
        let mut config = MachineConfig::default();
        config.motors[1].id = MotorId::new(1).unwrap();

        assert_eq!(
            validate_config(&config),
            Err(Error::Config(ConfigError::DuplicateMotor(1)))
        );
    }
}
