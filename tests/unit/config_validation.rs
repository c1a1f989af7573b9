//! Unit tests for configuration validation.

use seeder_motion::config::{
    validate_config, BackendConfig, MachineConfig, MotorConfig, MotorId, RelayConfig, Rpm,
};
use seeder_motion::error::{ConfigError, Error, ErrorKind};

/// Test that the stock machine validates.
#[test]
fn test_stock_machine_valid() {
    assert!(validate_config(&MachineConfig::default()).is_ok());
    assert!(validate_config(&MachineConfig::default().with_peripheral_motors()).is_ok());
}

/// Test that a motor id may appear only once.
#[test]
fn test_duplicate_motor_rejected() {
    let mut config = MachineConfig::default().with_peripheral_motors();
    config.motors[3] = MotorConfig::peripheral(MotorId::M2, 3);

    let err = validate_config(&config).unwrap_err();
    assert_eq!(err, Error::Config(ConfigError::DuplicateMotor(2)));
    assert_eq!(err.kind(), ErrorKind::ConfigurationError);
}

/// Test that relay channels stay within the eight-channel board.
#[test]
fn test_channel_out_of_range_rejected() {
    let mut config = MachineConfig::default();
    config.relays[7] = RelayConfig::new(9, 22);

    let err = validate_config(&config).unwrap_err();
    assert_eq!(err, Error::Config(ConfigError::InvalidChannel(9)));
}

/// Test that channel 0 is rejected.
#[test]
fn test_channel_zero_rejected() {
    let mut config = MachineConfig::default();
    config.relays[0] = RelayConfig::new(0, 14);

    assert_eq!(
        validate_config(&config),
        Err(Error::Config(ConfigError::InvalidChannel(0)))
    );
}

/// Test that two relays cannot share one output line.
#[test]
fn test_relay_line_shared_rejected() {
    let mut config = MachineConfig::default();
    config.relays[1] = RelayConfig::new(2, 14);

    assert_eq!(
        validate_config(&config),
        Err(Error::Config(ConfigError::DuplicateLine(14)))
    );
}

/// Test that a relay cannot reuse a motor's step line.
#[test]
fn test_relay_on_motor_line_rejected() {
    let mut config = MachineConfig::default();
    // Line 26 is motor 1's step line
    config.relays[0] = RelayConfig::new(1, 26);

    assert_eq!(
        validate_config(&config),
        Err(Error::Config(ConfigError::DuplicateLine(26)))
    );
}

/// Test that speeds must be positive.
#[test]
fn test_zero_speed_rejected() {
    let mut config = MachineConfig::default();
    config.motors[2].speed = Rpm(0.0);

    assert_eq!(
        validate_config(&config),
        Err(Error::Config(ConfigError::InvalidSpeed { motor: 3, speed: 0.0 }))
    );
}

/// Test that steps per revolution must be positive.
#[test]
fn test_zero_steps_per_revolution_rejected() {
    let mut config = MachineConfig::default();
    config.motors[0].steps_per_revolution = 0;

    assert_eq!(
        validate_config(&config),
        Err(Error::Config(ConfigError::InvalidStepsPerRevolution(1)))
    );
}

/// Test that a speed too slow to pace is rejected at load time.
#[test]
fn test_speed_too_slow_to_pace_rejected() {
    let mut config = MachineConfig::default();
    config.motors[0].speed = Rpm(1e-25);

    assert_eq!(
        validate_config(&config),
        Err(Error::Config(ConfigError::InvalidSpeed { motor: 1, speed: 1e-25 }))
    );
}

/// Test that two motors cannot share a peripheral port.
#[test]
fn test_shared_peripheral_port_rejected() {
    let mut config = MachineConfig::default().with_peripheral_motors();
    config.motors[1].backend = BackendConfig::Peripheral { port: 0 };

    let err = validate_config(&config).unwrap_err();
    assert_eq!(err, Error::Config(ConfigError::DuplicatePort(0)));
    assert_eq!(err.kind(), ErrorKind::ConfigurationError);
}
