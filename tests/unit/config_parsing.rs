//! Unit tests for TOML configuration parsing.

use std::path::PathBuf;

use seeder_motion::config::{load_config, parse_config, BackendConfig, Level, MachineConfig, MotorId, Rpm};
use seeder_motion::error::{ConfigError, Error};

/// Test parsing a mixed-backend machine.
#[test]
fn test_parse_mixed_backends() {
    let toml_str = r#"
relay_active_level = "high"

[[motors]]
id = 1
speed_rpm = 60.0
backend = { kind = "direct_pulse", step_line = 26, dir_line = 19 }

[[motors]]
id = 4
steps_per_revolution = 400
clockwise_level = "low"
backend = { kind = "peripheral", port = 3 }

[[relays]]
channel = 1
line = 14

[[relays]]
channel = 2
line = 15
"#;

    let config = parse_config(toml_str).expect("Failed to parse TOML");

    let m1 = config.motor(MotorId::M1).expect("Motor 1 not found");
    assert_eq!(m1.speed, Rpm(60.0));
    assert_eq!(m1.steps_per_revolution, 200);
    assert_eq!(
        m1.backend,
        BackendConfig::DirectPulse {
            step_line: 26,
            dir_line: 19
        }
    );

    let m4 = config.motor(MotorId::M4).expect("Motor 4 not found");
    assert_eq!(m4.steps_per_revolution, 400);
    assert_eq!(m4.clockwise_level, Level::Low);
    assert_eq!(m4.speed, Rpm(25.0));
    assert_eq!(m4.backend, BackendConfig::Peripheral { port: 3 });

    assert!(config.motor(MotorId::M2).is_none());
    assert_eq!(config.relay_active_level, Level::High);
    assert_eq!(config.channels().collect::<Vec<_>>(), vec![1, 2]);
}

/// Test that omitted optional sections take their defaults.
#[test]
fn test_defaults_applied() {
    let toml_str = r#"
[[motors]]
id = 2
backend = { kind = "peripheral", port = 1 }

[[relays]]
channel = 8
line = 22
"#;

    let config = parse_config(toml_str).unwrap();
    assert_eq!(config.relay_active_level, Level::Low);
    assert!(config.log.path.is_none());
    assert!(config.log.echo);
}

/// Test the run log section.
#[test]
fn test_parse_log_section() {
    let toml_str = r#"
[[motors]]
id = 1
backend = { kind = "peripheral", port = 0 }

[[relays]]
channel = 1
line = 14

[log]
path = "/var/log/seeder/ProgramLog.txt"
echo = false
"#;

    let config = parse_config(toml_str).unwrap();
    assert_eq!(config.log.path, Some(PathBuf::from("/var/log/seeder/ProgramLog.txt")));
    assert!(!config.log.echo);
}

/// Test that a motor id outside 1..=4 is rejected while parsing.
#[test]
fn test_motor_id_out_of_range() {
    let toml_str = r#"
[[motors]]
id = 5
backend = { kind = "peripheral", port = 0 }

[[relays]]
channel = 1
line = 14
"#;

    let err = parse_config(toml_str).unwrap_err();
    assert!(matches!(err, Error::Config(ConfigError::ParseError(_))));
}

/// Test that an unknown backend kind is rejected.
#[test]
fn test_unknown_backend_kind() {
    let toml_str = r#"
[[motors]]
id = 1
backend = { kind = "servo", port = 0 }

[[relays]]
channel = 1
line = 14
"#;

    let err = parse_config(toml_str).unwrap_err();
    assert!(matches!(err, Error::Config(ConfigError::ParseError(_))));
}

/// Test that a missing file is an I/O error.
#[test]
fn test_load_missing_file() {
    let err = load_config("/nonexistent/seeder.toml").unwrap_err();
    assert!(matches!(err, Error::Config(ConfigError::IoError(_))));
}

/// Test that the shipped configuration describes the stock machine.
#[test]
fn test_shipped_config_matches_default() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/seeder.toml");
    let config = load_config(path).expect("shipped config should load");
    let stock = MachineConfig::default();

    assert_eq!(config.motors, stock.motors);
    assert_eq!(config.relays, stock.relays);
    assert_eq!(config.relay_active_level, stock.relay_active_level);
}
