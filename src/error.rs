//! Error types for seeder-motion.
//!
//! Provides unified error handling across configuration, relays, stepper
//! motion and recipe execution. Every error classifies into one
//! [`ErrorKind`] so callers can tell an operator stop from a hardware fault.

use thiserror::Error;

use crate::config::units::MotorId;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all seeder-motion operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The cancellation token was set (operator stop).
    #[error("Operation cancelled by stop request")]
    Cancelled,
    /// Configuration parsing or validation error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Relay bank error
    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),
    /// Stepper motor or motion coordination error
    #[error("Motor error: {0}")]
    Motor(#[from] MotorError),
    /// Recipe lookup or execution error
    #[error("Recipe error: {0}")]
    Recipe(#[from] RecipeError),
}

/// Coarse error classes used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operator stop.
    Cancelled,
    /// Bad direction, style, mode, channel or recipe selection.
    InvalidParameter,
    /// A motor already has an active motion task.
    MotorBusy,
    /// An underlying hardware call failed.
    PeripheralFault,
    /// Unmapped motor or relay id, or invalid machine configuration.
    ConfigurationError,
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    #[error("Parse error: {0}")]
    ParseError(String),
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(String),
    /// Motor id outside 1..=4
    #[error("Invalid motor id {0}. Must be 1-4")]
    InvalidMotorId(u8),
    /// Relay channel outside 1..=8
    #[error("Invalid relay channel {0}. Must be 1-8")]
    InvalidChannel(u8),
    /// Motor id configured twice
    #[error("Duplicate motor id: {0}")]
    DuplicateMotor(u8),
    /// Relay channel configured twice
    #[error("Duplicate relay channel: {0}")]
    DuplicateChannel(u8),
    /// Physical line claimed by two outputs
    #[error("Output line {0} is assigned more than once")]
    DuplicateLine(u8),
    /// Peripheral motor port claimed by two motors
    #[error("Peripheral port {0} is assigned more than once")]
    DuplicatePort(u8),
    /// Steps per revolution must be positive
    #[error("Invalid steps per revolution for motor {0}. Must be > 0")]
    InvalidStepsPerRevolution(u8),
    /// Speed must be finite and positive
    #[error("Invalid speed {speed} RPM for motor {motor}. Must be > 0")]
    InvalidSpeed {
        /// Motor id
        motor: u8,
        /// Configured speed
        speed: f32,
    },
}

/// Relay bank errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RelayError {
    /// Channel is not in the relay map
    #[error("Unknown relay channel: {0}")]
    UnknownChannel(u8),
    /// Mode string did not parse as open/close
    #[error("Unknown relay mode: '{0}'")]
    InvalidMode(String),
    /// Driving the output line failed
    #[error("Output line {line} for relay {channel} failed")]
    LineFault {
        /// Logical channel
        channel: u8,
        /// Physical line
        line: u8,
    },
}

/// Stepper motor and motion coordination errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MotorError {
    /// Unrecognized direction, style or speed
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// Motor id is not configured
    #[error("Motor {0} is not configured")]
    UnknownMotor(u8),
    /// Motor already has an active motion task
    #[error("Motor {0} is busy with another motion task")]
    Busy(MotorId),
    /// Stepper peripheral call failed
    #[error("Peripheral fault on motor {motor}: {reason}")]
    PeripheralFault {
        /// Motor id
        motor: MotorId,
        /// Description from the peripheral
        reason: String,
    },
    /// Pulse or direction line write failed
    #[error("Pin operation failed on motor {0}")]
    PinFault(MotorId),
    /// Motion thread could not be started
    #[error("Failed to start motion task for motor {motor}: {reason}")]
    SpawnFailed {
        /// Motor id
        motor: MotorId,
        /// OS error text
        reason: String,
    },
    /// Motion thread panicked before reporting completion
    #[error("Motion task for motor {0} panicked")]
    TaskPanicked(MotorId),
}

/// Recipe-related errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecipeError {
    /// No recipe with this index or name
    #[error("Unknown recipe: '{0}'. Valid recipes are 1-5")]
    UnknownRecipe(String),
    /// Row count must be at least one
    #[error("Recipe '{0}' has no rows to seed")]
    NoRows(String),
}

impl Error {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Cancelled => ErrorKind::Cancelled,
            Error::Config(_) => ErrorKind::ConfigurationError,
            Error::Relay(e) => match e {
                RelayError::UnknownChannel(_) | RelayError::InvalidMode(_) => {
                    ErrorKind::InvalidParameter
                }
                RelayError::LineFault { .. } => ErrorKind::PeripheralFault,
            },
            Error::Motor(e) => match e {
                MotorError::InvalidParameter(_) => ErrorKind::InvalidParameter,
                MotorError::UnknownMotor(_) => ErrorKind::ConfigurationError,
                MotorError::Busy(_) => ErrorKind::MotorBusy,
                MotorError::PeripheralFault { .. }
                | MotorError::PinFault(_)
                | MotorError::SpawnFailed { .. }
                | MotorError::TaskPanicked(_) => ErrorKind::PeripheralFault,
            },
            Error::Recipe(_) => ErrorKind::InvalidParameter,
        }
    }

    /// Check whether this error is an operator stop.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}
