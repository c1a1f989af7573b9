//! Downward hardware interfaces.
//!
//! The controller consumes two collaborators:
//!
//! - [`GpioBus`]: numbered output lines (relays, direct-pulse step/dir lines)
//! - [`StepperPeripheral`]: a stepper-controller board that times its own pulses
//!
//! [`LinePin`] adapts one bus line to embedded-hal's `OutputPin` so drivers
//! stay generic over pin types. [`mock`] provides recording doubles.

pub mod mock;

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorType, OutputPin, PinState};

use crate::config::units::Rpm;
use crate::motor::{Direction, StepStyle};

/// Failure reported by a hardware collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HalError(pub String);

impl HalError {
    /// Create an error from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl fmt::Display for HalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for HalError {}

impl digital::Error for HalError {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

/// GPIO-like output line interface.
///
/// Lines are identified by number (BCM numbering on the stock board).
/// Implementations are shared between the control thread and motion
/// threads, so methods take `&self`.
pub trait GpioBus: Send + Sync {
    /// Configure a line as an output and drive it to `initial`.
    fn configure_output(&self, line: u8, initial: PinState) -> Result<(), HalError>;

    /// Drive a configured output line.
    fn write(&self, line: u8, level: PinState) -> Result<(), HalError>;
}

/// Stepper-controller peripheral interface.
///
/// The peripheral generates its own step timing; `step` blocks until the
/// requested number of steps has been issued.
pub trait StepperPeripheral: Send + Sync {
    /// Set the speed used by subsequent `step` calls on `port`.
    fn set_speed(&self, port: u8, rpm: Rpm) -> Result<(), HalError>;

    /// Move the motor on `port` by `steps`.
    fn step(&self, port: u8, steps: u32, direction: Direction, style: StepStyle)
        -> Result<(), HalError>;

    /// Release holding torque on `port`.
    fn release(&self, port: u8) -> Result<(), HalError>;
}

/// One line of a [`GpioBus`] as an embedded-hal output pin.
#[derive(Clone)]
pub struct LinePin {
    bus: Arc<dyn GpioBus>,
    line: u8,
}

impl LinePin {
    /// Configure `line` as an output at `initial` and wrap it.
    pub fn configure(bus: Arc<dyn GpioBus>, line: u8, initial: PinState) -> Result<Self, HalError> {
        bus.configure_output(line, initial)?;
        Ok(Self { bus, line })
    }

    /// The physical line number.
    #[inline]
    pub fn line(&self) -> u8 {
        self.line
    }
}

impl fmt::Debug for LinePin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinePin").field("line", &self.line).finish()
    }
}

impl ErrorType for LinePin {
    type Error = HalError;
}

impl OutputPin for LinePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.bus.write(self.line, PinState::Low)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.bus.write(self.line, PinState::High)
    }
}

/// Stand-in for a missing stepper-controller board.
///
/// Accepts every call and does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPeripheral;

impl StepperPeripheral for NullPeripheral {
    fn set_speed(&self, _port: u8, _rpm: Rpm) -> Result<(), HalError> {
        Ok(())
    }

    fn step(&self, _port: u8, _steps: u32, _direction: Direction, _style: StepStyle) -> Result<(), HalError> {
        Ok(())
    }

    fn release(&self, _port: u8) -> Result<(), HalError> {
        Ok(())
    }
}

/// Delay provider backed by `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}
