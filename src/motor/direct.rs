//! Direct-pulse stepper backend.
//!
//! Generic over embedded-hal 1.0 pin types. Drives a STEP/DIR style driver
//! board: the DIR line is set once per move, then every step is a full
//! high/low cycle on the STEP line with each edge held for
//! `30 / (steps_per_rev * rpm)` seconds.

use std::time::Duration;

use embedded_hal::digital::{OutputPin, PinState};

use crate::cancel::CancellationToken;
use crate::config::units::{Level, MotorId, Rpm};
use crate::error::{MotorError, Result};

use super::backend::StepperBackend;
use super::builder::DirectPulseDriverBuilder;
use super::command::{Direction, StepStyle};
use super::pacing::EdgeClock;

/// Stepper driven by pulsing a STEP line.
///
/// Generic over:
/// - `STEP`: STEP pin type (must implement `OutputPin`)
/// - `DIR`: DIR pin type (must implement `OutputPin`)
#[derive(Debug)]
pub struct DirectPulseDriver<STEP, DIR>
where
    STEP: OutputPin,
    DIR: OutputPin,
{
    /// Motor this driver belongs to.
    motor: MotorId,

    /// STEP pin (one high/low cycle per step).
    step_pin: STEP,

    /// DIR pin.
    dir_pin: DIR,

    /// Full steps per revolution.
    steps_per_revolution: u16,

    /// Current speed.
    speed: Rpm,

    /// DIR level meaning clockwise.
    clockwise_level: Level,
}

impl<STEP, DIR> DirectPulseDriver<STEP, DIR>
where
    STEP: OutputPin,
    DIR: OutputPin,
{
    /// Start building a driver.
    pub fn builder() -> DirectPulseDriverBuilder<STEP, DIR> {
        DirectPulseDriverBuilder::new()
    }

    pub(crate) fn new(
        motor: MotorId,
        step_pin: STEP,
        dir_pin: DIR,
        steps_per_revolution: u16,
        speed: Rpm,
        clockwise_level: Level,
    ) -> Self {
        Self {
            motor,
            step_pin,
            dir_pin,
            steps_per_revolution,
            speed,
            clockwise_level,
        }
    }

    /// Get the steps per revolution.
    #[inline]
    pub fn steps_per_revolution(&self) -> u16 {
        self.steps_per_revolution
    }

    /// DIR level for a direction.
    fn dir_level(&self, direction: Direction) -> PinState {
        match direction {
            Direction::Forward => self.clockwise_level.pin_state(),
            Direction::Reverse => self.clockwise_level.inverse().pin_state(),
        }
    }

    fn pin_fault(&self) -> MotorError {
        MotorError::PinFault(self.motor)
    }

    fn edge_interval(&self, rpm: Rpm) -> Result<Duration> {
        rpm.edge_interval(self.steps_per_revolution).ok_or_else(|| {
            MotorError::InvalidParameter(format!("speed {rpm} out of range for motor {}", self.motor))
                .into()
        })
    }
}

impl<STEP, DIR> StepperBackend for DirectPulseDriver<STEP, DIR>
where
    STEP: OutputPin + Send,
    DIR: OutputPin + Send,
{
    fn motor(&self) -> MotorId {
        self.motor
    }

    fn kind(&self) -> &'static str {
        "direct-pulse"
    }

    fn speed(&self) -> Rpm {
        self.speed
    }

    fn set_speed(&mut self, rpm: Rpm) -> Result<()> {
        self.edge_interval(rpm)?;
        self.speed = rpm;
        Ok(())
    }

    fn run(
        &mut self,
        steps: u32,
        direction: Direction,
        _style: StepStyle,
        token: &CancellationToken,
    ) -> Result<()> {
        let interval = self.edge_interval(self.speed)?;
        let level = self.dir_level(direction);
        self.dir_pin
            .set_state(level)
            .map_err(|_| self.pin_fault())?;

        let mut clock = EdgeClock::start(interval);
        for _ in 0..steps {
            token.check()?;

            self.step_pin.set_high().map_err(|_| self.pin_fault())?;
            clock.wait_next_edge();

            self.step_pin.set_low().map_err(|_| self.pin_fault())?;
            clock.wait_next_edge();
        }

        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        // No enable line on the direct-pulse driver board
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction};

    fn motor() -> MotorId {
        MotorId::new(1).unwrap()
    }

    #[test]
    fn test_forward_pulses() {
        let step_expectations = [
            Transaction::set(State::High),
            Transaction::set(State::Low),
            Transaction::set(State::High),
            Transaction::set(State::Low),
        ];
        let dir_expectations = [Transaction::set(State::High)];
        let mut step = PinMock::new(&step_expectations);
        let mut dir = PinMock::new(&dir_expectations);

        let mut driver =
            DirectPulseDriver::new(motor(), step.clone(), dir.clone(), 200, Rpm(3000.0), Level::High);
        driver
            .run(2, Direction::Forward, StepStyle::Double, &CancellationToken::new())
            .unwrap();

        step.done();
        dir.done();
    }

    #[test]
    fn test_reverse_uses_inverse_level() {
        let step_expectations = [Transaction::set(State::High), Transaction::set(State::Low)];
        let dir_expectations = [Transaction::set(State::High)];
        let mut step = PinMock::new(&step_expectations);
        let mut dir = PinMock::new(&dir_expectations);

        // Clockwise is low on this motor, so reverse drives high
        let mut driver =
            DirectPulseDriver::new(motor(), step.clone(), dir.clone(), 200, Rpm(3000.0), Level::Low);
        driver
            .run(1, Direction::Reverse, StepStyle::Single, &CancellationToken::new())
            .unwrap();

        step.done();
        dir.done();
    }

    #[test]
    fn test_cancelled_before_first_step() {
        let dir_expectations = [Transaction::set(State::High)];
        let mut step = PinMock::new(&[]);
        let mut dir = PinMock::new(&dir_expectations);

        let token = CancellationToken::new();
        token.cancel();

        let mut driver =
            DirectPulseDriver::new(motor(), step.clone(), dir.clone(), 200, Rpm(3000.0), Level::High);
        let result = driver.run(5, Direction::Forward, StepStyle::Double, &token);
        assert_eq!(result, Err(crate::Error::Cancelled));

        step.done();
        dir.done();
    }

    #[test]
    fn test_speed_too_slow_to_pace_rejected() {
        let mut step = PinMock::new(&[]);
        let mut dir = PinMock::new(&[]);

        let mut driver =
            DirectPulseDriver::new(motor(), step.clone(), dir.clone(), 200, Rpm(25.0), Level::High);
        let err = driver.set_speed(Rpm(1e-25)).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidParameter);
        assert_eq!(driver.speed(), Rpm(25.0));

        step.done();
        dir.done();
    }

    #[test]
    fn test_run_at_unrepresentable_speed_touches_no_pins() {
        let mut step = PinMock::new(&[]);
        let mut dir = PinMock::new(&[]);

        let mut driver =
            DirectPulseDriver::new(motor(), step.clone(), dir.clone(), 200, Rpm(1e-25), Level::High);
        let err = driver
            .run(1, Direction::Forward, StepStyle::Double, &CancellationToken::new())
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidParameter);

        step.done();
        dir.done();
    }
}
