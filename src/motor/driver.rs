//! Stepper driver: one motor, whichever backend it was configured with.

use std::sync::Arc;

use embedded_hal::digital::PinState;

use crate::cancel::CancellationToken;
use crate::config::units::{MotorId, Rpm};
use crate::config::{BackendConfig, MotorConfig};
use crate::error::{MotorError, Result};
use crate::hal::{GpioBus, LinePin, StepperPeripheral};

use super::backend::StepperBackend;
use super::command::{StepCommand, StepOutcome};
use super::direct::DirectPulseDriver;
use super::peripheral::PeripheralDriver;

/// A configured stepper motor.
pub struct StepperDriver {
    backend: Box<dyn StepperBackend>,
}

impl StepperDriver {
    /// Wrap an already-built backend.
    pub fn new(backend: Box<dyn StepperBackend>) -> Self {
        Self { backend }
    }

    /// Build the backend selected by `config`.
    ///
    /// Direct-pulse motors get their DIR line configured at the clockwise
    /// level and their STEP line configured low.
    pub fn from_config(
        config: &MotorConfig,
        gpio: &Arc<dyn GpioBus>,
        peripheral: &Arc<dyn StepperPeripheral>,
    ) -> Result<Self> {
        let backend: Box<dyn StepperBackend> = match config.backend {
            BackendConfig::DirectPulse { step_line, dir_line } => {
                tracing::debug!(motor = %config.id, step_line, dir_line, "Defining direct-pulse motor");
                let pin_fault = |_| MotorError::PinFault(config.id);
                let dir_pin = LinePin::configure(gpio.clone(), dir_line, config.clockwise_level.pin_state())
                    .map_err(pin_fault)?;
                let step_pin =
                    LinePin::configure(gpio.clone(), step_line, PinState::Low).map_err(pin_fault)?;
                Box::new(
                    DirectPulseDriver::builder()
                        .step_pin(step_pin)
                        .dir_pin(dir_pin)
                        .from_motor_config(config)
                        .build()?,
                )
            }
            BackendConfig::Peripheral { port } => {
                tracing::debug!(
                    motor = %config.id,
                    port,
                    steps_per_revolution = config.steps_per_revolution,
                    "Defining peripheral motor"
                );
                Box::new(PeripheralDriver::new(config.id, port, peripheral.clone(), config.speed)?)
            }
        };
        Ok(Self::new(backend))
    }

    /// Motor id.
    #[inline]
    pub fn motor(&self) -> MotorId {
        self.backend.motor()
    }

    /// Current speed.
    #[inline]
    pub fn speed(&self) -> Rpm {
        self.backend.speed()
    }

    /// Backend name.
    #[inline]
    pub fn kind(&self) -> &'static str {
        self.backend.kind()
    }

    /// Replace the motor's current speed.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for a non-positive or non-finite speed.
    pub fn set_speed(&mut self, rpm: Rpm) -> Result<()> {
        if !rpm.is_valid() {
            return Err(MotorError::InvalidParameter(format!("invalid speed {rpm}")).into());
        }
        tracing::debug!(motor = %self.motor(), rpm = rpm.value(), "Setting motor speed");
        self.backend.set_speed(rpm)
    }

    /// Execute one step command to completion.
    ///
    /// A zero step count returns [`StepOutcome::NoOp`] without touching
    /// hardware or applying the speed override.
    ///
    /// # Errors
    ///
    /// `Cancelled` if the token is or becomes set, `InvalidParameter` for a
    /// bad speed, `PeripheralFault`/`PinFault` when the hardware call fails.
    pub fn run_stepper(&mut self, command: &StepCommand, token: &CancellationToken) -> Result<StepOutcome> {
        token.check()?;

        if command.is_noop() {
            tracing::warn!(motor = %command.motor, "run_stepper called with zero steps");
            return Ok(StepOutcome::NoOp);
        }

        if let Some(rpm) = command.speed {
            self.set_speed(rpm)?;
        }

        tracing::debug!(
            motor = %command.motor,
            backend = self.kind(),
            steps = command.steps,
            direction = %command.direction,
            style = %command.style,
            rpm = self.speed().value(),
            "Starting stepper"
        );

        self.backend
            .run(command.steps, command.direction, command.style, token)?;

        tracing::debug!(motor = %command.motor, "Finished stepper");
        Ok(StepOutcome::Completed {
            steps: command.steps,
        })
    }

    /// Release holding torque.
    pub fn release(&mut self) -> Result<()> {
        self.backend.release()
    }
}

impl core::fmt::Debug for StepperDriver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StepperDriver")
            .field("motor", &self.motor())
            .field("backend", &self.kind())
            .field("speed", &self.speed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::mock::{HardwareEvent, HardwareLog, RecordingGpio, RecordingPeripheral};

    fn hardware(log: &HardwareLog) -> (Arc<dyn GpioBus>, Arc<dyn StepperPeripheral>) {
        (
            Arc::new(RecordingGpio::new(log.clone())),
            Arc::new(RecordingPeripheral::new(log.clone())),
        )
    }

    #[test]
    fn test_zero_steps_touches_nothing() {
        let log = HardwareLog::new();
        let (gpio, peripheral) = hardware(&log);
        let config = MotorConfig::direct_pulse(MotorId::new(1).unwrap(), 26, 19);
        let mut driver = StepperDriver::from_config(&config, &gpio, &peripheral).unwrap();
        log.clear();

        let command = StepCommand::forward(config.id, 0).speed(90.0);
        let outcome = driver.run_stepper(&command, &CancellationToken::new()).unwrap();

        assert_eq!(outcome, StepOutcome::NoOp);
        assert!(log.is_empty());
        assert_eq!(driver.speed(), Rpm(25.0));
    }

    #[test]
    fn test_speed_override_sticks() {
        let log = HardwareLog::new();
        let (gpio, peripheral) = hardware(&log);
        let config = MotorConfig::peripheral(MotorId::new(4).unwrap(), 3);
        let mut driver = StepperDriver::from_config(&config, &gpio, &peripheral).unwrap();
        let token = CancellationToken::new();

        driver
            .run_stepper(&StepCommand::forward(config.id, 10).speed(180.0), &token)
            .unwrap();
        driver
            .run_stepper(&StepCommand::reverse(config.id, 5), &token)
            .unwrap();

        assert_eq!(driver.speed(), Rpm(180.0));
        let speeds: Vec<_> = log
            .events()
            .into_iter()
            .filter(|e| matches!(e, HardwareEvent::Speed { .. }))
            .collect();
        assert_eq!(
            speeds,
            vec![
                HardwareEvent::Speed { port: 3, rpm: Rpm(25.0) },
                HardwareEvent::Speed { port: 3, rpm: Rpm(180.0) },
            ]
        );
    }

    #[test]
    fn test_direct_pulse_initial_lines() {
        let log = HardwareLog::new();
        let (gpio, peripheral) = hardware(&log);
        let config = MotorConfig::direct_pulse(MotorId::new(3).unwrap(), 6, 13);
        let driver = StepperDriver::from_config(&config, &gpio, &peripheral).unwrap();

        assert_eq!(driver.kind(), "direct-pulse");
        assert_eq!(
            log.events(),
            vec![
                HardwareEvent::Configure { line: 13, level: PinState::High },
                HardwareEvent::Configure { line: 6, level: PinState::Low },
            ]
        );
    }

    #[test]
    fn test_unrepresentable_speed_override_is_rejected() {
        let log = HardwareLog::new();
        let (gpio, peripheral) = hardware(&log);
        let config = MotorConfig::direct_pulse(MotorId::new(1).unwrap(), 26, 19);
        let mut driver = StepperDriver::from_config(&config, &gpio, &peripheral).unwrap();
        log.clear();

        // Positive and finite, but one edge would outlast a Duration
        let command = StepCommand::forward(config.id, 1).speed(1e-25);
        let err = driver.run_stepper(&command, &CancellationToken::new()).unwrap_err();

        assert_eq!(err.kind(), crate::ErrorKind::InvalidParameter);
        assert!(log.is_empty());
        assert_eq!(driver.speed(), Rpm(25.0));
    }
}
