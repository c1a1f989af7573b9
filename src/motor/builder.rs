//! Builder pattern for DirectPulseDriver.

use embedded_hal::digital::OutputPin;

use crate::config::units::{Level, MotorId, Rpm};
use crate::config::MotorConfig;
use crate::error::{MotorError, Result};

use super::direct::DirectPulseDriver;

/// Builder for creating DirectPulseDriver instances.
pub struct DirectPulseDriverBuilder<STEP, DIR>
where
    STEP: OutputPin,
    DIR: OutputPin,
{
    motor: Option<MotorId>,
    step_pin: Option<STEP>,
    dir_pin: Option<DIR>,
    steps_per_revolution: u16,
    speed: Rpm,
    clockwise_level: Level,
}

impl<STEP, DIR> Default for DirectPulseDriverBuilder<STEP, DIR>
where
    STEP: OutputPin,
    DIR: OutputPin,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<STEP, DIR> DirectPulseDriverBuilder<STEP, DIR>
where
    STEP: OutputPin,
    DIR: OutputPin,
{
    /// Create a new builder with stock motor defaults (200 steps/rev, 25 RPM).
    pub fn new() -> Self {
        Self {
            motor: None,
            step_pin: None,
            dir_pin: None,
            steps_per_revolution: 200,
            speed: Rpm(25.0),
            clockwise_level: Level::High,
        }
    }

    /// Set the motor id.
    pub fn motor(mut self, id: MotorId) -> Self {
        self.motor = Some(id);
        self
    }

    /// Set the STEP pin.
    pub fn step_pin(mut self, pin: STEP) -> Self {
        self.step_pin = Some(pin);
        self
    }

    /// Set the DIR pin.
    pub fn dir_pin(mut self, pin: DIR) -> Self {
        self.dir_pin = Some(pin);
        self
    }

    /// Set steps per revolution.
    pub fn steps_per_revolution(mut self, steps: u16) -> Self {
        self.steps_per_revolution = steps;
        self
    }

    /// Set the initial speed.
    pub fn speed(mut self, speed: Rpm) -> Self {
        self.speed = speed;
        self
    }

    /// Set the DIR level that means clockwise.
    pub fn clockwise_level(mut self, level: Level) -> Self {
        self.clockwise_level = level;
        self
    }

    /// Configure from a MotorConfig.
    pub fn from_motor_config(mut self, config: &MotorConfig) -> Self {
        self.motor = Some(config.id);
        self.steps_per_revolution = config.steps_per_revolution;
        self.speed = config.speed;
        self.clockwise_level = config.clockwise_level;
        self
    }

    /// Build the DirectPulseDriver.
    ///
    /// # Errors
    ///
    /// Returns an error if a required field is missing or a value is out of range.
    pub fn build(self) -> Result<DirectPulseDriver<STEP, DIR>> {
        let motor = self
            .motor
            .ok_or_else(|| MotorError::InvalidParameter("motor id is required".into()))?;

        let step_pin = self
            .step_pin
            .ok_or_else(|| MotorError::InvalidParameter("step_pin is required".into()))?;

        let dir_pin = self
            .dir_pin
            .ok_or_else(|| MotorError::InvalidParameter("dir_pin is required".into()))?;

        if self.steps_per_revolution == 0 {
            return Err(MotorError::InvalidParameter("steps_per_revolution must be > 0".into()).into());
        }

        if self.speed.edge_interval(self.steps_per_revolution).is_none() {
            return Err(MotorError::InvalidParameter(format!("invalid speed {}", self.speed)).into());
        }

        Ok(DirectPulseDriver::new(
            motor,
            step_pin,
            dir_pin,
            self.steps_per_revolution,
            self.speed,
            self.clockwise_level,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motor::StepperBackend;
    use embedded_hal_mock::eh1::digital::Mock as PinMock;

    #[test]
    fn test_missing_pin_is_rejected() {
        let mut step = PinMock::new(&[]);
        let result = DirectPulseDriverBuilder::<PinMock, PinMock>::new()
            .motor(MotorId::new(1).unwrap())
            .step_pin(step.clone())
            .build();
        assert!(result.is_err());

        step.done();
    }

    #[test]
    fn test_speed_without_edge_interval_is_rejected() {
        let mut step = PinMock::new(&[]);
        let mut dir = PinMock::new(&[]);
        let result = DirectPulseDriverBuilder::new()
            .motor(MotorId::new(1).unwrap())
            .step_pin(step.clone())
            .dir_pin(dir.clone())
            .speed(Rpm(1e-25))
            .build();

        let err = result.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidParameter);

        step.done();
        dir.done();
    }

    #[test]
    fn test_from_motor_config() {
        let mut config = MotorConfig::direct_pulse(MotorId::new(2).unwrap(), 21, 20);
        config.speed = Rpm(70.0);

        let mut step = PinMock::new(&[]);
        let mut dir = PinMock::new(&[]);
        let driver = DirectPulseDriver::builder()
            .step_pin(step.clone())
            .dir_pin(dir.clone())
            .from_motor_config(&config)
            .build()
            .unwrap();

        assert_eq!(driver.motor().value(), 2);
        assert_eq!(driver.speed(), Rpm(70.0));
        assert_eq!(driver.steps_per_revolution(), 200);

        step.done();
        dir.done();
    }
}
