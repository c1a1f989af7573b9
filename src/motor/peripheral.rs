//! Peripheral-delegated stepper backend.

use std::sync::Arc;

use crate::cancel::CancellationToken;
use crate::config::units::{MotorId, Rpm};
use crate::error::{MotorError, Result};
use crate::hal::{HalError, StepperPeripheral};

use super::backend::StepperBackend;
use super::command::{Direction, StepStyle};

/// Stepper whose timing is owned by a stepper-controller peripheral.
///
/// A move is a single `step` call with the full count; cancellation is
/// only observed before the call.
pub struct PeripheralDriver {
    motor: MotorId,
    port: u8,
    peripheral: Arc<dyn StepperPeripheral>,
    speed: Rpm,
}

impl PeripheralDriver {
    /// Bind `motor` to `port` and push the initial speed to the peripheral.
    pub fn new(
        motor: MotorId,
        port: u8,
        peripheral: Arc<dyn StepperPeripheral>,
        speed: Rpm,
    ) -> Result<Self> {
        let driver = Self {
            motor,
            port,
            peripheral,
            speed,
        };
        driver
            .peripheral
            .set_speed(port, speed)
            .map_err(|e| driver.fault(e))?;
        Ok(driver)
    }

    fn fault(&self, error: HalError) -> MotorError {
        MotorError::PeripheralFault {
            motor: self.motor,
            reason: error.0,
        }
    }
}

impl StepperBackend for PeripheralDriver {
    fn motor(&self) -> MotorId {
        self.motor
    }

    fn kind(&self) -> &'static str {
        "peripheral"
    }

    fn speed(&self) -> Rpm {
        self.speed
    }

    fn set_speed(&mut self, rpm: Rpm) -> Result<()> {
        self.peripheral
            .set_speed(self.port, rpm)
            .map_err(|e| self.fault(e))?;
        self.speed = rpm;
        Ok(())
    }

    fn run(
        &mut self,
        steps: u32,
        direction: Direction,
        style: StepStyle,
        token: &CancellationToken,
    ) -> Result<()> {
        token.check()?;
        self.peripheral
            .step(self.port, steps, direction, style)
            .map_err(|e| self.fault(e))?;
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        self.peripheral
            .release(self.port)
            .map_err(|e| self.fault(e))?;
        Ok(())
    }
}
