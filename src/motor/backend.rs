//! Stepper backend interface.

use crate::cancel::CancellationToken;
use crate::config::units::{MotorId, Rpm};
use crate::error::Result;

use super::command::{Direction, StepStyle};

/// Physical means of commanding one stepper motor.
///
/// Chosen once at configuration time. Implementations must poll `token`
/// at least once per step (or before delegating the whole move) and return
/// [`Error::Cancelled`](crate::Error::Cancelled) when it is set.
pub trait StepperBackend: Send {
    /// Motor this backend drives.
    fn motor(&self) -> MotorId;

    /// Short backend name for logging.
    fn kind(&self) -> &'static str;

    /// Current speed.
    fn speed(&self) -> Rpm;

    /// Replace the current speed.
    fn set_speed(&mut self, rpm: Rpm) -> Result<()>;

    /// Move `steps` (> 0) in `direction`, blocking until done or cancelled.
    fn run(
        &mut self,
        steps: u32,
        direction: Direction,
        style: StepStyle,
        token: &CancellationToken,
    ) -> Result<()>;

    /// Release holding torque. Ignores the cancellation token.
    fn release(&mut self) -> Result<()>;
}
