//! Step commands and their parameters.

use core::fmt;
use core::str::FromStr;

use serde::Deserialize;

use crate::config::units::{MotorId, Rpm};
use crate::error::{Error, MotorError, Result};

/// Direction of motor motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Clockwise, drives the configured clockwise level on the DIR line.
    #[default]
    Forward,
    /// Counter-clockwise.
    Reverse,
}

impl Direction {
    /// Parse a direction name, case-insensitively.
    ///
    /// Accepts `forward`/`fwd`/`cw`/`clockwise` and
    /// `reverse`/`rev`/`backward`/`ccw`/`counterclockwise`.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward" | "fwd" | "cw" | "clockwise" => Ok(Direction::Forward),
            "reverse" | "rev" | "backward" | "ccw" | "counterclockwise" => Ok(Direction::Reverse),
            _ => Err(MotorError::InvalidParameter(format!("unknown direction '{s}'")).into()),
        }
    }

    /// Get the opposite direction.
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Direction::parse(s)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => f.write_str("Forward"),
            Direction::Reverse => f.write_str("Reverse"),
        }
    }
}

/// Coil drive style, honoured by peripheral backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepStyle {
    /// One coil energized at a time.
    Single,
    /// Two coils energized, full torque.
    #[default]
    Double,
    /// Alternating single/double for half steps.
    Interleave,
    /// Microstepping.
    Microstep,
}

impl StepStyle {
    /// Parse a style name, case-insensitively.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(StepStyle::Single),
            "double" => Ok(StepStyle::Double),
            "interleave" => Ok(StepStyle::Interleave),
            "microstep" | "micro" => Ok(StepStyle::Microstep),
            _ => Err(MotorError::InvalidParameter(format!("unknown step style '{s}'")).into()),
        }
    }
}

impl FromStr for StepStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        StepStyle::parse(s)
    }
}

impl fmt::Display for StepStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StepStyle::Single => "Single",
            StepStyle::Double => "Double",
            StepStyle::Interleave => "Interleave",
            StepStyle::Microstep => "Microstep",
        };
        f.write_str(name)
    }
}

/// One stepper invocation.
///
/// A step count of zero is a no-op. A speed of `None` keeps the motor's
/// current speed; `Some` replaces it for this and all later commands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepCommand {
    /// Target motor.
    pub motor: MotorId,
    /// Number of steps.
    pub steps: u32,
    /// Rotation direction.
    pub direction: Direction,
    /// Drive style (peripheral backends only).
    pub style: StepStyle,
    /// Speed override.
    pub speed: Option<Rpm>,
}

impl StepCommand {
    /// Create a command with the default style and no speed override.
    pub fn new(motor: MotorId, steps: u32, direction: Direction) -> Self {
        Self {
            motor,
            steps,
            direction,
            style: StepStyle::default(),
            speed: None,
        }
    }

    /// Forward move.
    pub fn forward(motor: MotorId, steps: u32) -> Self {
        Self::new(motor, steps, Direction::Forward)
    }

    /// Reverse move.
    pub fn reverse(motor: MotorId, steps: u32) -> Self {
        Self::new(motor, steps, Direction::Reverse)
    }

    /// Set the drive style.
    pub fn style(mut self, style: StepStyle) -> Self {
        self.style = style;
        self
    }

    /// Set the speed override in RPM. Zero keeps the current speed.
    pub fn speed(mut self, rpm: f32) -> Self {
        self.speed = if rpm == 0.0 { None } else { Some(Rpm(rpm)) };
        self
    }

    /// Build a command from loosely typed operator input.
    ///
    /// # Errors
    ///
    /// `UnknownMotor` for ids outside 1..=4, `InvalidParameter` for
    /// unrecognized direction or style names or a negative speed.
    pub fn parse(motor: u8, steps: u32, direction: &str, style: &str, speed: f32) -> Result<Self> {
        let id = MotorId::new(motor).ok_or(MotorError::UnknownMotor(motor))?;
        if !(speed == 0.0 || Rpm(speed).is_valid()) {
            return Err(MotorError::InvalidParameter(format!("invalid speed {speed}")).into());
        }
        Ok(Self::new(id, steps, Direction::parse(direction)?)
            .style(StepStyle::parse(style)?)
            .speed(speed))
    }

    /// Check if the command moves nothing.
    #[inline]
    pub fn is_noop(&self) -> bool {
        self.steps == 0
    }
}

/// Result of a successful stepper invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The motor moved the requested number of steps.
    Completed {
        /// Steps issued.
        steps: u32,
    },
    /// Step count was zero; no hardware was touched.
    NoOp,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_direction_synonyms() {
        assert_eq!(Direction::parse("Forward").unwrap(), Direction::Forward);
        assert_eq!(Direction::parse(" CW ").unwrap(), Direction::Forward);
        assert_eq!(Direction::parse("Reverse").unwrap(), Direction::Reverse);
        assert_eq!(Direction::parse("ccw").unwrap(), Direction::Reverse);
        assert_eq!(
            Direction::parse("sideways").unwrap_err().kind(),
            ErrorKind::InvalidParameter
        );
    }

    #[test]
    fn test_style_names() {
        assert_eq!("Interleave".parse::<StepStyle>().unwrap(), StepStyle::Interleave);
        assert_eq!("micro".parse::<StepStyle>().unwrap(), StepStyle::Microstep);
        assert!("wave".parse::<StepStyle>().is_err());
        assert_eq!(StepStyle::default(), StepStyle::Double);
    }

    #[test]
    fn test_zero_speed_keeps_current() {
        let id = MotorId::new(1).unwrap();
        assert_eq!(StepCommand::forward(id, 10).speed(0.0).speed, None);
        assert_eq!(StepCommand::forward(id, 10).speed(60.0).speed, Some(Rpm(60.0)));
    }

    #[test]
    fn test_parse_command() {
        let cmd = StepCommand::parse(4, 219, "Reverse", "Interleave", 0.0).unwrap();
        assert_eq!(cmd.motor.value(), 4);
        assert_eq!(cmd.direction, Direction::Reverse);
        assert_eq!(cmd.style, StepStyle::Interleave);
        assert_eq!(cmd.speed, None);

        let err = StepCommand::parse(6, 1, "Forward", "Double", 0.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigurationError);

        let err = StepCommand::parse(1, 1, "Forward", "Double", -5.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    }
}
