//! Unit types for machine quantities.
//!
//! Provides type-safe representations of motor ids, speeds and logic levels
//! to keep raw integers and floats from being mixed up at call sites.

use core::fmt;
use core::time::Duration;

use embedded_hal::digital::PinState;
use serde::Deserialize;

use crate::error::ConfigError;

/// Identifier of one of the four stepper motors (1..=4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "u8")]
pub struct MotorId(u8);

impl MotorId {
    /// Highest motor id supported by the machine.
    pub const MAX: u8 = 4;

    /// Motor 1.
    pub const M1: MotorId = MotorId(1);
    /// Motor 2.
    pub const M2: MotorId = MotorId(2);
    /// Motor 3.
    pub const M3: MotorId = MotorId(3);
    /// Motor 4.
    pub const M4: MotorId = MotorId(4);

    /// Create a motor id, rejecting values outside 1..=4.
    pub const fn new(id: u8) -> Option<Self> {
        if id >= 1 && id <= Self::MAX {
            Some(Self(id))
        } else {
            None
        }
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// All motor ids in ascending order.
    pub fn all() -> impl Iterator<Item = MotorId> {
        (1..=Self::MAX).map(MotorId)
    }
}

impl TryFrom<u8> for MotorId {
    type Error = ConfigError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        MotorId::new(id).ok_or(ConfigError::InvalidMotorId(id))
    }
}

impl fmt::Display for MotorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Longest edge interval a pulse train will pace.
pub const MAX_EDGE_INTERVAL: Duration = Duration::from_secs(3600);

/// Rotational speed in revolutions per minute.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
pub struct Rpm(pub f32);

impl Rpm {
    /// Create a new Rpm value.
    #[inline]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }

    /// A usable speed is finite and strictly positive.
    #[inline]
    pub fn is_valid(self) -> bool {
        self.0.is_finite() && self.0 > 0.0
    }

    /// Time between consecutive pulse edges (rising to falling, falling to rising).
    ///
    /// One step is a full high/low cycle, so the edge interval is half a step
    /// period: `30 / (steps_per_rev * rpm)` seconds. Returns `None` when the
    /// speed is invalid or the interval exceeds [`MAX_EDGE_INTERVAL`].
    pub fn edge_interval(self, steps_per_revolution: u16) -> Option<Duration> {
        if !self.is_valid() || steps_per_revolution == 0 {
            return None;
        }
        let steps_per_minute = f64::from(steps_per_revolution) * f64::from(self.0);
        Duration::try_from_secs_f64(30.0 / steps_per_minute)
            .ok()
            .filter(|interval| *interval <= MAX_EDGE_INTERVAL)
    }
}

impl From<f32> for Rpm {
    fn from(value: f32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Rpm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} RPM", self.0)
    }
}

/// Logic level of an output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    /// Line driven low.
    #[default]
    Low,
    /// Line driven high.
    High,
}

impl Level {
    /// The opposite level.
    #[inline]
    pub const fn inverse(self) -> Self {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }

    /// Convert to the embedded-hal pin state.
    #[inline]
    pub const fn pin_state(self) -> PinState {
        match self {
            Level::Low => PinState::Low,
            Level::High => PinState::High,
        }
    }
}

impl From<PinState> for Level {
    fn from(state: PinState) -> Self {
        match state {
            PinState::Low => Level::Low,
            PinState::High => Level::High,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motor_id_range() {
        assert!(MotorId::new(0).is_none());
        assert_eq!(MotorId::new(1).map(MotorId::value), Some(1));
        assert_eq!(MotorId::new(4).map(MotorId::value), Some(4));
        assert!(MotorId::new(5).is_none());
        assert_eq!(MotorId::try_from(9), Err(ConfigError::InvalidMotorId(9)));
    }

    #[test]
    fn test_edge_interval() {
        // 30 / (200 * 25) = 6 ms
        let interval = Rpm(25.0).edge_interval(200).unwrap();
        assert!((interval.as_secs_f64() - 0.006).abs() < 1e-9);

        // 30 / (200 * 160) = 0.9375 ms
        let interval = Rpm(160.0).edge_interval(200).unwrap();
        assert!((interval.as_secs_f64() - 0.0009375).abs() < 1e-9);
    }

    #[test]
    fn test_edge_interval_out_of_range() {
        // Positive and finite, but the interval does not fit in a Duration
        assert!(Rpm(1e-25).is_valid());
        assert_eq!(Rpm(1e-25).edge_interval(200), None);
        // Fits a Duration, but a deadline that far out overflows Instant
        assert_eq!(Rpm(1e-20).edge_interval(200), None);
        assert_eq!(Rpm(0.0).edge_interval(200), None);
        assert_eq!(Rpm(25.0).edge_interval(0), None);
    }

    #[test]
    fn test_edge_interval_ceiling() {
        // 30 / (200 * 0.0001) = 1500 s
        let interval = Rpm(0.0001).edge_interval(200).unwrap();
        assert!(interval <= MAX_EDGE_INTERVAL);
        // 30 / (200 * 0.00001) = 15000 s
        assert_eq!(Rpm(0.00001).edge_interval(200), None);
    }

    #[test]
    fn test_rpm_validity() {
        assert!(Rpm(25.0).is_valid());
        assert!(!Rpm(0.0).is_valid());
        assert!(!Rpm(-3.0).is_valid());
        assert!(!Rpm(f32::NAN).is_valid());
    }

    #[test]
    fn test_level_inverse() {
        assert_eq!(Level::High.inverse(), Level::Low);
        assert_eq!(Level::Low.pin_state(), PinState::Low);
    }
}
