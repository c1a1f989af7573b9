//! Recording hardware doubles for tests and dry runs.
//!
//! [`RecordingGpio`] and [`RecordingPeripheral`] append every call to a
//! shared [`HardwareLog`], so the relative order of line writes and
//! peripheral steps is preserved across both collaborators. Line writes
//! carry an `Instant` timestamp for pulse timing checks.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use seeder_motion::hal::mock::{HardwareLog, RecordingGpio};
//! use seeder_motion::hal::GpioBus;
//! use embedded_hal::digital::PinState;
//!
//! let log = HardwareLog::new();
//! let gpio = RecordingGpio::new(log.clone());
//! gpio.configure_output(14, PinState::High).unwrap();
//! gpio.write(14, PinState::Low).unwrap();
//!
//! assert_eq!(gpio.level(14), Some(PinState::Low));
//! assert_eq!(log.len(), 2);
//! ```

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use embedded_hal::digital::PinState;
use parking_lot::Mutex;

use super::{GpioBus, HalError, StepperPeripheral};
use crate::config::units::Rpm;
use crate::motor::{Direction, StepStyle};

/// One recorded hardware call.
#[derive(Debug, Clone, PartialEq)]
pub enum HardwareEvent {
    /// Line configured as output.
    Configure {
        /// Line number
        line: u8,
        /// Initial level
        level: PinState,
    },
    /// Line driven.
    Write {
        /// Line number
        line: u8,
        /// Driven level
        level: PinState,
    },
    /// Peripheral speed change.
    Speed {
        /// Peripheral port
        port: u8,
        /// New speed
        rpm: Rpm,
    },
    /// Peripheral step call.
    Step {
        /// Peripheral port
        port: u8,
        /// Step count
        steps: u32,
        /// Direction
        direction: Direction,
        /// Drive style
        style: StepStyle,
    },
    /// Peripheral torque release.
    Release {
        /// Peripheral port
        port: u8,
    },
}

#[derive(Debug)]
struct Recorded {
    event: HardwareEvent,
    at: Instant,
}

/// Shared, ordered record of hardware calls.
#[derive(Debug, Clone, Default)]
pub struct HardwareLog {
    entries: Arc<Mutex<Vec<Recorded>>>,
}

impl HardwareLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, event: HardwareEvent) {
        self.entries.lock().push(Recorded {
            event,
            at: Instant::now(),
        });
    }

    /// All events in call order.
    pub fn events(&self) -> Vec<HardwareEvent> {
        self.entries.lock().iter().map(|r| r.event.clone()).collect()
    }

    /// Writes to one line with their timestamps.
    pub fn writes_to(&self, line: u8) -> Vec<(PinState, Instant)> {
        self.entries
            .lock()
            .iter()
            .filter_map(|r| match r.event {
                HardwareEvent::Write { line: l, level } if l == line => Some((level, r.at)),
                _ => None,
            })
            .collect()
    }

    /// Peripheral step calls on one port, as `(steps, direction, style)`.
    pub fn steps_on(&self, port: u8) -> Vec<(u32, Direction, StepStyle)> {
        self.entries
            .lock()
            .iter()
            .filter_map(|r| match r.event {
                HardwareEvent::Step {
                    port: p,
                    steps,
                    direction,
                    style,
                } if p == port => Some((steps, direction, style)),
                _ => None,
            })
            .collect()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Forget all recorded events.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

/// GPIO bus that records writes and tracks line levels.
#[derive(Debug)]
pub struct RecordingGpio {
    log: HardwareLog,
    levels: Mutex<[Option<PinState>; 256]>,
    failing: Mutex<Vec<u8>>,
}

impl RecordingGpio {
    /// Create a bus recording into `log`.
    pub fn new(log: HardwareLog) -> Self {
        Self {
            log,
            levels: Mutex::new([None; 256]),
            failing: Mutex::new(Vec::new()),
        }
    }

    /// Current level of a line, `None` if never configured.
    pub fn level(&self, line: u8) -> Option<PinState> {
        self.levels.lock()[usize::from(line)]
    }

    /// Make every later write to `line` fail.
    pub fn fail_line(&self, line: u8) {
        self.failing.lock().push(line);
    }

    fn check_line(&self, line: u8) -> Result<(), HalError> {
        if self.failing.lock().contains(&line) {
            Err(HalError::new(format!("line {line} write failed")))
        } else {
            Ok(())
        }
    }
}

impl GpioBus for RecordingGpio {
    fn configure_output(&self, line: u8, initial: PinState) -> Result<(), HalError> {
        self.levels.lock()[usize::from(line)] = Some(initial);
        self.log.record(HardwareEvent::Configure {
            line,
            level: initial,
        });
        Ok(())
    }

    fn write(&self, line: u8, level: PinState) -> Result<(), HalError> {
        self.check_line(line)?;
        self.levels.lock()[usize::from(line)] = Some(level);
        self.log.record(HardwareEvent::Write { line, level });
        Ok(())
    }
}

/// Stepper peripheral that records calls.
///
/// `step` can optionally take simulated time proportional to the step count
/// so that concurrent motion is observable.
#[derive(Debug)]
pub struct RecordingPeripheral {
    log: HardwareLog,
    time_per_step: Duration,
    failing_port: Mutex<Option<u8>>,
}

impl RecordingPeripheral {
    /// Create a peripheral recording into `log` whose steps take no time.
    pub fn new(log: HardwareLog) -> Self {
        Self {
            log,
            time_per_step: Duration::ZERO,
            failing_port: Mutex::new(None),
        }
    }

    /// Simulate `per_step` of motion time for every step issued.
    pub fn with_time_per_step(mut self, per_step: Duration) -> Self {
        self.time_per_step = per_step;
        self
    }

    /// Make every later `step` call on `port` fail.
    pub fn fail_port(&self, port: u8) {
        *self.failing_port.lock() = Some(port);
    }
}

impl StepperPeripheral for RecordingPeripheral {
    fn set_speed(&self, port: u8, rpm: Rpm) -> Result<(), HalError> {
        self.log.record(HardwareEvent::Speed { port, rpm });
        Ok(())
    }

    fn step(&self, port: u8, steps: u32, direction: Direction, style: StepStyle) -> Result<(), HalError> {
        if *self.failing_port.lock() == Some(port) {
            return Err(HalError::new(format!("port {port} did not acknowledge")));
        }
        self.log.record(HardwareEvent::Step {
            port,
            steps,
            direction,
            style,
        });
        if !self.time_per_step.is_zero() {
            thread::sleep(self.time_per_step * steps);
        }
        Ok(())
    }

    fn release(&self, port: u8) -> Result<(), HalError> {
        self.log.record(HardwareEvent::Release { port });
        Ok(())
    }
}
