//! Motion coordinator for concurrent multi-motor moves.
//!
//! Owns every configured [`StepperDriver`] and runs step commands either on
//! the calling thread ([`run_blocking`](MotionCoordinator::run_blocking)) or
//! on a dedicated thread per motor ([`run_async`](MotionCoordinator::run_async)).
//! Dispatched moves stay registered as [`MotionTask`]s until
//! [`join_all`](MotionCoordinator::join_all) collects them.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use seeder_motion::cancel::CancellationToken;
//! use seeder_motion::config::{MachineConfig, MotorId};
//! use seeder_motion::coordinator::MotionCoordinator;
//! use seeder_motion::hal::{GpioBus, NullPeripheral, StepperPeripheral};
//! use seeder_motion::hal::mock::{HardwareLog, RecordingGpio};
//! use seeder_motion::motor::StepCommand;
//!
//! let config = MachineConfig::default().with_peripheral_motors();
//! let gpio: Arc<dyn GpioBus> = Arc::new(RecordingGpio::new(HardwareLog::new()));
//! let peripheral: Arc<dyn StepperPeripheral> = Arc::new(NullPeripheral);
//! let mut motion = MotionCoordinator::from_config(&config, &gpio, &peripheral).unwrap();
//!
//! let token = CancellationToken::new();
//! // Tray creeps forward while the hopper feeds soil
//! motion.run_async(StepCommand::forward(MotorId::M1, 2375).speed(10.0), &token).unwrap();
//! motion.run_async(StepCommand::forward(MotorId::M2, 17500).speed(70.0), &token).unwrap();
//! motion.join_all(&mut || {}).unwrap();
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;

use crate::cancel::CancellationToken;
use crate::config::units::{MotorId, Rpm};
use crate::config::MachineConfig;
use crate::error::{ConfigError, MotorError, Result};
use crate::hal::{GpioBus, StepperPeripheral};
use crate::motor::{StepCommand, StepOutcome, StepperDriver};

/// Interval between completion polls in [`MotionCoordinator::join_all`].
pub const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(5);

type SharedDriver = Arc<Mutex<StepperDriver>>;

/// Sets the completion ordinal when the motion thread exits, including by panic.
struct CompletionGuard {
    finished: Arc<AtomicU64>,
    sequence: Arc<AtomicU64>,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        let ordinal = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        self.finished.store(ordinal, Ordering::SeqCst);
    }
}

/// A dispatched, not yet joined stepper move.
pub struct MotionTask {
    command: StepCommand,
    /// Completion ordinal, 0 while running.
    finished: Arc<AtomicU64>,
    handle: JoinHandle<Result<StepOutcome>>,
}

impl MotionTask {
    /// Motor this task is driving.
    #[inline]
    pub fn motor(&self) -> MotorId {
        self.command.motor
    }

    /// The command being executed.
    #[inline]
    pub fn command(&self) -> &StepCommand {
        &self.command
    }

    /// Check if the motion thread has finished.
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.completion_ordinal().is_some()
    }

    fn completion_ordinal(&self) -> Option<u64> {
        match self.finished.load(Ordering::SeqCst) {
            0 => None,
            n => Some(n),
        }
    }

    fn join(self) -> Result<StepOutcome> {
        let motor = self.motor();
        match self.handle.join() {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(motor = %motor, "Motion task panicked");
                Err(MotorError::TaskPanicked(motor).into())
            }
        }
    }
}

/// Lightweight view of a dispatched task returned by `run_async`.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    motor: MotorId,
    finished: Arc<AtomicU64>,
}

impl TaskHandle {
    /// Motor the task is driving.
    pub fn motor(&self) -> MotorId {
        self.motor
    }

    /// Check if the task has finished (it may still await joining).
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst) != 0
    }
}

/// Runs step commands on the configured motors.
///
/// At most one command per motor is in flight at a time.
pub struct MotionCoordinator {
    drivers: BTreeMap<MotorId, SharedDriver>,
    tasks: Vec<MotionTask>,
    sequence: Arc<AtomicU64>,
    poll_interval: Duration,
}

impl Default for MotionCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionCoordinator {
    /// Create a coordinator with no motors.
    pub fn new() -> Self {
        Self {
            drivers: BTreeMap::new(),
            tasks: Vec::new(),
            sequence: Arc::new(AtomicU64::new(0)),
            poll_interval: JOIN_POLL_INTERVAL,
        }
    }

    /// Build a driver for every configured motor.
    pub fn from_config(
        config: &MachineConfig,
        gpio: &Arc<dyn GpioBus>,
        peripheral: &Arc<dyn StepperPeripheral>,
    ) -> Result<Self> {
        let mut coordinator = Self::new();
        for motor in config.motors.iter() {
            coordinator.add_driver(StepperDriver::from_config(motor, gpio, peripheral)?)?;
        }
        Ok(coordinator)
    }

    /// Set the completion poll interval used by `join_all`.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Register a driver under its motor id.
    ///
    /// # Errors
    ///
    /// `DuplicateMotor` if the id already has a driver.
    pub fn add_driver(&mut self, driver: StepperDriver) -> Result<()> {
        let id = driver.motor();
        if self.drivers.contains_key(&id) {
            return Err(ConfigError::DuplicateMotor(id.value()).into());
        }
        self.drivers.insert(id, Arc::new(Mutex::new(driver)));
        Ok(())
    }

    /// Configured motor ids in ascending order.
    pub fn motors(&self) -> impl Iterator<Item = MotorId> + '_ {
        self.drivers.keys().copied()
    }

    /// Check if a motor has a registered task (running or awaiting join).
    pub fn is_busy(&self, motor: MotorId) -> bool {
        self.tasks.iter().any(|t| t.motor() == motor)
    }

    /// Number of registered tasks.
    pub fn active_tasks(&self) -> usize {
        self.tasks.len()
    }

    fn driver(&self, motor: MotorId) -> Result<&SharedDriver> {
        self.drivers
            .get(&motor)
            .ok_or_else(|| MotorError::UnknownMotor(motor.value()).into())
    }

    fn ensure_idle(&self, motor: MotorId) -> Result<()> {
        if self.is_busy(motor) {
            tracing::error!(motor = %motor, "Motor already has an active motion task");
            return Err(MotorError::Busy(motor).into());
        }
        Ok(())
    }

    /// Execute a command on the calling thread.
    ///
    /// # Errors
    ///
    /// `UnknownMotor`, `Busy` if the motor has a registered task, or any
    /// error of [`StepperDriver::run_stepper`].
    pub fn run_blocking(&mut self, command: StepCommand, token: &CancellationToken) -> Result<StepOutcome> {
        let driver = self.driver(command.motor)?;
        self.ensure_idle(command.motor)?;
        driver.lock().run_stepper(&command, token)
    }

    /// Start a command on its own thread and return immediately.
    ///
    /// # Errors
    ///
    /// `Cancelled` if a stop is pending, `UnknownMotor`, `Busy` if the
    /// motor already has a registered task, `SpawnFailed` if the thread
    /// could not be started.
    pub fn run_async(&mut self, command: StepCommand, token: &CancellationToken) -> Result<TaskHandle> {
        token.check()?;
        let driver = self.driver(command.motor)?.clone();
        self.ensure_idle(command.motor)?;

        let motor = command.motor;
        let finished = Arc::new(AtomicU64::new(0));
        let guard = CompletionGuard {
            finished: finished.clone(),
            sequence: self.sequence.clone(),
        };
        let token = token.clone();

        tracing::debug!(motor = %motor, steps = command.steps, "Dispatching motion task");
        let handle = thread::Builder::new()
            .name(format!("motor-{motor}"))
            .spawn(move || {
                let _guard = guard;
                driver.lock().run_stepper(&command, &token)
            })
            .map_err(|e| MotorError::SpawnFailed {
                motor,
                reason: e.to_string(),
            })?;

        self.tasks.push(MotionTask {
            command,
            finished: finished.clone(),
            handle,
        });
        Ok(TaskHandle { motor, finished })
    }

    /// Wait for every registered task.
    ///
    /// Finished tasks are removed as they are observed. `refresh` is called
    /// on every poll so the host can keep its event loop alive. All tasks
    /// are awaited even after a failure; the first failure by completion
    /// order is returned.
    pub fn join_all(&mut self, refresh: &mut dyn FnMut()) -> Result<()> {
        let mut first_error = None;

        while !self.tasks.is_empty() {
            let mut finished: Vec<(u64, MotionTask)> = Vec::new();
            let mut i = 0;
            while i < self.tasks.len() {
                match self.tasks[i].completion_ordinal() {
                    Some(ordinal) => finished.push((ordinal, self.tasks.remove(i))),
                    None => i += 1,
                }
            }
            finished.sort_by_key(|(ordinal, _)| *ordinal);

            for (_, task) in finished {
                let motor = task.motor();
                match task.join() {
                    Ok(_) => tracing::debug!(motor = %motor, "Motion task joined"),
                    Err(e) => {
                        if !e.is_cancelled() {
                            tracing::warn!(motor = %motor, error = %e, "Motion task failed");
                        }
                        first_error.get_or_insert(e);
                    }
                }
            }

            refresh();
            if !self.tasks.is_empty() {
                thread::sleep(self.poll_interval);
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Override a motor's current speed.
    ///
    /// # Errors
    ///
    /// `UnknownMotor`, `Busy`, or `InvalidParameter` for a bad speed.
    pub fn set_speed(&mut self, motor: MotorId, rpm: Rpm) -> Result<()> {
        let driver = self.driver(motor)?;
        self.ensure_idle(motor)?;
        driver.lock().set_speed(rpm)
    }

    /// Current speed of a motor.
    pub fn speed(&self, motor: MotorId) -> Result<Rpm> {
        Ok(self.driver(motor)?.lock().speed())
    }

    /// Release holding torque on one motor.
    pub fn release(&mut self, motor: MotorId) -> Result<()> {
        let driver = self.driver(motor)?;
        self.ensure_idle(motor)?;
        driver.lock().release()
    }

    /// Release holding torque on every motor.
    ///
    /// Waits for outstanding tasks first. A task failure is logged, not
    /// returned. Every motor is attempted; the first release failure is
    /// returned.
    pub fn release_all_motors(&mut self) -> Result<()> {
        if !self.tasks.is_empty() {
            if let Err(e) = self.join_all(&mut || {}) {
                tracing::warn!(error = %e, "Motion task failed before release");
            }
        }

        let mut first_error = None;
        for (motor, driver) in &self.drivers {
            if let Err(e) = driver.lock().release() {
                tracing::warn!(motor = %motor, error = %e, "Failed to release motor");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl Drop for MotionCoordinator {
    fn drop(&mut self) {
        for task in self.tasks.drain(..) {
            let _ = task.join();
        }
    }
}
