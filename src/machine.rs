//! The assembled seeder controller.
//!
//! [`Seeder`] is the upward interface used by a host UI: pick a recipe by
//! index or name, optionally override speeds or the row count, run it, and
//! pull the log text. A [`StopHandle`] taken from the seeder can be moved to
//! another thread and asserts the stop flag that every primitive polls.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use embedded_hal_mock::eh1::delay::NoopDelay;
//! use seeder_motion::config::MachineConfig;
//! use seeder_motion::hal::mock::{HardwareLog, RecordingGpio, RecordingPeripheral};
//! use seeder_motion::machine::Seeder;
//! use seeder_motion::recipe::{Recipe, RunOverrides};
//!
//! let log = HardwareLog::new();
//! let mut seeder = Seeder::new(
//!     MachineConfig::default().with_peripheral_motors(),
//!     Arc::new(RecordingGpio::new(log.clone())),
//!     Arc::new(RecordingPeripheral::new(log.clone())),
//!     NoopDelay::new(),
//! )
//! .unwrap();
//!
//! let report = seeder
//!     .run_recipe(Recipe::Seed12RowsNoDibble, RunOverrides::rows(3))
//!     .unwrap();
//! assert_eq!(report.rows, 3);
//! assert!(seeder.log_text().contains("Release Seed"));
//! ```

use core::time::Duration;
use std::sync::Arc;

use embedded_hal::delay::DelayNs;

use crate::cancel::{CancellationToken, StopHandle};
use crate::config::units::{MotorId, Rpm};
use crate::config::{validate_config, MachineConfig};
use crate::coordinator::MotionCoordinator;
use crate::error::{Error, RelayError, Result};
use crate::hal::{GpioBus, LinePin, StdDelay, StepperPeripheral};
use crate::journal::Journal;
use crate::motor::{StepCommand, StepOutcome};
use crate::recipe::{Recipe, RecipeEngine, RecipeTable, RunOverrides, RunReport, RunState, SeederOps};
use crate::relay::{RelayBank, RelayMode};

/// Longest uninterrupted wait inside a pause.
pub const PAUSE_SLICE: Duration = Duration::from_millis(10);

type Refresh = Box<dyn FnMut() + Send>;

/// Relay bank and motion coordinator wired to one stop flag and run log.
///
/// Implements the [`SeederOps`] primitives; phases can be invoked on it
/// directly for manual operation.
pub struct Controller<D: DelayNs> {
    relays: RelayBank<LinePin>,
    motion: MotionCoordinator,
    token: CancellationToken,
    journal: Journal,
    delay: D,
    refresh: Refresh,
}

impl<D: DelayNs> Controller<D> {
    /// Current mode of a relay channel.
    pub fn relay_mode(&self, channel: u8) -> Option<RelayMode> {
        self.relays.mode(channel)
    }

    /// The motion coordinator.
    pub fn motion(&self) -> &MotionCoordinator {
        &self.motion
    }

    fn quiesce(&mut self) -> Result<()> {
        let motors = self.motion.release_all_motors();
        let relays = self.relays.open_all();
        motors.and(relays)
    }
}

impl<D: DelayNs> SeederOps for Controller<D> {
    fn set_relay(&mut self, channel: u8, mode: RelayMode) -> Result<()> {
        match self.relays.set_relay(channel, mode, &self.token) {
            Ok(()) => {
                self.journal.detail(format!("  Relay {channel} set {mode}"));
                Ok(())
            }
            Err(e @ Error::Relay(RelayError::UnknownChannel(_))) => {
                self.journal.log(format!("  Unknown relay: {channel}"));
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    fn run_blocking(&mut self, command: StepCommand) -> Result<StepOutcome> {
        if command.is_noop() {
            self.journal.log("  Warning: stepper command with steps = 0");
        } else {
            self.journal.detail(format!(
                "  Starting stepper: motor_id={}, numsteps={}, direction={}, style={}",
                command.motor, command.steps, command.direction, command.style
            ));
        }
        let outcome = self.motion.run_blocking(command, &self.token)?;
        if !command.is_noop() {
            self.journal
                .detail(format!("  Finished stepper: motor_id={}", command.motor));
        }
        Ok(outcome)
    }

    fn run_async(&mut self, command: StepCommand) -> Result<()> {
        self.journal.detail(format!(
            "  Starting motor {} as non-blocking: numsteps={}, direction={}",
            command.motor, command.steps, command.direction
        ));
        self.motion.run_async(command, &self.token).map(|_| ())
    }

    fn join_all(&mut self) -> Result<()> {
        self.journal.detail(format!(
            "  Waiting for {} motor threads to finish.",
            self.motion.active_tasks()
        ));
        self.motion.join_all(&mut *self.refresh)?;
        self.journal.detail("  Threads finished.");
        Ok(())
    }

    fn release_motor(&mut self, motor: MotorId) -> Result<()> {
        self.motion.release(motor)
    }

    fn release_all_motors(&mut self) -> Result<()> {
        self.motion.release_all_motors()
    }

    fn open_all_relays(&mut self) -> Result<()> {
        let channels: Vec<u8> = self.relays.channels().collect();
        for channel in channels {
            self.set_relay(channel, RelayMode::Open)?;
        }
        Ok(())
    }

    fn pause(&mut self, duration: Duration) -> Result<()> {
        let mut remaining = duration;
        while !remaining.is_zero() {
            self.token.check()?;
            let slice = remaining.min(PAUSE_SLICE);
            self.delay.delay_us(slice.as_micros() as u32);
            remaining -= slice;
        }
        self.token.check()
    }

    fn log(&mut self, line: &str) {
        self.journal.log(line);
    }

    fn cleanup(&mut self) -> Result<()> {
        let result = self.quiesce();
        self.journal.log("Motors released, relays opened");
        result
    }
}

impl<D: DelayNs> Drop for Controller<D> {
    fn drop(&mut self) {
        if let Err(e) = self.quiesce() {
            tracing::warn!(error = %e, "Teardown could not de-energize every actuator");
        }
    }
}

/// The seeding machine.
pub struct Seeder<D: DelayNs = StdDelay> {
    config: MachineConfig,
    controller: Controller<D>,
    engine: RecipeEngine,
}

impl Seeder<StdDelay> {
    /// Build a seeder that pauses with `std::thread::sleep`.
    pub fn with_std_delay(
        config: MachineConfig,
        gpio: Arc<dyn GpioBus>,
        peripheral: Arc<dyn StepperPeripheral>,
    ) -> Result<Self> {
        Self::new(config, gpio, peripheral, StdDelay)
    }
}

impl<D: DelayNs> Seeder<D> {
    /// Validate `config`, configure every output line and open the run log.
    ///
    /// Relays start open, direct-pulse direction lines start at their
    /// clockwise level and pulse lines start low.
    ///
    /// # Errors
    ///
    /// `ConfigError` for an invalid machine description, `LineFault`,
    /// `PinFault` or `PeripheralFault` if initial line setup fails.
    pub fn new(
        config: MachineConfig,
        gpio: Arc<dyn GpioBus>,
        peripheral: Arc<dyn StepperPeripheral>,
        delay: D,
    ) -> Result<Self> {
        validate_config(&config)?;

        let journal = Journal::open(&config.log);
        let relays = RelayBank::from_config(&config, &gpio)?;
        let motion = MotionCoordinator::from_config(&config, &gpio, &peripheral)?;
        for motor in config.motors.iter() {
            journal.detail(format!(
                "  Motor {} uses {} control at {}",
                motor.id,
                motor.backend.name(),
                motor.speed
            ));
        }
        tracing::info!(
            motors = config.motors.len(),
            relays = config.relays.len(),
            "Seeder controller ready"
        );

        let token = CancellationToken::new();
        let engine = RecipeEngine::new(token.clone(), journal.clone());
        Ok(Self {
            config,
            controller: Controller {
                relays,
                motion,
                token,
                journal,
                delay,
                refresh: Box::new(|| {}),
            },
            engine,
        })
    }

    /// The machine description this seeder was built from.
    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Run one of the stock programs.
    pub fn run_recipe(&mut self, recipe: Recipe, overrides: RunOverrides) -> Result<RunReport> {
        let table = recipe.table();
        self.run_table(&table, overrides)
    }

    /// Run a stock program chosen by name or menu index (`"3"`).
    ///
    /// # Errors
    ///
    /// `UnknownRecipe` if nothing matches, otherwise as
    /// [`run_table`](Self::run_table).
    pub fn run_named(&mut self, name: &str, overrides: RunOverrides) -> Result<RunReport> {
        let recipe = Recipe::from_name(name)?;
        self.run_recipe(recipe, overrides)
    }

    /// Run a caller-supplied table.
    ///
    /// The stop flag and the in-memory log are cleared first. Any failure,
    /// including an operator stop, releases every motor and opens every
    /// relay before the error is returned.
    pub fn run_table(&mut self, table: &RecipeTable, overrides: RunOverrides) -> Result<RunReport> {
        self.engine.run(&mut self.controller, table, overrides)
    }

    /// State of the most recent run.
    pub fn state(&self) -> RunState {
        self.engine.state()
    }

    /// Cloneable handle that requests a stop from any thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.controller.token.stop_handle()
    }

    /// Assert the stop flag and de-energize everything now.
    ///
    /// For use between runs; during a run, use a [`StopHandle`].
    pub fn stop_now(&mut self) -> Result<()> {
        self.controller.token.cancel();
        self.controller.journal.log("Stop signal detected");
        self.controller.cleanup()
    }

    /// Override a motor's speed for subsequent moves.
    ///
    /// # Errors
    ///
    /// `UnknownMotor`, or `InvalidParameter` for a non-positive speed.
    pub fn set_speed(&mut self, motor: MotorId, rpm: Rpm) -> Result<()> {
        self.controller.motion.set_speed(motor, rpm)?;
        self.controller
            .journal
            .detail(format!("  Motor {motor} speed set to {rpm}"));
        Ok(())
    }

    /// Current speed of a motor.
    pub fn speed(&self, motor: MotorId) -> Result<Rpm> {
        self.controller.motion.speed(motor)
    }

    /// Install the callback invoked while waiting for concurrent moves.
    pub fn set_refresh(&mut self, refresh: impl FnMut() + Send + 'static) {
        self.controller.refresh = Box::new(refresh);
    }

    /// Text of the current run log.
    pub fn log_text(&self) -> String {
        self.controller.journal.text()
    }

    /// Shared handle to the run log.
    pub fn journal(&self) -> Journal {
        self.controller.journal.clone()
    }

    /// The controller, for manual phase or primitive invocation.
    pub fn controller(&mut self) -> &mut Controller<D> {
        &mut self.controller
    }
}
