//! Machine phases built from relay, motor and pause primitives.
//!
//! [`SeederOps`] has two layers. The required methods are the primitives a
//! controller must provide; the provided methods are the phases every
//! recipe is assembled from, with the speeds, relay channels and dwell times
//! of the stock machine. Implementors normally only supply primitives.

use core::time::Duration;

use crate::config::units::MotorId;
use crate::error::Result;
use crate::motor::{Direction, StepCommand, StepOutcome, StepStyle};
use crate::relay::RelayMode;

use super::table::{Advance, CleanTray, FillTray, Rotate, RowSteps, SeedRelease, SetTray};

/// Tray conveyor.
pub const TRAY: MotorId = MotorId::M1;
/// Soil hopper feed.
pub const HOPPER: MotorId = MotorId::M2;
/// Cleaning brush.
pub const BRUSH: MotorId = MotorId::M3;
/// Seed pick-up arm.
pub const SEED_ARM: MotorId = MotorId::M4;

const SETTLE_SHORT: Duration = Duration::from_millis(50);
const SETTLE: Duration = Duration::from_millis(100);
const VALVE_DWELL: Duration = Duration::from_millis(500);
const VACUUM_SPIN_UP: Duration = Duration::from_secs(1);

/// Primitive operations and the recipe phases built on them.
pub trait SeederOps {
    /// Drive a relay. Fails with `Cancelled` if a stop is pending.
    fn set_relay(&mut self, channel: u8, mode: RelayMode) -> Result<()>;

    /// Run a step command to completion on the calling thread.
    fn run_blocking(&mut self, command: StepCommand) -> Result<StepOutcome>;

    /// Start a step command concurrently with the caller.
    fn run_async(&mut self, command: StepCommand) -> Result<()>;

    /// Wait for every command started with `run_async`.
    fn join_all(&mut self) -> Result<()>;

    /// Release holding torque on one motor.
    fn release_motor(&mut self, motor: MotorId) -> Result<()>;

    /// Release holding torque on every motor.
    fn release_all_motors(&mut self) -> Result<()>;

    /// Open every relay. Fails with `Cancelled` if a stop is pending.
    fn open_all_relays(&mut self) -> Result<()>;

    /// Wait for `duration`, aborting with `Cancelled` on a stop request.
    fn pause(&mut self, duration: Duration) -> Result<()>;

    /// Append an operator-facing log line.
    fn log(&mut self, line: &str);

    /// Release every motor and open every relay regardless of the stop
    /// flag. Runs after a failed or stopped recipe.
    fn cleanup(&mut self) -> Result<()>;

    /// Release motors and valves, then close relay 1.
    fn release_all(&mut self) -> Result<()> {
        self.log("Release Motors");
        self.release_all_motors()?;
        self.log("Release Air Valves");
        self.open_all_relays()?;
        self.set_relay(1, RelayMode::Close)?;
        self.log("Please wait...");
        self.pause(SETTLE)
    }

    /// Feed soil while the tray creeps forward.
    fn fill_tray(&mut self, fill: &FillTray) -> Result<()> {
        self.log("Fill tray");
        self.set_relay(8, RelayMode::Close)?;
        self.run_blocking(StepCommand::forward(TRAY, fill.m1_first).speed(60.0))?;
        self.set_relay(6, RelayMode::Close)?;
        self.run_async(StepCommand::forward(TRAY, fill.m1).speed(10.0))?;
        self.run_async(StepCommand::forward(HOPPER, fill.m2).speed(70.0))?;
        self.join_all()?;
        self.set_relay(8, RelayMode::Open)?;
        self.set_relay(6, RelayMode::Open)
    }

    /// Brush excess soil off the tray.
    fn clean_tray(&mut self, clean: &CleanTray) -> Result<()> {
        self.log("Clean Tray");
        self.run_blocking(StepCommand::forward(TRAY, 1).speed(20.0))?;
        self.run_async(StepCommand::forward(TRAY, clean.m1).speed(40.0))?;
        self.run_async(StepCommand::forward(BRUSH, clean.m3).speed(50.0))?;
        self.join_all()?;
        self.release_motor(BRUSH)
    }

    /// Push the tray against its stop and back off.
    fn set_tray(&mut self, set: &SetTray) -> Result<()> {
        self.log("Set Tray");
        self.set_relay(1, RelayMode::Close)?;
        self.pause(SETTLE)?;
        self.run_blocking(StepCommand::forward(TRAY, set.forward).speed(160.0))?;
        self.run_blocking(StepCommand::reverse(TRAY, set.reverse).speed(160.0))?;
        self.pause(SETTLE)
    }

    /// Bring the first row under the dibbler.
    fn forward_dibbler(&mut self, steps: u32) -> Result<()> {
        self.log("Forward Dibbler");
        self.set_relay(1, RelayMode::Open)?;
        self.pause(SETTLE)?;
        self.run_blocking(StepCommand::forward(TRAY, steps).speed(160.0))
            .map(|_| ())
    }

    /// Punch one row of holes and advance to the next.
    fn dibble_row(&mut self, row: u32, steps: &RowSteps) -> Result<()> {
        self.log(&format!("Dibble Row {row}"));
        self.set_relay(1, RelayMode::Close)?;
        self.pause(SETTLE_SHORT)?;
        self.set_relay(1, RelayMode::Open)?;
        self.pause(SETTLE_SHORT)?;
        self.run_blocking(StepCommand::forward(TRAY, steps.for_row(row)).speed(160.0))
            .map(|_| ())
    }

    /// Move the tray under the seeder and park the seed arm.
    fn advance_to_seeder(&mut self, advance: &Advance) -> Result<()> {
        self.log("Advance To Seeder");
        self.set_relay(7, RelayMode::Close)?;
        self.run_blocking(StepCommand::forward(TRAY, advance.m1).speed(160.0))?;
        self.run_blocking(
            StepCommand::new(SEED_ARM, advance.m4, advance.m4_direction).style(StepStyle::Interleave),
        )
        .map(|_| ())
    }

    /// Start the vacuum that holds seeds on the arm.
    fn activate_vacuum(&mut self) -> Result<()> {
        self.log("Activate Vacuum");
        self.set_relay(5, RelayMode::Close)?;
        self.set_relay(2, RelayMode::Close)?;
        self.set_relay(3, RelayMode::Open)?;
        self.pause(VACUUM_SPIN_UP)
    }

    /// Advance the tray to a seeding row.
    fn set_row(&mut self, row: u32, steps: &RowSteps) -> Result<()> {
        self.log(&format!("Set Row {row}"));
        self.run_blocking(StepCommand::forward(TRAY, steps.for_row(row)))
            .map(|_| ())
    }

    /// Creep the tray forward between seeds of the same row.
    fn nudge(&mut self, steps: u32) -> Result<()> {
        self.run_blocking(StepCommand::forward(TRAY, steps)).map(|_| ())
    }

    /// Swing the loaded seed arm over the tray.
    fn rotate_to_tray(&mut self, rotate: &Rotate) -> Result<()> {
        self.log("Rotate To Tray");
        self.set_relay(5, RelayMode::Open)?;
        self.pause(VALVE_DWELL)?;
        self.set_relay(5, RelayMode::Close)?;
        self.run_blocking(
            StepCommand::new(SEED_ARM, rotate.steps, rotate.direction)
                .style(StepStyle::Interleave)
                .speed(180.0),
        )
        .map(|_| ())
    }

    /// Drop the seed and swing the arm back.
    ///
    /// When `row` equals `rows` the tray is done: the arm reverses to its
    /// park position instead of picking up another seed.
    fn release_seed(&mut self, row: u32, rows: u32, release: &SeedRelease) -> Result<()> {
        self.log("Release Seed");
        self.set_relay(2, RelayMode::Open)?;
        self.pause(VALVE_DWELL)?;
        self.set_relay(3, RelayMode::Close)?;
        self.pause(SETTLE_SHORT)?;
        self.set_relay(3, RelayMode::Open)?;

        let command = if row == rows {
            StepCommand::new(SEED_ARM, release.last, Direction::Reverse)
        } else {
            StepCommand::new(SEED_ARM, release.nominal, Direction::Forward)
        };
        self.run_blocking(command.style(StepStyle::Interleave).speed(180.0))?;

        self.set_relay(2, RelayMode::Close)?;
        self.pause(VALVE_DWELL)
    }

    /// Run the tray back out and let the arm and brush go slack.
    fn return_to_zero(&mut self, steps: u32) -> Result<()> {
        self.set_relay(5, RelayMode::Open)?;
        self.log("Return To Zero");
        self.release_motor(SEED_ARM)?;
        self.run_blocking(StepCommand::forward(TRAY, steps).speed(160.0))?;
        self.release_motor(BRUSH)?;
        self.release_motor(SEED_ARM)
    }
}
