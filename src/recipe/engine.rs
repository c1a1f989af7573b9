//! Recipe execution state machine.

use std::time::{Duration, Instant};

use crate::cancel::CancellationToken;
use crate::error::{Error, Result};
use crate::journal::Journal;

use super::ops::SeederOps;
use super::table::{Approach, RecipeTable};

/// Lifecycle of the most recent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    /// No run started yet.
    #[default]
    Idle,
    /// A run is executing.
    Running,
    /// The last run finished every phase.
    Completed,
    /// The last run failed or was stopped; cleanup has been performed.
    Aborted,
}

/// Caller-supplied changes applied to a table for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunOverrides {
    /// Replace the table's row count.
    pub rows: Option<u32>,
}

impl RunOverrides {
    /// Override the row count.
    pub fn rows(rows: u32) -> Self {
        Self { rows: Some(rows) }
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Program name.
    pub name: String,
    /// Rows seeded.
    pub rows: u32,
    /// Wall-clock duration.
    pub elapsed: Duration,
}

/// Run every phase of `table` in order over `rows` rows.
///
/// This is the one sequence shared by all programs: release, settle, fill,
/// clean, set tray, dibble, advance, seed every row, return to zero,
/// release. The first error aborts the sequence.
pub fn run_sequence(ops: &mut dyn SeederOps, table: &RecipeTable, rows: u32) -> Result<()> {
    ops.release_all()?;
    ops.pause(table.settle())?;

    ops.fill_tray(&table.fill)?;
    ops.clean_tray(&table.clean)?;
    ops.set_tray(&table.set_tray)?;
    ops.forward_dibbler(table.forward_dibbler)?;

    if let Some(dibble) = &table.dibble {
        for row in 1..=rows {
            ops.dibble_row(row, dibble)?;
        }
    }

    ops.advance_to_seeder(&table.advance)?;
    ops.activate_vacuum()?;

    for row in 1..=rows {
        for seed in &table.seeds {
            match seed.approach {
                Approach::SetRow(steps) => ops.set_row(row, &steps)?,
                Approach::Nudge(steps) => ops.nudge(steps)?,
            }
            ops.rotate_to_tray(&seed.rotate)?;
            ops.release_seed(seed.row_index.resolve(row), rows, &seed.release)?;
        }
    }

    ops.return_to_zero(table.return_to_zero)?;
    ops.release_all()
}

/// Drives one recipe at a time through `Idle → Running → Completed | Aborted`.
#[derive(Debug)]
pub struct RecipeEngine {
    state: RunState,
    token: CancellationToken,
    journal: Journal,
}

impl RecipeEngine {
    /// Create an idle engine that clears `token` and `journal` on every run.
    pub fn new(token: CancellationToken, journal: Journal) -> Self {
        Self {
            state: RunState::Idle,
            token,
            journal,
        }
    }

    /// State of the most recent run.
    #[inline]
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Execute `table` against `ops`.
    ///
    /// Starting a run clears the stop flag and the in-memory log. On any
    /// error, including an operator stop, `ops.cleanup()` runs before the
    /// error is returned.
    ///
    /// # Errors
    ///
    /// `NoRows` if the run would seed nothing, otherwise the first error
    /// raised by a phase.
    pub fn run(
        &mut self,
        ops: &mut dyn SeederOps,
        table: &RecipeTable,
        overrides: RunOverrides,
    ) -> Result<RunReport> {
        let rows = overrides.rows.unwrap_or(table.rows);
        let mut effective = table.clone();
        effective.rows = rows;
        effective.validate()?;

        self.token.reset();
        self.journal.clear();
        self.state = RunState::Running;

        let start = Instant::now();
        tracing::info!(recipe = %table.name, rows, "Recipe started");
        self.journal.log(format!("-- Beginning {} --", table.name));

        match run_sequence(ops, &effective, rows) {
            Ok(()) => {
                let elapsed = start.elapsed();
                self.journal.log(format!("-- End of {} --", table.name));
                tracing::info!(recipe = %table.name, rows, ?elapsed, "Recipe completed");
                self.state = RunState::Completed;
                Ok(RunReport {
                    name: table.name.clone(),
                    rows,
                    elapsed,
                })
            }
            Err(error) => {
                self.abort(ops, &table.name, &error);
                Err(error)
            }
        }
    }

    fn abort(&mut self, ops: &mut dyn SeederOps, name: &str, error: &Error) {
        if error.is_cancelled() {
            tracing::warn!(recipe = %name, "Recipe stopped by operator");
            self.journal.log("Stop signal detected, stopped by operator");
        } else {
            tracing::error!(recipe = %name, error = %error, "Recipe failed");
            self.journal.log(format!("Run failed: {error}"));
        }

        if let Err(e) = ops.cleanup() {
            tracing::error!(recipe = %name, error = %e, "Cleanup after abort failed");
            self.journal.log(format!("Cleanup failed: {e}"));
        }
        self.state = RunState::Aborted;
    }
}
