//! Seeding programs.
//!
//! A program is a [`RecipeTable`] of literal step counts run through the
//! shared [`run_sequence`], whose phases are the provided methods of
//! [`SeederOps`]. [`RecipeEngine`] wraps a run with the stop-flag reset,
//! the cleanup path and the run state.

mod engine;
mod ops;
mod table;

pub use engine::{run_sequence, RecipeEngine, RunOverrides, RunReport, RunState};
pub use ops::{SeederOps, BRUSH, HOPPER, SEED_ARM, TRAY};
pub use table::{
    Advance, Approach, CleanTray, FillTray, Recipe, RecipeTable, RowIndex, RowSteps, Rotate,
    SeedPass, SeedRelease, SetTray,
};
