//! Recipe parameter tables.
//!
//! Every recipe runs the same phase sequence; a [`RecipeTable`] holds the
//! literal step counts that make one program differ from another. Tables
//! for the five stock programs come from [`Recipe::table`]; custom tables
//! can be written in TOML and loaded with [`RecipeTable::from_toml`].

use core::fmt;
use core::str::FromStr;
use core::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, Error, RecipeError, Result};
use crate::motor::Direction;

/// Step counts for the fill phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FillTray {
    /// Motor 1 lead-in at 60 RPM.
    pub m1_first: u32,
    /// Motor 1 during the concurrent fill at 10 RPM.
    pub m1: u32,
    /// Motor 2 during the concurrent fill at 70 RPM.
    pub m2: u32,
}

/// Step counts for the clean phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CleanTray {
    /// Motor 1 at 40 RPM.
    pub m1: u32,
    /// Motor 3 at 50 RPM.
    pub m3: u32,
}

/// Step counts for squaring the tray against its stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SetTray {
    /// Motor 1 forward.
    pub forward: u32,
    /// Motor 1 back-off.
    pub reverse: u32,
}

/// Alternating step counts for odd and even rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RowSteps {
    /// Steps for odd (1-based) rows.
    pub odd: u32,
    /// Steps for even rows.
    pub even: u32,
}

impl RowSteps {
    /// Same count for every row.
    pub const fn uniform(steps: u32) -> Self {
        Self {
            odd: steps,
            even: steps,
        }
    }

    /// Step count for a 1-based row index.
    #[inline]
    pub fn for_row(&self, row: u32) -> u32 {
        if row % 2 == 1 {
            self.odd
        } else {
            self.even
        }
    }
}

/// Moving the tray under the seeder and parking the seed arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Advance {
    /// Motor 1 forward at 160 RPM.
    pub m1: u32,
    /// Motor 4 interleaved steps at its current speed.
    pub m4: u32,
    /// Motor 4 direction.
    #[serde(default = "reverse")]
    pub m4_direction: Direction,
}

fn reverse() -> Direction {
    Direction::Reverse
}

/// Swinging the seed arm over the tray.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Rotate {
    /// Motor 4 interleaved steps at 180 RPM.
    pub steps: u32,
    /// Motor 4 direction.
    #[serde(default)]
    pub direction: Direction,
}

/// Dropping a seed and swinging the arm back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SeedRelease {
    /// Forward steps to pick up the next seed.
    pub nominal: u32,
    /// Reverse steps after the final seed of the tray.
    pub last: u32,
}

/// Which row number a seed release reports.
///
/// Multi-seed programs report the previous row for every seed but the
/// last, so those seeds never count as the tray's final drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowIndex {
    /// The current 1-based row.
    #[default]
    Current,
    /// The current row minus one.
    Previous,
}

impl RowIndex {
    /// Row number reported for 1-based `row`.
    #[inline]
    pub fn resolve(self, row: u32) -> u32 {
        match self {
            RowIndex::Current => row,
            RowIndex::Previous => row.saturating_sub(1),
        }
    }
}

/// How the tray is positioned before a seed is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Approach {
    /// Advance to the row (first seed of a row).
    SetRow(RowSteps),
    /// Creep forward a few steps (further seeds in the same row).
    Nudge(u32),
}

/// One seed placed in a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SeedPass {
    /// Tray positioning.
    pub approach: Approach,
    /// Arm swing.
    pub rotate: Rotate,
    /// Release and return.
    pub release: SeedRelease,
    /// Row number reported to the release.
    #[serde(default)]
    pub row_index: RowIndex,
}

/// Literal parameters of one seeding program.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecipeTable {
    /// Program name.
    pub name: String,
    /// Rows per tray.
    pub rows: u32,
    /// Pause after the initial release, in milliseconds.
    pub settle_ms: u64,
    /// Fill phase.
    pub fill: FillTray,
    /// Clean phase.
    pub clean: CleanTray,
    /// Set-tray phase.
    pub set_tray: SetTray,
    /// Motor 1 steps to bring the dibbler forward.
    pub forward_dibbler: u32,
    /// Per-row dibbler advance; `None` skips dibbling.
    #[serde(default)]
    pub dibble: Option<RowSteps>,
    /// Advance-to-seeder phase.
    pub advance: Advance,
    /// Seeds placed in each row, in order.
    pub seeds: Vec<SeedPass>,
    /// Motor 1 steps to return the tray.
    pub return_to_zero: u32,
}

impl RecipeTable {
    /// Pause after the initial release.
    #[inline]
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Parse a table from TOML.
    ///
    /// # Errors
    ///
    /// `ParseError` for malformed TOML, `NoRows` for a table without rows
    /// or seeds.
    pub fn from_toml(content: &str) -> Result<Self> {
        let table: RecipeTable =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        table.validate()?;
        Ok(table)
    }

    /// Check that the table would place at least one seed.
    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.seeds.is_empty() {
            return Err(RecipeError::NoRows(self.name.clone()).into());
        }
        Ok(())
    }
}

/// The five stock seeding programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recipe {
    /// 1: dibble and seed 29 rows.
    DibbleSeed29Rows,
    /// 2: dibble and seed 12 rows.
    DibbleSeed12Rows,
    /// 3: seed 12 rows without dibbling.
    Seed12RowsNoDibble,
    /// 4: three seeds per row over 12 rows, no dibbling.
    ThreeSeeds12RowsNoDibble,
    /// 5: dibble 12 rows, two seeds per row.
    DibbleTwoSeeds12Rows,
}

impl Recipe {
    /// All programs in menu order.
    pub const ALL: [Recipe; 5] = [
        Recipe::DibbleSeed29Rows,
        Recipe::DibbleSeed12Rows,
        Recipe::Seed12RowsNoDibble,
        Recipe::ThreeSeeds12RowsNoDibble,
        Recipe::DibbleTwoSeeds12Rows,
    ];

    /// Menu index, 1..=5.
    pub fn index(self) -> u8 {
        match self {
            Recipe::DibbleSeed29Rows => 1,
            Recipe::DibbleSeed12Rows => 2,
            Recipe::Seed12RowsNoDibble => 3,
            Recipe::ThreeSeeds12RowsNoDibble => 4,
            Recipe::DibbleTwoSeeds12Rows => 5,
        }
    }

    /// Program name.
    pub fn name(self) -> &'static str {
        match self {
            Recipe::DibbleSeed29Rows => "dibble-seed-29-rows",
            Recipe::DibbleSeed12Rows => "dibble-seed-12-rows",
            Recipe::Seed12RowsNoDibble => "seed-12-rows-no-dibble",
            Recipe::ThreeSeeds12RowsNoDibble => "three-seeds-12-rows-no-dibble",
            Recipe::DibbleTwoSeeds12Rows => "dibble-two-seeds-12-rows",
        }
    }

    /// Look up a program by menu index.
    pub fn from_index(index: u8) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|r| r.index() == index)
            .ok_or_else(|| RecipeError::UnknownRecipe(index.to_string()).into())
    }

    /// Look up a program by name or menu index, case-insensitively.
    pub fn from_name(name: &str) -> Result<Self> {
        let wanted = name.trim();
        if let Ok(index) = wanted.parse::<u8>() {
            return Self::from_index(index);
        }
        Self::ALL
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| RecipeError::UnknownRecipe(name.to_string()).into())
    }

    /// Literal parameters of this program.
    pub fn table(self) -> RecipeTable {
        match self {
            Recipe::DibbleSeed29Rows => RecipeTable {
                name: self.name().into(),
                rows: 29,
                settle_ms: 1_000,
                fill: FillTray { m1_first: 5, m1: 5, m2: 5 },
                clean: CleanTray { m1: 3, m3: 1 },
                set_tray: SetTray { forward: 3, reverse: 5 },
                forward_dibbler: 9,
                dibble: Some(RowSteps::uniform(1)),
                advance: Advance {
                    m1: 2000,
                    m4: 170,
                    m4_direction: Direction::Forward,
                },
                seeds: vec![SeedPass {
                    approach: Approach::SetRow(RowSteps::uniform(182)),
                    rotate: Rotate {
                        steps: 330,
                        direction: Direction::Reverse,
                    },
                    release: SeedRelease { nominal: 330, last: 160 },
                    row_index: RowIndex::Current,
                }],
                return_to_zero: 2500,
            },
            Recipe::DibbleSeed12Rows => RecipeTable {
                name: self.name().into(),
                rows: 12,
                settle_ms: 10_000,
                fill: FillTray { m1_first: 740, m1: 2375, m2: 17500 },
                clean: CleanTray { m1: 3300, m3: 1700 },
                set_tray: SetTray { forward: 2000, reverse: 75 },
                forward_dibbler: 234,
                dibble: Some(RowSteps { odd: 202, even: 204 }),
                advance: Advance {
                    m1: 387,
                    m4: 220,
                    m4_direction: Direction::Reverse,
                },
                seeds: vec![SeedPass {
                    approach: Approach::SetRow(RowSteps { odd: 201, even: 203 }),
                    rotate: forward(486),
                    release: SeedRelease { nominal: 486, last: 275 },
                    row_index: RowIndex::Current,
                }],
                return_to_zero: 2000,
            },
            Recipe::Seed12RowsNoDibble => RecipeTable {
                name: self.name().into(),
                rows: 12,
                settle_ms: 10_000,
                fill: FillTray { m1_first: 700, m1: 2475, m2: 8800 },
                clean: CleanTray { m1: 3200, m3: 1750 },
                set_tray: SetTray { forward: 2000, reverse: 75 },
                forward_dibbler: 2780,
                dibble: None,
                advance: Advance {
                    m1: 390,
                    m4: 220,
                    m4_direction: Direction::Reverse,
                },
                seeds: vec![SeedPass {
                    approach: Approach::SetRow(RowSteps::uniform(212)),
                    rotate: forward(486),
                    release: SeedRelease { nominal: 486, last: 352 },
                    row_index: RowIndex::Current,
                }],
                return_to_zero: 2000,
            },
            Recipe::ThreeSeeds12RowsNoDibble => RecipeTable {
                name: self.name().into(),
                rows: 12,
                settle_ms: 10_000,
                fill: FillTray { m1_first: 740, m1: 2700, m2: 20000 },
                clean: CleanTray { m1: 3400, m3: 1400 },
                set_tray: SetTray { forward: 2000, reverse: 75 },
                forward_dibbler: 2720,
                dibble: None,
                advance: Advance {
                    m1: 400,
                    m4: 220,
                    m4_direction: Direction::Reverse,
                },
                seeds: vec![
                    SeedPass {
                        approach: Approach::SetRow(RowSteps::uniform(197)),
                        rotate: forward(488),
                        release: SeedRelease { nominal: 488, last: 352 },
                        row_index: RowIndex::Previous,
                    },
                    SeedPass {
                        approach: Approach::Nudge(5),
                        rotate: forward(488),
                        release: SeedRelease { nominal: 488, last: 372 },
                        row_index: RowIndex::Previous,
                    },
                    SeedPass {
                        approach: Approach::Nudge(5),
                        rotate: forward(488),
                        release: SeedRelease { nominal: 488, last: 285 },
                        row_index: RowIndex::Current,
                    },
                ],
                return_to_zero: 500,
            },
            Recipe::DibbleTwoSeeds12Rows => RecipeTable {
                name: self.name().into(),
                rows: 12,
                settle_ms: 10_000,
                fill: FillTray { m1_first: 740, m1: 2575, m2: 15800 },
                clean: CleanTray { m1: 3400, m3: 1400 },
                set_tray: SetTray { forward: 2000, reverse: 75 },
                forward_dibbler: 235,
                dibble: Some(RowSteps::uniform(205)),
                advance: Advance {
                    m1: 387,
                    m4: 220,
                    m4_direction: Direction::Reverse,
                },
                seeds: vec![
                    SeedPass {
                        approach: Approach::SetRow(RowSteps::uniform(205)),
                        rotate: forward(486),
                        release: SeedRelease { nominal: 486, last: 275 },
                        row_index: RowIndex::Previous,
                    },
                    SeedPass {
                        approach: Approach::Nudge(6),
                        rotate: forward(486),
                        release: SeedRelease { nominal: 486, last: 275 },
                        row_index: RowIndex::Current,
                    },
                ],
                return_to_zero: 200,
            },
        }
    }
}

fn forward(steps: u32) -> Rotate {
    Rotate {
        steps,
        direction: Direction::Forward,
    }
}

impl FromStr for Recipe {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Recipe::from_name(s)
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.index(), self.name())
    }
}
