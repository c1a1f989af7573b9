//! Relay channel configuration.

use serde::Deserialize;

/// Mapping of one logical relay channel to its physical output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RelayConfig {
    /// Logical channel (1..=8).
    pub channel: u8,
    /// Physical output line.
    pub line: u8,
}

impl RelayConfig {
    /// Highest relay channel on the board.
    pub const MAX_CHANNEL: u8 = 8;

    /// Create a channel mapping.
    pub const fn new(channel: u8, line: u8) -> Self {
        Self { channel, line }
    }
}
