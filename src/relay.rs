//! Relay Bank.
//!
//! Maps logical relay channels to output pins and drives them with a fixed
//! polarity: closing (energizing) a relay drives the configured active
//! level, opening drives the inverse. Setting the same mode twice is not an
//! error and leaves the line where it was.

use core::fmt;
use core::str::FromStr;
use std::sync::Arc;

use embedded_hal::digital::OutputPin;

use crate::cancel::CancellationToken;
use crate::config::units::Level;
use crate::config::MachineConfig;
use crate::error::{Error, RelayError, Result};
use crate::hal::{GpioBus, LinePin};

/// Requested relay state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayMode {
    /// De-energized.
    Open,
    /// Energized.
    Close,
}

impl RelayMode {
    /// Parse a mode name, case-insensitively.
    ///
    /// `close`/`closed`/`on` close the relay, `open`/`off` open it.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "close" | "closed" | "on" => Ok(RelayMode::Close),
            "open" | "off" => Ok(RelayMode::Open),
            _ => Err(RelayError::InvalidMode(s.to_string()).into()),
        }
    }
}

impl FromStr for RelayMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        RelayMode::parse(s)
    }
}

impl fmt::Display for RelayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayMode::Open => f.write_str("Open"),
            RelayMode::Close => f.write_str("Close"),
        }
    }
}

struct RelayChannel<P> {
    channel: u8,
    line: u8,
    pin: P,
    mode: RelayMode,
}

/// The machine's relay outputs.
pub struct RelayBank<P: OutputPin> {
    channels: heapless::Vec<RelayChannel<P>, 8>,
    active_level: Level,
}

impl RelayBank<LinePin> {
    /// Configure every mapped line as an output in the open state.
    pub fn from_config(config: &MachineConfig, gpio: &Arc<dyn GpioBus>) -> Result<Self> {
        let open_level = config.relay_active_level.inverse().pin_state();
        let mut bank = Self::new(config.relay_active_level);
        for relay in config.relays.iter() {
            tracing::debug!(channel = relay.channel, line = relay.line, "Relay channel configured");
            let pin = LinePin::configure(gpio.clone(), relay.line, open_level).map_err(|_| {
                RelayError::LineFault {
                    channel: relay.channel,
                    line: relay.line,
                }
            })?;
            bank.add_channel(relay.channel, relay.line, pin)?;
        }
        Ok(bank)
    }
}

impl<P: OutputPin> RelayBank<P> {
    /// Create an empty bank.
    pub fn new(active_level: Level) -> Self {
        Self {
            channels: heapless::Vec::new(),
            active_level,
        }
    }

    /// Map `channel` to an already-configured pin, assumed open.
    ///
    /// # Errors
    ///
    /// `InvalidChannel`/`DuplicateChannel` for a bad or repeated channel.
    pub fn add_channel(&mut self, channel: u8, line: u8, pin: P) -> Result<()> {
        if self.channels.iter().any(|c| c.channel == channel) {
            return Err(crate::error::ConfigError::DuplicateChannel(channel).into());
        }
        self.channels
            .push(RelayChannel {
                channel,
                line,
                pin,
                mode: RelayMode::Open,
            })
            .map_err(|_| crate::error::ConfigError::InvalidChannel(channel))?;
        Ok(())
    }

    /// Drive a relay.
    ///
    /// # Errors
    ///
    /// `Cancelled` if a stop is pending (no I/O is performed),
    /// `UnknownChannel` if the channel is not mapped, `LineFault` if the
    /// write fails.
    pub fn set_relay(&mut self, channel: u8, mode: RelayMode, token: &CancellationToken) -> Result<()> {
        token.check()?;
        self.drive(channel, mode)
    }

    /// Drive a relay from a mode name such as `"Close"` or `"off"`.
    ///
    /// # Errors
    ///
    /// As [`set_relay`](Self::set_relay), plus `InvalidMode`.
    pub fn set_relay_named(&mut self, channel: u8, mode: &str, token: &CancellationToken) -> Result<()> {
        token.check()?;
        if !self.contains(channel) {
            return Err(RelayError::UnknownChannel(channel).into());
        }
        self.drive(channel, RelayMode::parse(mode)?)
    }

    /// Drive a relay without consulting the cancellation token.
    ///
    /// Reserved for the cleanup path.
    pub fn drive(&mut self, channel: u8, mode: RelayMode) -> Result<()> {
        let active_level = self.active_level;
        let relay = self
            .channels
            .iter_mut()
            .find(|c| c.channel == channel)
            .ok_or(RelayError::UnknownChannel(channel))?;

        let level = match mode {
            RelayMode::Close => active_level,
            RelayMode::Open => active_level.inverse(),
        };
        tracing::debug!(channel, line = relay.line, mode = %mode, "Relay set");

        relay.pin.set_state(level.pin_state()).map_err(|_| RelayError::LineFault {
            channel,
            line: relay.line,
        })?;
        relay.mode = mode;
        Ok(())
    }

    /// Open every relay, ignoring the cancellation token.
    ///
    /// Every channel is attempted; the first failure is returned.
    pub fn open_all(&mut self) -> Result<()> {
        let mut first_error = None;
        let channels: heapless::Vec<u8, 8> = self.channels.iter().map(|c| c.channel).collect();
        for channel in channels {
            if let Err(e) = self.drive(channel, RelayMode::Open) {
                tracing::warn!(channel, error = %e, "Failed to open relay");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Last mode driven on a channel.
    pub fn mode(&self, channel: u8) -> Option<RelayMode> {
        self.channels
            .iter()
            .find(|c| c.channel == channel)
            .map(|c| c.mode)
    }

    /// Check whether a channel is mapped.
    pub fn contains(&self, channel: u8) -> bool {
        self.channels.iter().any(|c| c.channel == channel)
    }

    /// Mapped channels in configuration order.
    pub fn channels(&self) -> impl Iterator<Item = u8> + '_ {
        self.channels.iter().map(|c| c.channel)
    }
}
