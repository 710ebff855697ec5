//! Inbound control commands
//!
//! Commands arrive as plain strings from key bindings or other IPC clients,
//! e.g. `pair:3`, `solo:12`, `toggleLoudness`.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Highest accepted stereo pair number
pub const MAX_PAIR: u32 = 8;

/// Highest accepted solo channel number
pub const MAX_SOLO: u32 = 16;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("Command {0} needs an argument")]
    MissingArgument(&'static str),

    #[error("Invalid argument for {command}: {value}")]
    InvalidArgument { command: &'static str, value: String },

    #[error("Argument for {command} must be 1-{max}, got {value}")]
    ArgumentOutOfRange {
        command: &'static str,
        value: u32,
        max: u32,
    },
}

/// Named control command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Reset,
    Pair(u32),
    Solo(u32),
    ToggleLoudness,
    ShowAudioInfo,
    CycleDisplayMode,
    ToggleCountdown,
}

impl ControlCommand {
    /// Parse `name` or `name:arg`
    pub fn parse(input: &str) -> Result<Self, CommandError> {
        let input = input.trim();
        let (name, arg) = match input.split_once(':') {
            Some((name, arg)) => (name, Some(arg.trim())),
            None => (input, None),
        };

        match name {
            "reset" => Ok(ControlCommand::Reset),
            "pair" => index_arg("pair", arg, MAX_PAIR).map(ControlCommand::Pair),
            "solo" => index_arg("solo", arg, MAX_SOLO).map(ControlCommand::Solo),
            "toggleLoudness" => Ok(ControlCommand::ToggleLoudness),
            "showAudioInfo" => Ok(ControlCommand::ShowAudioInfo),
            "cycleDisplayMode" => Ok(ControlCommand::CycleDisplayMode),
            "toggleCountdown" => Ok(ControlCommand::ToggleCountdown),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ControlCommand::Reset => "reset",
            ControlCommand::Pair(_) => "pair",
            ControlCommand::Solo(_) => "solo",
            ControlCommand::ToggleLoudness => "toggleLoudness",
            ControlCommand::ShowAudioInfo => "showAudioInfo",
            ControlCommand::CycleDisplayMode => "cycleDisplayMode",
            ControlCommand::ToggleCountdown => "toggleCountdown",
        }
    }
}

fn index_arg(command: &'static str, arg: Option<&str>, max: u32) -> Result<u32, CommandError> {
    let arg = arg
        .filter(|a| !a.is_empty())
        .ok_or(CommandError::MissingArgument(command))?;
    let value = arg
        .parse::<u32>()
        .map_err(|_| CommandError::InvalidArgument {
            command,
            value: arg.to_string(),
        })?;
    if value == 0 || value > max {
        return Err(CommandError::ArgumentOutOfRange {
            command,
            value,
            max,
        });
    }
    Ok(value)
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlCommand::Pair(n) | ControlCommand::Solo(n) => write!(f, "{}:{}", self.name(), n),
            _ => f.write_str(self.name()),
        }
    }
}

impl FromStr for ControlCommand {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
