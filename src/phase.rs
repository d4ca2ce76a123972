//! Game and player lifecycle phases

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where a game, or a single player's readiness, stands in the lifecycle
///
/// Phases are ordered, and stored records carry them as their integer value
/// (`0`, `1`, `2`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum Phase {
    /// Players are joining and submitting words
    #[default]
    Setup = 0,
    /// Turns are being played
    InProgress = 1,
    /// The game is over
    Finished = 2,
}

/// Errors that can occur when decoding a phase
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The stored integer does not name a phase
    #[error("unknown phase {0}")]
    Unknown(u8),
}

impl Phase {
    /// The following phase, saturating at [`Phase::Finished`]
    pub fn next(self) -> Self {
        match self {
            Self::Setup => Self::InProgress,
            Self::InProgress | Self::Finished => Self::Finished,
        }
    }
}

impl From<Phase> for u8 {
    fn from(phase: Phase) -> Self {
        phase as u8
    }
}

impl TryFrom<u8> for Phase {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Setup),
            1 => Ok(Self::InProgress),
            2 => Ok(Self::Finished),
            other => Err(Error::Unknown(other)),
        }
    }
}
