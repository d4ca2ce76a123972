//! Runtime configuration for a game session
//!
//! Options are validated with `garde` before a game is built from them, so
//! the state machine can rely on a non-zero team count and turn timings
//! inside the configured bounds.

use std::time::Duration;

use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::constants;

/// Validation result type for duration validation
type ValidationResult = garde::Result;

/// Validates that a duration falls within specified bounds, in whole seconds
fn validate_duration<const MIN_SECONDS: u64, const MAX_SECONDS: u64>(
    field: &'static str,
    val: &Duration,
) -> ValidationResult {
    if (MIN_SECONDS..=MAX_SECONDS).contains(&val.as_secs()) {
        Ok(())
    } else {
        Err(garde::Error::new(format!(
            "{field} is outside of the bounds [{MIN_SECONDS},{MAX_SECONDS}]",
        )))
    }
}

fn validate_countdown(val: &Duration) -> ValidationResult {
    validate_duration::<0, { constants::turn::MAX_COUNTDOWN }>("countdown", val)
}

fn validate_turn_duration(val: &Duration) -> ValidationResult {
    validate_duration::<{ constants::turn::MIN_DURATION }, { constants::turn::MAX_DURATION }>(
        "turn_duration",
        val,
    )
}

/// Timing of a single guessing turn
///
/// A turn opens with a countdown during which nobody guesses, followed by
/// the guessing window itself. Both are relative durations; the game turns
/// them into absolute deadlines when a turn starts.
#[serde_with::serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TurnTiming {
    /// Delay between starting a turn and opening the guess window
    #[garde(custom(|v, _| validate_countdown(v)))]
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub countdown: Duration,
    /// Length of the guess window
    #[garde(custom(|v, _| validate_turn_duration(v)))]
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub turn_duration: Duration,
}

impl Default for TurnTiming {
    fn default() -> Self {
        Self {
            countdown: Duration::from_secs(constants::turn::DEFAULT_COUNTDOWN),
            turn_duration: Duration::from_secs(constants::turn::DEFAULT_DURATION),
        }
    }
}

impl TurnTiming {
    /// Total time from starting a turn until its guess window closes
    pub fn total(&self) -> Duration {
        self.countdown + self.turn_duration
    }
}

/// Options a game session is created with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    /// Number of teams players are spread across
    #[garde(range(min = 1, max = constants::game::MAX_NUMBER_OF_TEAMS))]
    pub number_of_teams: usize,
    /// Countdown and guess window lengths
    #[garde(dive)]
    pub timing: TurnTiming,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            number_of_teams: constants::game::DEFAULT_NUMBER_OF_TEAMS,
            timing: TurnTiming::default(),
        }
    }
}
