//! Configuration constants for the Fishbowl game system
//!
//! This module contains the defaults and limits used throughout the game
//! system to keep records consistent and provide fixed boundaries for
//! turn timing and team formation.

/// Game-wide configuration constants
pub mod game {
    /// Number of teams a game is created with when none is configured
    pub const DEFAULT_NUMBER_OF_TEAMS: usize = 2;
    /// Largest number of teams a game may be configured with
    pub const MAX_NUMBER_OF_TEAMS: usize = 16;
    /// Fewest registered players needed before the game can leave setup
    pub const MIN_PLAYER_COUNT: usize = 2;
}

/// Turn timing configuration constants
pub mod turn {
    /// Pre-turn countdown in seconds before guessing opens
    pub const DEFAULT_COUNTDOWN: u64 = 10;
    /// Length of the guessing window in seconds
    pub const DEFAULT_DURATION: u64 = 60;
    /// Maximum countdown in seconds
    pub const MAX_COUNTDOWN: u64 = 60;
    /// Minimum guessing window in seconds
    pub const MIN_DURATION: u64 = 5;
    /// Maximum guessing window in seconds
    pub const MAX_DURATION: u64 = 600;
}
