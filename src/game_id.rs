//! Game ID generation and management
//!
//! A game id is the opaque key of a game record in the document store. Ids
//! minted here are UUID strings, but any non-empty key supplied by the store
//! is accepted as-is.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// The key of a game record
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(try_from = "String", into = "String")]
pub struct GameId(String);

/// Errors that can occur when parsing a game id
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The key was empty or only whitespace
    #[error("game id cannot be empty")]
    Empty,
}

impl GameId {
    /// Creates a new random game id
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for GameId {
    /// Creates a new random game id (same as `new()`)
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for GameId {
    type Err = Error;

    /// Accepts any key with visible characters
    ///
    /// # Errors
    ///
    /// Returns `Error::Empty` for an empty or blank key.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            Err(Error::Empty)
        } else {
            Ok(Self(s.to_owned()))
        }
    }
}

impl TryFrom<String> for GameId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim().is_empty() {
            Err(Error::Empty)
        } else {
            Ok(Self(value))
        }
    }
}

impl From<GameId> for String {
    fn from(id: GameId) -> Self {
        id.0
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_game_id_new_is_unique() {
        let a = GameId::new();
        let b = GameId::new();
        assert_ne!(a, b);
        assert!(Uuid::from_str(a.as_str()).is_ok());
    }

    #[test]
    fn test_game_id_from_str() {
        let id = GameId::from_str("abc123").unwrap();
        assert_eq!(id.as_str(), "abc123");
        assert_eq!(id.to_string(), "abc123");
    }

    #[test]
    fn test_game_id_rejects_blank() {
        assert_eq!(GameId::from_str(""), Err(Error::Empty));
        assert_eq!(GameId::from_str("   "), Err(Error::Empty));
    }

    #[test]
    fn test_game_id_serialization() {
        let id = GameId::from_str("room-7").unwrap();
        let serialized = serde_json::to_string(&id).unwrap();
        assert_eq!(serialized, "\"room-7\"");

        let deserialized: GameId = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, id);
    }

    #[test]
    fn test_game_id_deserialization_error() {
        assert!(serde_json::from_str::<GameId>("\"\"").is_err());
        assert!(serde_json::from_str::<GameId>("123").is_err());
    }
}
