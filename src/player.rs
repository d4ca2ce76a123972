//! Players and the player collection of a game
//!
//! Players are keyed by their user id. The collection iterates in ascending
//! id order, which is the order team rosters are built in, so turn rotation
//! is deterministic for a given record.

use std::collections::{BTreeMap, btree_map};

use serde::{Deserialize, Serialize, Serializer};

use crate::phase::Phase;

/// The identifier of a user, unique within a game
#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(transparent)]
pub struct UserId(String);

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl UserId {
    /// Creates a user id from anything string-like
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A participant in a game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Primary key of the player within the game
    #[serde(default)]
    pub user_id: UserId,
    /// Name shown to other players
    #[serde(default)]
    pub display_name: Option<String>,
    /// Readiness marker; a player is ready once it is past the game's phase
    #[serde(default)]
    pub phase: Phase,
    /// Assigned team index, `None` while unassigned
    #[serde(default)]
    pub team: Option<usize>,
    /// Words this player has guessed correctly
    #[serde(default)]
    pub score: u64,
}

impl Player {
    /// Creates an unassigned player in setup with no score
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: None,
            phase: Phase::Setup,
            team: None,
            score: 0,
        }
    }

    /// Sets the display name, builder style
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Records one more correctly guessed word
    pub fn increment_score(&mut self) {
        self.score += 1;
    }

    /// Moves the player's readiness marker
    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    /// Marks the player as ready to leave setup
    pub fn mark_ready(&mut self) {
        self.phase = self.phase.max(Phase::Setup.next());
    }

    /// Whether this player has signalled readiness past `phase`
    pub fn is_past(&self, phase: Phase) -> bool {
        self.phase > phase
    }

    /// Clears team, score and readiness so the player can play a fresh game
    pub fn reset(&mut self) {
        self.team = None;
        self.score = 0;
        self.phase = Phase::Setup;
    }
}

/// Serialization helper for Players struct
#[derive(Deserialize)]
#[serde(transparent)]
struct PlayersSerde {
    mapping: BTreeMap<UserId, Player>,
}

/// All players of a game, keyed by user id
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "PlayersSerde")]
pub struct Players {
    mapping: BTreeMap<UserId, Player>,
}

impl From<PlayersSerde> for Players {
    /// Rebuilds the collection from a stored map
    ///
    /// The map key is authoritative: a nested player whose `userId` is
    /// missing or disagrees with its key takes the key.
    fn from(serde: PlayersSerde) -> Self {
        let PlayersSerde { mut mapping } = serde;
        for (id, player) in &mut mapping {
            if player.user_id != *id {
                if !player.user_id.is_empty() {
                    log::warn!(
                        "player stored under '{id}' claims id '{}', using the key",
                        player.user_id
                    );
                }
                player.user_id = id.clone();
            }
        }
        Self { mapping }
    }
}

impl Serialize for Players {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.mapping.serialize(serializer)
    }
}

impl Players {
    /// Inserts or replaces the player under its own user id
    pub fn insert(&mut self, player: Player) -> Option<Player> {
        self.mapping.insert(player.user_id.clone(), player)
    }

    /// Removes a player, returning it if it was present
    pub fn remove(&mut self, user_id: &UserId) -> Option<Player> {
        self.mapping.remove(user_id)
    }

    /// Looks up a player
    pub fn get(&self, user_id: &UserId) -> Option<&Player> {
        self.mapping.get(user_id)
    }

    /// Looks up a player for mutation
    pub fn get_mut(&mut self, user_id: &UserId) -> Option<&mut Player> {
        self.mapping.get_mut(user_id)
    }

    /// Whether a player with this id exists
    pub fn contains(&self, user_id: &UserId) -> bool {
        self.mapping.contains_key(user_id)
    }

    /// Number of players
    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    /// Whether the game has no players
    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// Players in iteration order
    pub fn iter(&self) -> btree_map::Values<'_, UserId, Player> {
        self.mapping.values()
    }

    /// Players in iteration order, mutably
    pub fn iter_mut(&mut self) -> btree_map::ValuesMut<'_, UserId, Player> {
        self.mapping.values_mut()
    }

    /// Players assigned to `team`, in iteration order
    pub fn on_team(&self, team: usize) -> impl Iterator<Item = &Player> {
        self.iter().filter(move |p| p.team == Some(team))
    }
}

impl<'a> IntoIterator for &'a Players {
    type Item = &'a Player;
    type IntoIter = btree_map::Values<'a, UserId, Player>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Player> for Players {
    fn from_iter<I: IntoIterator<Item = Player>>(iter: I) -> Self {
        let mut players = Self::default();
        for player in iter {
            players.insert(player);
        }
        players
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_new_player_defaults() {
        let player = Player::new("alice");
        assert_eq!(player.user_id, UserId::new("alice"));
        assert_eq!(player.phase, Phase::Setup);
        assert_eq!(player.team, None);
        assert_eq!(player.score, 0);
        assert_eq!(player.display_name, None);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut player = Player::new("alice").with_display_name("Alice");
        player.team = Some(1);
        player.increment_score();
        player.increment_score();
        player.mark_ready();

        player.reset();

        assert_eq!(player.team, None);
        assert_eq!(player.score, 0);
        assert_eq!(player.phase, Phase::Setup);
        assert_eq!(player.display_name.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_mark_ready_never_moves_backwards() {
        let mut player = Player::new("alice");
        player.mark_ready();
        assert!(player.is_past(Phase::Setup));

        player.set_phase(Phase::Finished);
        player.mark_ready();
        assert_eq!(player.phase, Phase::Finished);
    }

    #[test]
    fn test_players_iterate_in_id_order() {
        let players: Players = ["carol", "alice", "bob"].into_iter().map(Player::new).collect();
        let ids: Vec<&str> = players.iter().map(|p| p.user_id.as_str()).collect();
        assert_eq!(ids, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn test_on_team_filters() {
        let mut players: Players = ["a", "b", "c"].into_iter().map(Player::new).collect();
        players.get_mut(&"a".into()).unwrap().team = Some(0);
        players.get_mut(&"c".into()).unwrap().team = Some(0);
        players.get_mut(&"b".into()).unwrap().team = Some(1);

        let team_zero: Vec<&str> = players.on_team(0).map(|p| p.user_id.as_str()).collect();
        assert_eq!(team_zero, vec!["a", "c"]);
        assert_eq!(players.on_team(2).count(), 0);
    }

    #[test]
    fn test_deserialize_fills_missing_user_id_from_key() {
        let players: Players =
            serde_json::from_str(r#"{"alice": {"score": 2}, "bob": {"userId": "mallory"}}"#)
                .unwrap();

        let alice = players.get(&"alice".into()).unwrap();
        assert_eq!(alice.user_id.as_str(), "alice");
        assert_eq!(alice.score, 2);
        assert_eq!(alice.team, None);

        let bob = players.get(&"bob".into()).unwrap();
        assert_eq!(bob.user_id.as_str(), "bob");
    }

    #[test]
    fn test_serialize_as_keyed_map() {
        let mut player = Player::new("alice");
        player.team = Some(1);
        let players: Players = [player].into_iter().collect();

        let value = serde_json::to_value(&players).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "alice": {
                    "userId": "alice",
                    "displayName": null,
                    "phase": 0,
                    "team": 1,
                    "score": 0
                }
            })
        );
    }
}
