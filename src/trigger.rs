//! Reactions to record changes
//!
//! Every write to a game record produces a [`Change`]. The [`Dispatcher`]
//! decodes the new snapshot, runs each [`Trigger`] in order against it, and
//! merges the result back in a single write if any of them changed something.
//! Triggers are guarded so that re-running them on their own output is a
//! no-op, which makes redelivered changes converge without extra writes.

use serde_json::Value;
use thiserror::Error;

use crate::{
    config::Options,
    game::Game,
    game_id::GameId,
    phase::Phase,
    store::{self, Document, RecordWriter, SnapshotReader},
};

/// Errors that can occur while handling a change
#[derive(Error, Debug)]
pub enum Error {
    /// The stored record does not match the game schema
    #[error("failed to decode game record: {0}")]
    Decode(#[source] serde_json::Error),
    /// The game could not be turned into a record
    #[error("failed to encode game record: {0}")]
    Encode(#[source] serde_json::Error),
    /// The game did not encode to a JSON object
    #[error("encoded game record is not an object")]
    NotAnObject,
    /// The store failed
    #[error(transparent)]
    Store(#[from] store::Error),
}

/// A write observed on a game record
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    /// The record that changed
    pub game_id: GameId,
    /// Contents before the write, absent if the record was created
    pub before: Option<Document>,
    /// Contents after the write, absent if the record was deleted
    pub after: Option<Document>,
}

impl Change {
    /// Creates a change notification
    pub fn new(game_id: GameId, before: Option<Document>, after: Option<Document>) -> Self {
        Self {
            game_id,
            before,
            after,
        }
    }
}

impl From<store::Write> for Change {
    fn from(write: store::Write) -> Self {
        Self::new(write.game_id, write.before, Some(write.after))
    }
}

/// A guarded transition run on every change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Leaves setup once enough players are ready
    UpdateGamePhase,
    /// Puts unassigned players on teams and picks each team's first player
    SetupTeams,
}

impl Trigger {
    /// Every trigger, in the order the dispatcher runs them
    pub const ALL: [Trigger; 2] = [Trigger::UpdateGamePhase, Trigger::SetupTeams];

    /// Runs the trigger against a snapshot
    ///
    /// # Returns
    ///
    /// The new snapshot if the trigger changed anything
    pub fn apply(self, game: &Game) -> Option<Game> {
        let mut next = game.clone();
        let changed = match self {
            Trigger::UpdateGamePhase => {
                if game.phase != Phase::Setup {
                    log::info!("game is not in setup, nothing to advance");
                    return None;
                }
                next.try_advance_phase()
            }
            Trigger::SetupTeams => {
                if game.phase == Phase::Setup {
                    log::info!("game is in setup, teams are not formed yet");
                    return None;
                }
                next.form_teams()
            }
        };
        changed.then_some(next)
    }
}

/// Runs triggers on record changes and writes back their results
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    options: Options,
}

impl Dispatcher {
    /// Creates a dispatcher that fills in missing record settings from
    /// `options`
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    /// The options used for records that do not carry their own
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Handles one change notification
    ///
    /// A deleted record is ignored. Otherwise every trigger runs in turn on
    /// the output of the previous one, and the final snapshot is merged into
    /// the record once if anything changed.
    ///
    /// # Returns
    ///
    /// The snapshot that was written, or `None` if nothing was
    ///
    /// # Errors
    ///
    /// Returns `Error::Decode` for a record that is not a game, and
    /// `Error::Store` if the write fails. Failed changes can be retried with
    /// [`Dispatcher::reprocess`].
    pub fn handle<W>(&self, change: &Change, writer: &W) -> Result<Option<Game>, Error>
    where
        W: RecordWriter + ?Sized,
    {
        let Some(after) = &change.after else {
            log::info!("game {} was deleted, nothing to do", change.game_id);
            return Ok(None);
        };

        let mut game = self.decode(after.clone())?;
        let mut changed = false;
        for trigger in Trigger::ALL {
            if let Some(next) = trigger.apply(&game) {
                log::info!("{trigger:?} updated game {}", change.game_id);
                game = next;
                changed = true;
            }
        }

        if !changed {
            log::info!("game {} needs no update", change.game_id);
            return Ok(None);
        }

        log::info!("writing game {}", change.game_id);
        writer.merge(&change.game_id, encode(&game)?)?;
        Ok(Some(game))
    }

    /// Handles the latest stored snapshot of a record
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Dispatcher::handle`], plus `Error::Store`
    /// if the read fails.
    pub fn reprocess<S>(&self, game_id: &GameId, store: &S) -> Result<Option<Game>, Error>
    where
        S: SnapshotReader + RecordWriter + ?Sized,
    {
        let latest = store.read(game_id)?;
        let change = Change::new(game_id.clone(), latest.clone(), latest);
        self.handle(&change, store)
    }

    /// Builds a game from a stored record
    ///
    /// Top-level `null`s load as defaults, and a record without a team count
    /// takes the dispatcher's. Out-of-range values are then repaired with
    /// [`Game::normalize`].
    ///
    /// # Errors
    ///
    /// Returns `Error::Decode` if the record does not match the schema.
    pub fn decode(&self, mut document: Document) -> Result<Game, Error> {
        document.retain(|_, value| !value.is_null());
        let has_team_count = document.contains_key("numberOfTeams");
        let mut game: Game =
            serde_json::from_value(Value::Object(document)).map_err(Error::Decode)?;
        if !has_team_count {
            game.number_of_teams = self.options.number_of_teams;
        }
        game.normalize();
        Ok(game)
    }
}

/// Turns a game into a record with every field present
///
/// # Errors
///
/// Returns `Error::Encode` if serialization fails and `Error::NotAnObject`
/// if it does not produce an object.
pub fn encode(game: &Game) -> Result<Document, Error> {
    match serde_json::to_value(game).map_err(Error::Encode)? {
        Value::Object(document) => Ok(document),
        _ => Err(Error::NotAnObject),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        constants::game::MAX_NUMBER_OF_TEAMS, player::Player, store::MemoryStore,
        words::WordEntry,
    };

    fn document(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    fn ready_game() -> Game {
        let mut game = Game::default();
        for id in ["alice", "bob"] {
            let mut player = Player::new(id);
            player.mark_ready();
            game.add_player(player);
        }
        game.add_word(WordEntry::new("ocean", "alice"));
        game.add_word(WordEntry::new("river", "bob"));
        game
    }

    #[test]
    fn test_update_game_phase_advances_ready_game() {
        let game = ready_game();
        let next = Trigger::UpdateGamePhase.apply(&game).unwrap();
        assert_eq!(next.phase, Phase::InProgress);
        assert_eq!(next.remaining_words_in_round, game.words);
        assert!(Trigger::UpdateGamePhase.apply(&next).is_none());
    }

    #[test]
    fn test_update_game_phase_waits_for_players() {
        let mut game = ready_game();
        game.add_player(Player::new("carol"));
        assert!(Trigger::UpdateGamePhase.apply(&game).is_none());
    }

    #[test]
    fn test_setup_teams_skips_setup() {
        let game = ready_game();
        assert!(Trigger::SetupTeams.apply(&game).is_none());
    }

    #[test]
    fn test_setup_teams_assigns_and_seeds() {
        let mut game = ready_game();
        game.phase = Phase::InProgress;

        let next = Trigger::SetupTeams.apply(&game).unwrap();

        assert_eq!(next.player(&"alice".into()).unwrap().team, Some(0));
        assert_eq!(next.player(&"bob".into()).unwrap().team, Some(1));
        assert_eq!(next.current_player_by_team.get(&0), Some(&"alice".into()));
        assert_eq!(next.current_player_by_team.get(&1), Some(&"bob".into()));
        assert!(Trigger::SetupTeams.apply(&next).is_none());
    }

    #[test]
    fn test_handle_deleted_record_does_not_write() {
        let store = MemoryStore::new();
        let change = Change::new(GameId::new(), Some(encode(&ready_game()).unwrap()), None);

        assert!(Dispatcher::default().handle(&change, &store).unwrap().is_none());
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_handle_writes_once_with_every_trigger_applied() {
        let store = MemoryStore::new();
        let id = GameId::new();
        let record = encode(&ready_game()).unwrap();
        store.insert(id.clone(), record.clone());

        let written = Dispatcher::default()
            .handle(&Change::new(id.clone(), None, Some(record)), &store)
            .unwrap()
            .unwrap();

        assert_eq!(store.write_count(), 1);
        assert_eq!(written.phase, Phase::InProgress);
        assert!(written.players_list().all(|p| p.team.is_some()));
        assert_eq!(written.current_player_by_team.len(), 2);

        let stored = store.get(&id).unwrap();
        assert_eq!(stored["phase"], 1);
        assert_eq!(stored["currentPlayerByTeam"]["0"], "alice");
    }

    #[test]
    fn test_handle_redelivered_change_does_not_write_again() {
        let store = MemoryStore::new();
        let id = GameId::new();
        let dispatcher = Dispatcher::default();
        store.insert(id.clone(), encode(&ready_game()).unwrap());

        dispatcher.reprocess(&id, &store).unwrap();
        let settled = store.take_writes().pop().unwrap();
        let change = Change::from(settled);

        assert!(dispatcher.handle(&change, &store).unwrap().is_none());
        assert!(dispatcher.handle(&change, &store).unwrap().is_none());
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_handle_rejects_malformed_record() {
        let store = MemoryStore::new();
        let change = Change::new(
            GameId::new(),
            None,
            Some(document(json!({"phase": 9}))),
        );

        assert!(matches!(
            Dispatcher::default().handle(&change, &store),
            Err(Error::Decode(_))
        ));
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_decode_fills_team_count_from_options() {
        let dispatcher = Dispatcher::new(Options {
            number_of_teams: 4,
            ..Options::default()
        });

        let game = dispatcher.decode(document(json!({"currentTeam": 6}))).unwrap();
        assert_eq!(game.number_of_teams, 4);
        assert_eq!(game.current_team, 2);

        let game = dispatcher
            .decode(document(json!({"numberOfTeams": 0})))
            .unwrap();
        assert_eq!(game.number_of_teams, 2);

        let game = dispatcher
            .decode(document(json!({"numberOfTeams": null, "phase": null})))
            .unwrap();
        assert_eq!(game.number_of_teams, 4);
        assert_eq!(game.phase, Phase::Setup);
    }

    #[test]
    fn test_handle_caps_oversized_team_count() {
        let store = MemoryStore::new();
        let id = GameId::new();
        let change = Change::new(
            id.clone(),
            None,
            Some(document(json!({
                "phase": 1,
                "numberOfTeams": 4_000_000_000_000_000_000_u64,
                "players": {"a": {"phase": 1}}
            }))),
        );

        let written = Dispatcher::default().handle(&change, &store).unwrap().unwrap();

        assert_eq!(written.number_of_teams, MAX_NUMBER_OF_TEAMS);
        assert_eq!(written.player(&"a".into()).unwrap().team, Some(0));
        assert_eq!(store.get(&id).unwrap()["numberOfTeams"], MAX_NUMBER_OF_TEAMS);
    }

    #[test]
    fn test_encode_writes_absent_optionals_as_null() {
        let record = encode(&Game::default()).unwrap();
        assert_eq!(record.get("turnStartsAt"), Some(&Value::Null));
        assert_eq!(record.get("turnEndsAt"), Some(&Value::Null));
        assert_eq!(record.get("name"), Some(&Value::Null));
    }
}
