//! Core game logic and state management
//!
//! This module contains the game record and every transition on it: word
//! collection, the readiness gate out of setup, timed turns, round
//! progression, team rotation, scoring and restarting. A `Game` is built
//! fresh from the latest stored snapshot on every change, mutated in memory,
//! and written back whole.

use std::{collections::BTreeMap, time::Duration};

use serde::{Deserialize, Serialize};
use web_time::SystemTime;

use crate::{
    config::{Options, TurnTiming},
    constants,
    phase::Phase,
    player::{Player, Players, UserId},
    teams::{self, ActivePlayers},
    words::{self, WordEntry},
};

/// What [`Game::start_turn`] ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStart {
    /// The guess window was scheduled
    Started,
    /// The round's pool was empty, so the next round began instead
    NextRound,
}

/// A single match
///
/// Field names match the stored record. Absent optional fields are written
/// as `null` rather than omitted so a merging writer clears them.
#[serde_with::serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Game {
    /// Display name of the game
    pub name: Option<String>,
    /// Lifecycle phase; only moves forward except on restart
    pub phase: Phase,
    /// Number of teams players are spread across
    pub number_of_teams: usize,
    /// Everyone who joined
    pub players: Players,
    /// All submitted words, in submission order
    pub words: Vec<WordEntry>,
    /// How many times the word pool has been replenished
    pub round: u32,
    /// Words not yet guessed this round; the head is the current word
    pub remaining_words_in_round: Vec<WordEntry>,
    /// Team whose turn it is
    pub current_team: usize,
    /// Active player of each team
    pub current_player_by_team: ActivePlayers,
    /// Team scores, keyed by team index
    pub scores: BTreeMap<usize, u64>,
    /// Whether a turn's guess window is open
    pub is_playing: bool,
    /// When the current turn's guess window opens
    #[serde_as(as = "Option<serde_with::TimestampMilliSeconds<i64>>")]
    pub turn_starts_at: Option<SystemTime>,
    /// When the current turn's guess window closes
    #[serde_as(as = "Option<serde_with::TimestampMilliSeconds<i64>>")]
    pub turn_ends_at: Option<SystemTime>,
    /// Link to the video call the players are on
    pub video_chat_url: Option<String>,
}

impl Default for Game {
    fn default() -> Self {
        Self::with_options(&Options::default())
    }
}

// Players and scoring
impl Game {
    /// Creates an empty game in setup
    pub fn with_options(options: &Options) -> Self {
        Self {
            name: None,
            phase: Phase::Setup,
            number_of_teams: options.number_of_teams,
            players: Players::default(),
            words: Vec::new(),
            round: 0,
            remaining_words_in_round: Vec::new(),
            current_team: 0,
            current_player_by_team: ActivePlayers::new(),
            scores: BTreeMap::new(),
            is_playing: false,
            turn_starts_at: None,
            turn_ends_at: None,
            video_chat_url: None,
        }
    }

    /// Repairs values a stored record may carry that break invariants
    ///
    /// A zero team count falls back to the default and one above
    /// [`constants::game::MAX_NUMBER_OF_TEAMS`] is capped there. The team
    /// pointer is brought into range, and active-player entries that do not
    /// point at a member of their team are dropped.
    pub fn normalize(&mut self) {
        if self.number_of_teams == 0 {
            log::warn!("record has no teams, using the default team count");
            self.number_of_teams = constants::game::DEFAULT_NUMBER_OF_TEAMS;
        } else if self.number_of_teams > constants::game::MAX_NUMBER_OF_TEAMS {
            log::warn!(
                "record has {} teams, capping at {}",
                self.number_of_teams,
                constants::game::MAX_NUMBER_OF_TEAMS
            );
            self.number_of_teams = constants::game::MAX_NUMBER_OF_TEAMS;
        }

        if self.current_team >= self.number_of_teams {
            log::warn!(
                "current team {} is out of range for {} teams",
                self.current_team,
                self.number_of_teams
            );
            self.current_team %= self.number_of_teams;
        }

        let players = &self.players;
        self.current_player_by_team.retain(|team, user_id| {
            let valid = players.get(user_id).is_some_and(|p| p.team == Some(*team));
            if !valid {
                log::warn!("dropping active player '{user_id}' of team {team}");
            }
            valid
        });
    }

    /// Adds a player, replacing any player with the same id
    ///
    /// A replaced player who changes team stops being their old team's
    /// active player.
    pub fn add_player(&mut self, player: Player) {
        let team = player.team;
        let replaced = self.players.insert(player);
        if let Some(replaced) = replaced.filter(|replaced| replaced.team != team) {
            teams::forget_player(&mut self.current_player_by_team, &replaced.user_id);
        }
    }

    /// Removes a player and any active-player entry pointing at them
    pub fn remove_player(&mut self, user_id: &UserId) -> Option<Player> {
        teams::forget_player(&mut self.current_player_by_team, user_id);
        self.players.remove(user_id)
    }

    /// Looks up a player
    pub fn player(&self, user_id: &UserId) -> Option<&Player> {
        self.players.get(user_id)
    }

    /// Looks up a player for mutation
    pub fn player_mut(&mut self, user_id: &UserId) -> Option<&mut Player> {
        self.players.get_mut(user_id)
    }

    /// All players, in iteration order
    pub fn players_list(&self) -> impl Iterator<Item = &Player> {
        self.players.iter()
    }

    /// Whether every player is exactly in `phase`
    pub fn all_players_in_phase(&self, phase: Phase) -> bool {
        self.players.iter().all(|p| p.phase == phase)
    }

    /// Credits one guessed word to a player and their team
    ///
    /// # Returns
    ///
    /// `false` if no such player exists
    pub fn increment_score(&mut self, user_id: &UserId) -> bool {
        let Some(player) = self.players.get_mut(user_id) else {
            return false;
        };
        if let Some(team) = player.team {
            *self.scores.entry(team).or_default() += 1;
        }
        player.increment_score();
        true
    }

    /// Score of `team`, zero if it has not scored
    pub fn team_score(&self, team: usize) -> u64 {
        self.scores.get(&team).copied().unwrap_or_default()
    }
}

// Words and rounds
impl Game {
    /// Adds a submitted word
    ///
    /// # Returns
    ///
    /// `false` without changing anything if the submitter already submitted
    /// the same word, ignoring case and surrounding whitespace
    pub fn add_word(&mut self, entry: WordEntry) -> bool {
        words::push_unique(&mut self.words, entry)
    }

    /// Removes a guessed word from this round's pool
    ///
    /// # Returns
    ///
    /// Whether a matching entry was in the pool
    pub fn complete_word(&mut self, entry: &WordEntry) -> bool {
        let removed = words::remove_first(&mut self.remaining_words_in_round, entry);
        log::debug!(
            "completing '{}' from {}: removed={removed}, {} left",
            entry.word,
            entry.user_id,
            self.remaining_words_in_round.len()
        );
        removed
    }

    /// The word currently being guessed
    pub fn current_word(&self) -> Option<&WordEntry> {
        self.remaining_words_in_round.first()
    }

    /// Refills the pool with a fresh shuffle of every word and counts a round
    pub fn move_to_next_round(&mut self) {
        self.remaining_words_in_round = words::shuffled(&self.words);
        self.round += 1;
        log::debug!(
            "starting round {} with {} words",
            self.round,
            self.remaining_words_in_round.len()
        );
    }

    /// Words submitted by `user_id`
    pub fn words_by_user(&self, user_id: &UserId) -> Vec<&WordEntry> {
        words::by_user(&self.words, user_id)
    }

    /// Words submitted by `user_id`, or none when there is no user
    pub fn words_for_user(&self, user_id: Option<&UserId>) -> Vec<&WordEntry> {
        user_id.map_or_else(Vec::new, |id| self.words_by_user(id))
    }
}

// Turns and teams
impl Game {
    /// Starts a turn using the current time
    ///
    /// See [`Game::start_turn_at`].
    pub fn start_turn(&mut self, timing: &TurnTiming) -> TurnStart {
        self.start_turn_at(timing, SystemTime::now())
    }

    /// Starts a turn as of `now`
    ///
    /// With an empty pool this starts the next round instead and leaves the
    /// turn closed. Otherwise the guess window opens after the countdown and
    /// closes `turn_duration` later. Both deadlines are advisory; whoever
    /// watches them calls [`Game::end_turn`].
    pub fn start_turn_at(&mut self, timing: &TurnTiming, now: SystemTime) -> TurnStart {
        if self.remaining_words_in_round.is_empty() {
            self.move_to_next_round();
            return TurnStart::NextRound;
        }

        self.is_playing = true;
        self.turn_starts_at = Some(now + timing.countdown);
        self.turn_ends_at = Some(now + timing.total());
        log::debug!("turn started for team {}", self.current_team);
        TurnStart::Started
    }

    /// Closes the turn and hands over to the next team and players
    pub fn end_turn(&mut self) {
        log::debug!("ending turn of team {}", self.current_team);
        self.is_playing = false;
        self.turn_starts_at = None;
        self.turn_ends_at = None;
        self.advance_team_and_player();
    }

    /// Whether the open turn's guess window has closed as of `now`
    pub fn is_turn_expired(&self, now: SystemTime) -> bool {
        self.is_playing && self.turn_ends_at.is_some_and(|ends_at| now >= ends_at)
    }

    /// Time left in the open turn's guess window as of `now`
    pub fn turn_time_remaining(&self, now: SystemTime) -> Option<Duration> {
        if !self.is_playing {
            return None;
        }
        self.turn_ends_at
            .map(|ends_at| ends_at.duration_since(now).unwrap_or_default())
    }

    /// The player whose turn it is on the current team
    pub fn active_player(&self) -> Option<&Player> {
        teams::active_player(
            &self.players,
            &self.current_player_by_team,
            self.current_team,
        )
    }

    /// Moves `team`'s active player one step, clamping at the last player
    pub fn advance_active_player(&mut self, team: usize) -> Option<UserId> {
        teams::advance_active_player(&self.players, &mut self.current_player_by_team, team)
    }

    /// Moves the turn to the next team and every team's pointer forward
    pub fn advance_team_and_player(&mut self) {
        teams::advance_team_and_player(
            &self.players,
            &mut self.current_player_by_team,
            &mut self.current_team,
            self.number_of_teams,
        );
    }

    /// Puts every player without a team on the smallest team
    ///
    /// # Returns
    ///
    /// Whether anyone was assigned
    pub fn assign_unassigned_players(&mut self) -> bool {
        let assignments = teams::assign_unassigned(&mut self.players, self.number_of_teams);
        for (user_id, team) in &assignments {
            log::debug!("assigned '{user_id}' to team {team}");
        }
        !assignments.is_empty()
    }

    /// Assigns unassigned players, then seeds missing active players
    ///
    /// # Returns
    ///
    /// Whether either step changed anything
    pub fn form_teams(&mut self) -> bool {
        let assigned = self.assign_unassigned_players();
        let seeded = self.seed_active_players();
        assigned || seeded
    }

    /// Gives populated teams without an active player their roster head
    pub fn seed_active_players(&mut self) -> bool {
        teams::seed_active_players(
            &self.players,
            &mut self.current_player_by_team,
            self.number_of_teams,
        )
    }
}

// Lifecycle
impl Game {
    /// Leaves setup once enough players are all ready
    ///
    /// Only applies in setup, with at least two players, every one of them
    /// past the game's phase. The first round's pool is an unshuffled copy of
    /// the words.
    ///
    /// # Returns
    ///
    /// Whether the phase advanced
    pub fn try_advance_phase(&mut self) -> bool {
        if self.phase != Phase::Setup {
            return false;
        }
        if self.players.len() < constants::game::MIN_PLAYER_COUNT {
            log::debug!("not enough players to leave setup");
            return false;
        }
        if let Some(waiting) = self.players.iter().find(|p| !p.is_past(self.phase)) {
            log::debug!("player '{}' is not ready", waiting.user_id);
            return false;
        }

        self.phase = self.phase.next();
        self.remaining_words_in_round = self.words.clone();
        true
    }

    /// Ends the game
    pub fn finish(&mut self) {
        self.phase = Phase::Finished;
        self.is_playing = false;
        self.turn_starts_at = None;
        self.turn_ends_at = None;
    }

    /// Returns to setup with the same players and nothing else
    pub fn restart(&mut self) {
        self.phase = Phase::Setup;
        self.round = 0;
        for player in self.players.iter_mut() {
            player.reset();
        }
        self.scores.clear();
        self.current_team = 0;
        self.remaining_words_in_round.clear();
        self.words.clear();
        self.is_playing = false;
        self.turn_starts_at = None;
        self.turn_ends_at = None;
        self.current_player_by_team.clear();
    }
}
