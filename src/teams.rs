//! Team formation and turn rotation
//!
//! This module handles spreading players across a fixed number of teams and
//! rotating which player of each team is active. Team assignment is sticky:
//! once a player has a team, rebalancing never moves them, so teams can drift
//! apart in size as players join late.

use std::collections::BTreeMap;

use itertools::Itertools;

use crate::player::{Player, Players, UserId};

/// Active player for each team, keyed by team index
pub type ActivePlayers = BTreeMap<usize, UserId>;

/// Number of players on each team in `0..number_of_teams`
///
/// Players whose team index is out of range are not counted.
pub fn team_sizes(players: &Players, number_of_teams: usize) -> Vec<usize> {
    let mut sizes = vec![0; number_of_teams];
    for team in players.iter().filter_map(|p| p.team) {
        if let Some(size) = sizes.get_mut(team) {
            *size += 1;
        }
    }
    sizes
}

/// Ids of the players on `team`, in iteration order
pub fn roster(players: &Players, team: usize) -> Vec<UserId> {
    players
        .on_team(team)
        .map(|p| p.user_id.clone())
        .collect_vec()
}

/// Assigns every unassigned player to the currently smallest team
///
/// Players are handled in iteration order. Ties go to the lowest team index,
/// and sizes are updated after each assignment so one pass spreads players
/// evenly. Already assigned players are left alone.
///
/// # Returns
///
/// The assignments made, empty when there was nobody to assign
pub fn assign_unassigned(players: &mut Players, number_of_teams: usize) -> Vec<(UserId, usize)> {
    if number_of_teams == 0 {
        return Vec::new();
    }

    let mut sizes = team_sizes(players, number_of_teams);
    let mut assignments = Vec::new();

    for player in players.iter_mut().filter(|p| p.team.is_none()) {
        let Some(smallest) = sizes.iter().position_min() else {
            break;
        };
        player.team = Some(smallest);
        sizes[smallest] += 1;
        assignments.push((player.user_id.clone(), smallest));
    }

    assignments
}

/// Moves `team`'s active player one step along its roster
///
/// The next index is `min(len - 1, max(0, current + 1))`, where a missing or
/// unknown active player counts as index `-1`. Rotation therefore clamps at
/// the last player instead of wrapping. A team without players loses its
/// entry.
///
/// # Returns
///
/// The new active player of the team, if any
pub fn advance_active_player(
    players: &Players,
    active: &mut ActivePlayers,
    team: usize,
) -> Option<UserId> {
    let roster = roster(players, team);
    let Some(last) = roster.len().checked_sub(1) else {
        active.remove(&team);
        return None;
    };

    let next_index = active
        .get(&team)
        .and_then(|current| roster.iter().position(|id| id == current))
        .map_or(0, |index| index + 1)
        .min(last);

    let next = roster[next_index].clone();
    active.insert(team, next.clone());
    Some(next)
}

/// Passes the turn to the next team and moves every team's active player
///
/// The team pointer wraps modulo `number_of_teams`; every team that has an
/// entry in `active` advances, not just the newly current one.
pub fn advance_team_and_player(
    players: &Players,
    active: &mut ActivePlayers,
    current_team: &mut usize,
    number_of_teams: usize,
) {
    if number_of_teams > 0 {
        *current_team = (*current_team + 1) % number_of_teams;
    }

    for team in active.keys().copied().collect_vec() {
        advance_active_player(players, active, team);
    }
}

/// The player whose turn it is on `team`
///
/// Falls back to the first player on the team when the team has no active
/// player entry.
pub fn active_player<'a>(
    players: &'a Players,
    active: &ActivePlayers,
    team: usize,
) -> Option<&'a Player> {
    match active.get(&team) {
        Some(user_id) => players.get(user_id),
        None => players.on_team(team).next(),
    }
}

/// Gives every populated team without an active player its roster head
///
/// # Returns
///
/// Whether any entry was added
pub fn seed_active_players(
    players: &Players,
    active: &mut ActivePlayers,
    number_of_teams: usize,
) -> bool {
    let mut seeded = false;
    for team in 0..number_of_teams {
        if active.contains_key(&team) {
            continue;
        }
        if let Some(head) = players.on_team(team).next() {
            active.insert(team, head.user_id.clone());
            seeded = true;
        }
    }
    seeded
}

/// Drops active-player entries that point at `user_id`
pub fn forget_player(active: &mut ActivePlayers, user_id: &UserId) {
    active.retain(|_, id| id != user_id);
}
