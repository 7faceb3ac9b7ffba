//! # Shift Timeline
//!
//! Rebuilds who was on the ice, second by second, from the sparse `change`
//! rows of one game.
//!
//! ## Algorithm
//! 1. Keep only `change` rows, in chronological order. Same-second rows
//!    without an `event_num` are ordered by content, so the winning roster
//!    does not depend on input order
//! 2. Lay out one slot per second over `[0, last second of the game]`
//! 3. Forward-fill: each second carries the roster of the latest change at
//!    or before it. A change replaces the whole roster, so a player absent
//!    from a later change is off the ice from that second on
//! 4. Re-derive the strength state from live skater counts (goalie excluded)
//! 5. Walk each side's `(second, player)` pairs and compress them into
//!    [`ShiftRecord`] intervals
//!
//! Second 0 holds the pre-game placeholder state and is never turned into
//! shifts. A game whose last event is at second 3600 therefore
//! yields at most 3600 on-ice seconds per player.

use crate::events::{Event, EventTable, EventType, GameStrength, PlayerId, Side, StrengthState};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Roster state during one second of play.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimelineSecond {
    pub second: u32,
    pub home_on: Vec<PlayerId>,
    pub away_on: Vec<PlayerId>,
    pub home_goalie: Option<PlayerId>,
    pub away_goalie: Option<PlayerId>,
    pub strength: StrengthState,
}

impl TimelineSecond {
    pub fn on_ice(&self, side: Side) -> &[PlayerId] {
        match side {
            Side::Home => &self.home_on,
            Side::Away => &self.away_on,
        }
    }
}

/// One continuous stretch on the ice: `[start_second, end_second)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShiftRecord {
    pub game_id: String,
    pub season: String,
    pub team: String,
    pub player_id: PlayerId,
    pub start_second: u32,
    pub end_second: u32,
}

impl ShiftRecord {
    pub fn duration(&self) -> u32 {
        self.end_second.saturating_sub(self.start_second)
    }
}

/// Per-second on-ice rosters for one game.
#[derive(Debug, Clone, Default)]
pub struct ShiftTimeline {
    pub game_id: String,
    pub season: String,
    pub home_team: String,
    pub away_team: String,
    seconds: Vec<TimelineSecond>,
}

impl ShiftTimeline {
    /// Build from every row of a single game. Rows of other games must not
    /// be mixed in.
    pub fn build<'a>(game: impl IntoIterator<Item = &'a Event>) -> Self {
        let game: Vec<&Event> = game.into_iter().collect();
        let Some(first) = game.first() else {
            return Self::default();
        };
        let mut timeline = Self {
            game_id: first.game_id.clone(),
            season: first.season.clone(),
            home_team: first.home_team_abbr.clone(),
            away_team: first.away_team_abbr.clone(),
            seconds: Vec::new(),
        };

        let mut changes: Vec<&Event> = game
            .iter()
            .copied()
            .filter(|e| e.event_type == EventType::Change)
            .collect();
        if changes.is_empty() {
            debug!(game_id = %timeline.game_id, "no change events; empty timeline");
            return timeline;
        }
        changes.sort_by(|a, b| a.chronological_cmp(b));

        let last_second = game.iter().map(|e| e.seconds_elapsed).max().unwrap_or(0);
        let mut state = TimelineSecond::default();
        let mut pending = changes.into_iter().peekable();
        timeline.seconds.reserve(last_second as usize + 1);

        for second in 0..=last_second {
            while let Some(change) = pending.next_if(|c| c.seconds_elapsed <= second) {
                state.home_on = dedup_slots(&change.home_on);
                state.away_on = dedup_slots(&change.away_on);
                state.home_goalie = change.home_goalie;
                state.away_goalie = change.away_goalie;
                state.strength = StrengthState::from_on_ice(
                    &state.away_on,
                    state.away_goalie,
                    &state.home_on,
                    state.home_goalie,
                );
            }
            state.second = second;
            timeline.seconds.push(state.clone());
        }
        timeline
    }

    /// One timeline per game, ordered by game id. With `parallel` the games
    /// are built on the rayon pool; the result is identical either way.
    pub fn build_all(table: &EventTable, parallel: bool) -> Vec<ShiftTimeline> {
        let mut games: BTreeMap<&str, Vec<&Event>> = BTreeMap::new();
        for event in table.events() {
            games.entry(event.game_id.as_str()).or_default().push(event);
        }
        if parallel {
            games
                .into_par_iter()
                .map(|(_, events)| ShiftTimeline::build(events))
                .collect()
        } else {
            games
                .into_values()
                .map(|events| ShiftTimeline::build(events))
                .collect()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.seconds.is_empty()
    }

    pub fn seconds(&self) -> &[TimelineSecond] {
        &self.seconds
    }

    pub fn team(&self, side: Side) -> &str {
        match side {
            Side::Home => &self.home_team,
            Side::Away => &self.away_team,
        }
    }

    /// Every shift of both sides.
    pub fn shifts(&self) -> Vec<ShiftRecord> {
        self.shifts_at(&GameStrength::All)
    }

    /// Shifts counting only seconds whose derived strength `strength`
    /// admits; an excluded second ends any open shift.
    pub fn shifts_at(&self, strength: &GameStrength) -> Vec<ShiftRecord> {
        let mut records = Vec::new();
        for side in Side::BOTH {
            let mut open: FxHashMap<PlayerId, u32> = FxHashMap::default();
            let close = |id: PlayerId, start: u32, end: u32, records: &mut Vec<ShiftRecord>| {
                records.push(ShiftRecord {
                    game_id: self.game_id.clone(),
                    season: self.season.clone(),
                    team: self.team(side).to_string(),
                    player_id: id,
                    start_second: start,
                    end_second: end,
                });
            };

            for sec in self.seconds.iter().skip(1) {
                let live: &[PlayerId] = if strength.admits(sec.strength) {
                    sec.on_ice(side)
                } else {
                    &[]
                };
                let ended: Vec<PlayerId> =
                    open.keys().copied().filter(|id| !live.contains(id)).collect();
                for id in ended {
                    if let Some(start) = open.remove(&id) {
                        close(id, start, sec.second, &mut records);
                    }
                }
                for &id in live {
                    open.entry(id).or_insert(sec.second);
                }
            }

            let end = self.seconds.last().map_or(0, |s| s.second + 1);
            for (id, start) in open.drain() {
                close(id, start, end, &mut records);
            }
        }
        records.sort();
        records
    }
}

fn dedup_slots(slots: &[PlayerId]) -> Vec<PlayerId> {
    let mut out = Vec::with_capacity(slots.len());
    for &id in slots {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::GameBuilder;

    #[test]
    fn test_no_changes_gives_empty_timeline() {
        let mut game = GameBuilder::new("2021020001", "TOR", "MTL");
        game.event(EventType::Faceoff, 0).end(3600);
        let timeline = ShiftTimeline::build(&game.events());
        assert!(timeline.is_empty());
        assert!(timeline.shifts().is_empty());
    }

    #[test]
    fn test_single_change_covers_whole_game() {
        let mut game = GameBuilder::new("2021020001", "TOR", "MTL");
        game.change(0, &[7], &[]).end(3600);
        let timeline = ShiftTimeline::build(&game.events());

        assert_eq!(timeline.seconds().len(), 3601);

        let shifts = timeline.shifts();
        assert_eq!(shifts.len(), 1);
        assert_eq!(shifts[0].player_id, PlayerId(7));
        assert_eq!((shifts[0].start_second, shifts[0].end_second), (1, 3601));
        assert_eq!(shifts[0].duration(), 3600);
        assert_eq!(shifts[0].team, "TOR");
    }

    #[test]
    fn test_forward_fill_does_not_resurrect_removed_player() {
        let mut game = GameBuilder::new("2021020001", "TOR", "MTL");
        game.change(0, &[1, 2], &[11])
            .change(50, &[1], &[11])
            .change(100, &[1, 2], &[11])
            .end(120);
        let timeline = ShiftTimeline::build(&game.events());

        assert!(timeline.seconds()[49].home_on.contains(&PlayerId(2)));
        assert!(!timeline.seconds()[50].home_on.contains(&PlayerId(2)));
        assert!(!timeline.seconds()[99].home_on.contains(&PlayerId(2)));
        assert!(timeline.seconds()[100].home_on.contains(&PlayerId(2)));

        let p2: Vec<(u32, u32)> = timeline
            .shifts()
            .into_iter()
            .filter(|s| s.player_id == PlayerId(2))
            .map(|s| (s.start_second, s.end_second))
            .collect();
        assert_eq!(p2, vec![(1, 50), (100, 121)]);
    }

    #[test]
    fn test_strength_rederived_per_second() {
        let mut game = GameBuilder::new("2021020001", "TOR", "MTL");
        game.change(0, &[1, 2, 3, 4, 5], &[11, 12, 13, 14, 15])
            .change(10, &[1, 2, 3, 4], &[11, 12, 13, 14, 15])
            .end(20);
        let timeline = ShiftTimeline::build(&game.events());
        assert_eq!(timeline.seconds()[9].strength, StrengthState::new(5, 5));
        assert_eq!(timeline.seconds()[10].strength, StrengthState::new(5, 4));

        let even_only = timeline.shifts_at(&GameStrength::even());
        let total: u32 = even_only
            .iter()
            .filter(|s| s.player_id == PlayerId(1))
            .map(ShiftRecord::duration)
            .sum();
        assert_eq!(total, 9);
    }

    #[test]
    fn test_same_second_changes_last_wins() {
        let mut game = GameBuilder::new("2021020001", "TOR", "MTL");
        game.change(0, &[1], &[11]).change(30, &[2], &[11]).change(30, &[3], &[11]).end(40);
        let timeline = ShiftTimeline::build(&game.events());
        assert_eq!(timeline.seconds()[30].home_on, vec![PlayerId(3)]);
    }

    #[test]
    fn test_same_second_changes_without_event_num_ignore_input_order() {
        let mut game = GameBuilder::new("2021020001", "TOR", "MTL");
        game.change(0, &[1], &[11]).change(30, &[2], &[11]).change(30, &[3], &[11]).end(60);
        let mut events = game.events();
        for event in &mut events {
            event.event_num = None;
        }
        let forward = ShiftTimeline::build(&events);
        events.swap(1, 2);
        let swapped = ShiftTimeline::build(&events);

        assert_eq!(forward.seconds(), swapped.seconds());
        assert_eq!(forward.shifts(), swapped.shifts());
        assert_eq!(forward.seconds()[30].home_on, vec![PlayerId(3)]);
    }

    #[test]
    fn test_parallel_build_matches_sequential() {
        let mut a = GameBuilder::new("2021020001", "TOR", "MTL");
        a.change(0, &[1, 2], &[11]).change(60, &[2], &[11, 12]).end(120);
        let mut b = GameBuilder::new("2021020002", "BOS", "TOR");
        b.change(0, &[21], &[1]).end(90);
        let table = crate::test_support::season_table(&[&a, &b]);

        let seq: Vec<Vec<ShiftRecord>> = ShiftTimeline::build_all(&table, false)
            .iter()
            .map(ShiftTimeline::shifts)
            .collect();
        let par: Vec<Vec<ShiftRecord>> = ShiftTimeline::build_all(&table, true)
            .iter()
            .map(ShiftTimeline::shifts)
            .collect();
        assert_eq!(seq, par);
        assert_eq!(seq.len(), 2);
    }
}
