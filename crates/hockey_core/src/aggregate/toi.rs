//! # Time-On-Ice Aggregator
//!
//! Games played and minutes per player from the per-second shift timeline.
//! Counts the per-second `(second, player)` pairs of each side through the
//! timeline's shift records, groups per game, then regroups per player and
//! team.
//!
//! The input must not be strength-filtered: the timeline has to see every
//! `change` to forward-fill correctly. The strength filter is applied to
//! each reconstructed second instead.

use crate::config::TimeOnIceJoin;
use crate::error::Result;
use crate::events::{Column, EventTable, GameStrength, PlayerId};
use crate::shifts::{ShiftRecord, ShiftTimeline};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Columns the TOI aggregator reads.
pub const REQUIRED: [Column; 8] = [
    Column::GameId,
    Column::Season,
    Column::EventType,
    Column::SecondsElapsed,
    Column::HomeTeam,
    Column::AwayTeam,
    Column::HomeOnIce,
    Column::AwayOnIce,
];

/// Games played and time on ice for one player and team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeOnIceRow {
    pub player_id: PlayerId,
    pub team: String,
    /// Set only when TOI is keyed by season as well.
    pub season: Option<String>,
    pub gp: u32,
    pub seconds: u32,
}

impl TimeOnIceRow {
    /// Minutes on ice.
    pub fn toi(&self) -> f64 {
        self.seconds as f64 / 60.0
    }
}

type TeamKey = (PlayerId, String, String);

#[derive(Default)]
struct Acc {
    gp: u32,
    seconds: u32,
}

/// TOI rows from every game's shift timeline. Per game and team a player
/// adds one GP if they had at least one counted second.
pub fn time_on_ice(
    table: &EventTable,
    strength: &GameStrength,
    join: TimeOnIceJoin,
    parallel: bool,
) -> Result<Vec<TimeOnIceRow>> {
    table.require(&REQUIRED, "time-on-ice aggregation")?;

    let timelines = ShiftTimeline::build_all(table, parallel);
    let shifts: Vec<Vec<ShiftRecord>> = if parallel {
        timelines.par_iter().map(|t| t.shifts_at(strength)).collect()
    } else {
        timelines.iter().map(|t| t.shifts_at(strength)).collect()
    };

    let mut per_game: BTreeMap<TeamKey, (BTreeSet<&str>, u32)> = BTreeMap::new();
    for shift in shifts.iter().flatten() {
        let entry = per_game
            .entry((shift.player_id, shift.team.clone(), shift.season.clone()))
            .or_default();
        entry.0.insert(shift.game_id.as_str());
        entry.1 += shift.duration();
    }

    let mut grouped: BTreeMap<(PlayerId, String, Option<String>), Acc> = BTreeMap::new();
    for ((player_id, team, season), (games, seconds)) in per_game {
        let season = match join {
            TimeOnIceJoin::PlayerTeam => None,
            TimeOnIceJoin::PlayerTeamSeason => Some(season),
        };
        let acc = grouped.entry((player_id, team, season)).or_default();
        acc.gp += games.len() as u32;
        acc.seconds += seconds;
    }

    let rows: Vec<TimeOnIceRow> = grouped
        .into_iter()
        .map(|((player_id, team, season), acc)| TimeOnIceRow {
            player_id,
            team,
            season,
            gp: acc.gp,
            seconds: acc.seconds,
        })
        .collect();
    debug!(
        games = timelines.len(),
        rows = rows.len(),
        "time-on-ice aggregation done"
    );
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventType, StrengthState};
    use crate::test_support::{season_table, GameBuilder};

    fn find(rows: &[TimeOnIceRow], id: u64) -> Vec<&TimeOnIceRow> {
        rows.iter().filter(|r| r.player_id == PlayerId(id)).collect()
    }

    #[test]
    fn test_full_game_single_change() {
        let mut game = GameBuilder::new("2021020045", "TOR", "MTL");
        game.change(0, &[7], &[]).end(3600);
        let rows =
            time_on_ice(&game.build(), &GameStrength::All, TimeOnIceJoin::PlayerTeam, false)
                .unwrap();

        assert_eq!(rows.len(), 1);
        let x = &rows[0];
        assert_eq!(x.player_id, PlayerId(7));
        assert_eq!(x.team, "TOR");
        assert_eq!(x.gp, 1);
        // seconds 1..=3600; second 0 is the placeholder row
        assert_eq!(x.seconds, 3600);
        assert_eq!(x.toi(), 60.0);
    }

    #[test]
    fn test_game_without_changes_contributes_nothing() {
        let mut game = GameBuilder::new("2021020045", "TOR", "MTL");
        game.shot(EventType::Goal, 10, "TOR", [Some(1), None, None], 0.2).end(3600);
        let rows =
            time_on_ice(&game.build(), &GameStrength::All, TimeOnIceJoin::PlayerTeam, false)
                .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_sides_union_into_one_row_per_team() {
        let mut g1 = GameBuilder::new("2021020001", "TOR", "MTL");
        g1.change(0, &[1], &[11]).end(600);
        let mut g2 = GameBuilder::new("2021020002", "BOS", "TOR");
        g2.change(0, &[21], &[1]).change(300, &[21], &[2]).end(600);
        let table = season_table(&[&g1, &g2]);

        let rows = time_on_ice(&table, &GameStrength::All, TimeOnIceJoin::PlayerTeam, false)
            .unwrap();
        let p1 = find(&rows, 1);
        assert_eq!(p1.len(), 1);
        assert_eq!(p1[0].gp, 2);
        assert_eq!(p1[0].seconds, 600 + 299);
    }

    #[test]
    fn test_strength_filter_applies_per_second() {
        let mut game = GameBuilder::new("2021020045", "TOR", "MTL");
        game.change(0, &[1, 2, 3, 4, 5], &[11, 12, 13, 14, 15])
            .change(100, &[1, 2, 3, 4], &[11, 12, 13, 14, 15])
            .change(220, &[1, 2, 3, 4, 5], &[11, 12, 13, 14, 15])
            .end(400);

        let even = GameStrength::Only(vec![StrengthState::EVEN]);
        let rows = time_on_ice(&game.build(), &even, TimeOnIceJoin::PlayerTeam, false).unwrap();
        // 1..100 and 220..=400 at 5v5
        assert_eq!(find(&rows, 1)[0].seconds, 99 + 181);
        assert_eq!(find(&rows, 5)[0].seconds, 99 + 181);

        let pp = GameStrength::Only(vec![StrengthState::new(5, 4)]);
        let rows = time_on_ice(&game.build(), &pp, TimeOnIceJoin::PlayerTeam, false).unwrap();
        assert_eq!(find(&rows, 1)[0].seconds, 120);
        assert!(find(&rows, 5).is_empty());
    }

    #[test]
    fn test_season_keyed_join_keeps_seasons_apart() {
        let mut a = GameBuilder::new("2021020001", "TOR", "MTL");
        a.change(0, &[1], &[11]).end(60);
        let mut b = GameBuilder::new("2022020001", "TOR", "MTL");
        b.change(0, &[1], &[11]).end(60);
        let table = season_table(&[&a, &b]);

        let merged =
            time_on_ice(&table, &GameStrength::All, TimeOnIceJoin::PlayerTeam, false).unwrap();
        assert_eq!(find(&merged, 1).len(), 1);
        assert_eq!(find(&merged, 1)[0].gp, 2);

        let split = time_on_ice(&table, &GameStrength::All, TimeOnIceJoin::PlayerTeamSeason, true)
            .unwrap();
        let seasons: Vec<Option<&str>> =
            find(&split, 1).iter().map(|r| r.season.as_deref()).collect();
        assert_eq!(seasons, vec![Some("20212022"), Some("20222023")]);
    }
}
