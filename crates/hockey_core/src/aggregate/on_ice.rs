//! # On-Ice Aggregator
//!
//! For/against counts credited to every skater on the ice, not just the
//! puck carrier.
//!
//! ## Algorithm
//! For each side (home, away):
//! 1. Fan each event out to one `(event, skater)` pair per on-ice slot
//! 2. If the acting team is this side's team the pair counts *for*
//!    (GF, FF, xGF); if it is the opponent it counts *against* (GA, FA, xGA)
//! 3. Group by `(player, team, season)`: GP is distinct games, the rest sum
//!
//! Then union both sides and group again, summing everything. A player who
//! was home in some games and away in others ends up in one row per team.

use super::{ratio, StatKey};
use crate::config::OnIceFenwick;
use crate::error::Result;
use crate::events::{Column, Event, EventTable, EventType, Side};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Columns the on-ice aggregator reads.
pub const REQUIRED: [Column; 9] = [
    Column::GameId,
    Column::Season,
    Column::EventType,
    Column::EventTeam,
    Column::HomeTeam,
    Column::AwayTeam,
    Column::HomeOnIce,
    Column::AwayOnIce,
    Column::Xg,
];

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Counts {
    gp: u32,
    event_seconds: f64,
    ff: u32,
    fa: u32,
    gf: u32,
    ga: u32,
    xgf: f64,
    xga: f64,
}

impl Counts {
    fn add(&mut self, other: &Counts) {
        self.gp += other.gp;
        self.event_seconds += other.event_seconds;
        self.ff += other.ff;
        self.fa += other.fa;
        self.gf += other.gf;
        self.ga += other.ga;
        self.xgf += other.xgf;
        self.xga += other.xga;
    }
}

/// Per-side accumulator; games are tracked as a set until GP is known.
#[derive(Default)]
struct SideCounts<'a> {
    games: BTreeSet<&'a str>,
    counts: Counts,
}

/// On-ice results for one player on one team in one season.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OnIceRow {
    pub key: StatKey,
    pub gp: u32,
    /// Sum of `event_length` over every row the player was on ice for.
    pub event_seconds: f64,
    pub ff: u32,
    pub fa: u32,
    pub gf: u32,
    pub ga: u32,
    pub xgf: f64,
    pub xga: f64,
    pub xgf_per_ff: Option<f64>,
    pub gf_per_xgf: Option<f64>,
    pub fshf_pct: Option<f64>,
    pub xga_per_fa: Option<f64>,
    pub ga_per_xga: Option<f64>,
    pub fsha_pct: Option<f64>,
}

impl OnIceRow {
    fn finalize(key: StatKey, c: Counts) -> Self {
        Self {
            key,
            gp: c.gp,
            event_seconds: c.event_seconds,
            ff: c.ff,
            fa: c.fa,
            gf: c.gf,
            ga: c.ga,
            xgf: c.xgf,
            xga: c.xga,
            xgf_per_ff: ratio(c.xgf, c.ff as f64),
            gf_per_xgf: ratio(c.gf as f64, c.xgf),
            fshf_pct: ratio(c.gf as f64, c.ff as f64),
            xga_per_fa: ratio(c.xga, c.fa as f64),
            ga_per_xga: ratio(c.ga as f64, c.xga),
            fsha_pct: ratio(c.ga as f64, c.fa as f64),
        }
    }

    /// On-ice time from event lengths, in minutes.
    pub fn on_ice_toi_minutes(&self) -> f64 {
        self.event_seconds / 60.0
    }
}

fn qualifies(event: &Event, rule: OnIceFenwick) -> bool {
    match rule {
        OnIceFenwick::Unblocked => event.event_type.is_fenwick(),
        OnIceFenwick::AllAttempts => event.event_type.is_corsi(),
    }
}

fn side_stats<'a>(
    table: &'a EventTable,
    side: Side,
    rule: OnIceFenwick,
) -> BTreeMap<StatKey, SideCounts<'a>> {
    let mut acc: BTreeMap<StatKey, SideCounts<'a>> = BTreeMap::new();
    for event in table.events() {
        let team = event.team(side);
        let event_team = event.event_team_abbr.as_deref();
        let is_for = event_team == Some(team);
        let is_against = !is_for && event_team == Some(event.team(side.opponent()));
        let counted = qualifies(event, rule);
        let xg = event.xg_or_zero();

        for &player in event.on_ice(side) {
            let entry = acc
                .entry(StatKey::new(player, team, event.season.as_str()))
                .or_default();
            entry.games.insert(event.game_id.as_str());
            let c = &mut entry.counts;
            c.event_seconds += event.event_length.unwrap_or(0.0);
            if !counted {
                continue;
            }
            let goal = event.event_type == EventType::Goal;
            if is_for {
                c.ff += 1;
                c.xgf += xg;
                c.gf += u32::from(goal);
            } else if is_against {
                c.fa += 1;
                c.xga += xg;
                c.ga += u32::from(goal);
            }
        }
    }
    acc
}

/// On-ice for/against stats for every skater who appears in an on-ice slot.
pub fn on_ice_stats(table: &EventTable, rule: OnIceFenwick) -> Result<Vec<OnIceRow>> {
    table.require(&REQUIRED, "on-ice aggregation")?;

    let mut combined: BTreeMap<StatKey, Counts> = BTreeMap::new();
    for side in Side::BOTH {
        for (key, side_counts) in side_stats(table, side, rule) {
            let mut counts = side_counts.counts;
            counts.gp = side_counts.games.len() as u32;
            combined.entry(key).or_default().add(&counts);
        }
    }

    let rows: Vec<OnIceRow> = combined
        .into_iter()
        .map(|(key, c)| OnIceRow::finalize(key, c))
        .collect();
    debug!(rows = rows.len(), ?rule, "on-ice aggregation done");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::PlayerId;
    use crate::test_support::{season_table, GameBuilder};
    use proptest::prelude::*;

    const HOME: [u64; 5] = [1, 2, 3, 4, 5];
    const AWAY: [u64; 5] = [11, 12, 13, 14, 15];

    fn row(rows: &[OnIceRow], id: u64) -> &OnIceRow {
        rows.iter()
            .find(|r| r.key.player_id == PlayerId(id))
            .expect("player row")
    }

    #[test]
    fn test_home_goal_fans_out_to_both_sides() {
        let mut game = GameBuilder::new("2021020045", "TOR", "MTL");
        game.change(0, &HOME, &AWAY);
        game.shot(EventType::Goal, 100, "TOR", [Some(1), Some(2), None], 0.25);
        let rows = on_ice_stats(&game.build(), OnIceFenwick::Unblocked).unwrap();

        for id in HOME {
            let r = row(&rows, id);
            assert_eq!((r.gf, r.ga, r.ff, r.fa), (1, 0, 1, 0), "home skater {}", id);
            assert_eq!(r.key.team, "TOR");
            assert_eq!(r.xgf, 0.25);
        }
        for id in AWAY {
            let r = row(&rows, id);
            assert_eq!((r.gf, r.ga, r.ff, r.fa), (0, 1, 0, 1), "away skater {}", id);
            assert_eq!(r.key.team, "MTL");
            assert_eq!(r.xga, 0.25);
        }
    }

    #[test]
    fn test_blocked_shot_rule() {
        let mut game = GameBuilder::new("2021020045", "TOR", "MTL");
        game.change(0, &HOME, &AWAY);
        game.shot(EventType::BlockedShot, 50, "MTL", [Some(11), Some(1), None], 0.02);
        let table = game.build();

        let unblocked = on_ice_stats(&table, OnIceFenwick::Unblocked).unwrap();
        assert_eq!(row(&unblocked, 1).fa, 0);
        assert_eq!(row(&unblocked, 11).ff, 0);

        let all = on_ice_stats(&table, OnIceFenwick::AllAttempts).unwrap();
        assert_eq!(row(&all, 1).fa, 1);
        assert_eq!(row(&all, 11).ff, 1);
        assert_eq!(row(&all, 11).gf, 0);
    }

    #[test]
    fn test_gp_counts_distinct_games_across_sides() {
        let mut g1 = GameBuilder::new("2021020001", "TOR", "MTL");
        g1.change(0, &[1], &[11]);
        g1.event(EventType::Faceoff, 1).event(EventType::Hit, 5);
        let mut g2 = GameBuilder::new("2021020002", "BOS", "TOR");
        g2.change(0, &[21], &[1]);
        g2.shot(EventType::ShotOnGoal, 10, "TOR", [Some(1), None, None], 0.1);

        let rows = on_ice_stats(&season_table(&[&g1, &g2]), OnIceFenwick::Unblocked).unwrap();
        let tor: Vec<&OnIceRow> = rows.iter().filter(|r| r.key.player_id == PlayerId(1)).collect();
        assert_eq!(tor.len(), 1);
        assert_eq!(tor[0].gp, 2);
        assert_eq!(tor[0].ff, 1);
    }

    #[test]
    fn test_zero_attempts_leave_ratios_undefined() {
        let mut game = GameBuilder::new("2021020001", "TOR", "MTL");
        game.change(0, &[1], &[11]);
        let rows = on_ice_stats(&game.build(), OnIceFenwick::Unblocked).unwrap();
        let r = row(&rows, 1);
        assert_eq!(r.gp, 1);
        assert_eq!(r.xgf_per_ff, None);
        assert_eq!(r.gf_per_xgf, None);
        assert_eq!(r.fshf_pct, None);
        assert_eq!(r.fsha_pct, None);
    }

    #[test]
    fn test_event_length_sums_into_on_ice_toi() {
        let mut game = GameBuilder::new("2021020001", "TOR", "MTL");
        game.change(0, &[1], &[11]);
        let mut events = game.events();
        events[0].event_length = Some(90.0);
        let rows = on_ice_stats(&EventTable::from_events(events), OnIceFenwick::Unblocked).unwrap();
        assert_eq!(row(&rows, 1).on_ice_toi_minutes(), 1.5);
    }

    proptest! {
        /// Every for-event reaches exactly as many skaters as were on the ice.
        #[test]
        fn prop_goals_for_conserved_by_fan_out(
            goals in prop::collection::vec((0u32..3600, 3usize..=6, any::<bool>()), 0..40)
        ) {
            let mut game = GameBuilder::new("2021020045", "TOR", "MTL");
            let mut expected_tor = 0u32;
            let mut expected_mtl = 0u32;
            let mut sorted = goals.clone();
            sorted.sort_by_key(|g| g.0);
            for (second, skaters, home_scored) in sorted {
                let home: Vec<u64> = (1..=skaters as u64).collect();
                let away: Vec<u64> = (11..=15).collect();
                game.change(second, &home, &away);
                let team = if home_scored { "TOR" } else { "MTL" };
                game.shot(EventType::Goal, second, team, [None, None, None], 0.5);
                if home_scored {
                    expected_tor += skaters as u32;
                } else {
                    expected_mtl += 5;
                }
            }

            let rows = on_ice_stats(&game.build(), OnIceFenwick::Unblocked).unwrap();
            let gf = |team: &str| -> u32 {
                rows.iter().filter(|r| r.key.team == team).map(|r| r.gf).sum()
            };
            prop_assert_eq!(gf("TOR"), expected_tor);
            prop_assert_eq!(gf("MTL"), expected_mtl);

            let ga_tor: u32 = rows.iter().filter(|r| r.key.team == "TOR").map(|r| r.ga).sum();
            let goals_mtl = expected_mtl / 5;
            let min_home = goals_mtl * 3;
            prop_assert!(ga_tor >= min_home && ga_tor <= goals_mtl * 6);
        }
    }
}
