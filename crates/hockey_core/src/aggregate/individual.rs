//! # Individual Aggregator
//!
//! On-puck production per `(player, team, season)`.
//!
//! - Shooter stats come from unblocked attempts (goal, shot on goal, missed
//!   shot) credited to `event_player_1`
//! - Assists come from goals only: `event_player_2` is the primary assist,
//!   `event_player_3` the secondary
//!
//! All three groupings share one accumulator per key, so a player who only
//! ever assisted still gets a row with zero shooting counts.

use super::{ratio, StatKey};
use crate::error::Result;
use crate::events::{Column, EventTable, EventType};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Columns the individual aggregator reads.
pub const REQUIRED: [Column; 7] = [
    Column::Season,
    Column::EventType,
    Column::EventTeam,
    Column::EventPlayer1,
    Column::EventPlayer2,
    Column::EventPlayer3,
    Column::Xg,
];

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Counts {
    g: u32,
    iff: u32,
    ixg: f64,
    rush: u32,
    a1: u32,
    a2: u32,
}

/// Individual production for one player on one team in one season.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndividualRow {
    pub key: StatKey,
    pub g: u32,
    pub a1: u32,
    pub a2: u32,
    /// Individual Fenwick: unblocked attempts taken.
    pub iff: u32,
    pub ixg: f64,
    /// Unblocked attempts flagged as rush chances.
    pub rush: u32,
    pub p1: u32,
    pub p: u32,
    pub ixg_per_iff: Option<f64>,
    pub g_per_ixg: Option<f64>,
    pub ifsh_pct: Option<f64>,
}

impl IndividualRow {
    fn finalize(key: StatKey, c: Counts) -> Self {
        let p1 = c.g + c.a1;
        Self {
            key,
            g: c.g,
            a1: c.a1,
            a2: c.a2,
            iff: c.iff,
            ixg: c.ixg,
            rush: c.rush,
            p1,
            p: p1 + c.a2,
            ixg_per_iff: ratio(c.ixg, c.iff as f64),
            g_per_ixg: ratio(c.g as f64, c.ixg),
            ifsh_pct: ratio(c.g as f64, c.iff as f64),
        }
    }
}

/// Individual stats for every player credited on a shot or goal.
pub fn individual_stats(table: &EventTable) -> Result<Vec<IndividualRow>> {
    table.require(&REQUIRED, "individual aggregation")?;

    let mut acc: BTreeMap<StatKey, Counts> = BTreeMap::new();
    for event in table.events() {
        let Some(team) = event.event_team_abbr.as_deref() else {
            continue;
        };
        let key = |id| StatKey::new(id, team, event.season.as_str());

        if event.event_type.is_fenwick() {
            if let Some(shooter) = event.player_1() {
                let c = acc.entry(key(shooter)).or_default();
                c.iff += 1;
                c.ixg += event.xg_or_zero();
                if event.event_type == EventType::Goal {
                    c.g += 1;
                }
                if event.rush_mod.is_some_and(|r| r > 0.0) {
                    c.rush += 1;
                }
            }
        }

        if event.event_type == EventType::Goal {
            if let Some(primary) = event.player_2() {
                acc.entry(key(primary)).or_default().a1 += 1;
            }
            if let Some(secondary) = event.player_3() {
                acc.entry(key(secondary)).or_default().a2 += 1;
            }
        }
    }

    let rows: Vec<IndividualRow> = acc
        .into_iter()
        .map(|(key, c)| IndividualRow::finalize(key, c))
        .collect();
    debug!(rows = rows.len(), "individual aggregation done");
    Ok(rows)
}
