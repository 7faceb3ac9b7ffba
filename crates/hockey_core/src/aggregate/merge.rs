//! # Stats Merger
//!
//! Joins the individual, on-ice and TOI tables into the final report.
//!
//! 1. Outer join individual and on-ice on `(player, team, season)`
//! 2. Outer join TOI on `(player, team)` or `(player, team, season)`
//!    depending on [`TimeOnIceJoin`]
//! 3. Missing counters are zero
//! 4. Ratios are derived from the merged counters, `None` on a zero
//!    denominator
//! 5. Names come from the roster; unmatched ids keep `None`
//! 6. Rows sort by `(name, season, team, id)` with unnamed rows last

use super::{ratio, IndividualRow, OnIceRow, StatKey, TimeOnIceRow};
use crate::config::TimeOnIceJoin;
use crate::events::PlayerId;
use crate::roster::Roster;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Report header, in output order.
pub const REPORT_COLUMNS: [&str; 31] = [
    "Player", "ID", "Season", "Team", "GP", "TOI", "G", "A1", "A2", "iFF", "ixG", "ixG/iFF",
    "G/ixG", "iFsh%", "GF", "FF", "xGF", "xGF/FF", "GF/xGF", "FshF%", "GA", "FA", "xGA",
    "xGA/FA", "GA/xGA", "FshA%", "GC%", "AC%", "GI%", "FC%", "xGC%",
];

/// One line of the final report. Field order matches [`REPORT_COLUMNS`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    #[serde(rename = "Player")]
    pub player: Option<String>,
    #[serde(rename = "ID")]
    pub player_id: PlayerId,
    #[serde(rename = "Season")]
    pub season: String,
    #[serde(rename = "Team")]
    pub team: String,
    #[serde(rename = "GP")]
    pub gp: u32,
    /// Minutes.
    #[serde(rename = "TOI")]
    pub toi: f64,
    #[serde(rename = "G")]
    pub g: u32,
    #[serde(rename = "A1")]
    pub a1: u32,
    #[serde(rename = "A2")]
    pub a2: u32,
    #[serde(rename = "iFF")]
    pub iff: u32,
    #[serde(rename = "ixG")]
    pub ixg: f64,
    #[serde(rename = "ixG/iFF")]
    pub ixg_per_iff: Option<f64>,
    #[serde(rename = "G/ixG")]
    pub g_per_ixg: Option<f64>,
    #[serde(rename = "iFsh%")]
    pub ifsh_pct: Option<f64>,
    #[serde(rename = "GF")]
    pub gf: u32,
    #[serde(rename = "FF")]
    pub ff: u32,
    #[serde(rename = "xGF")]
    pub xgf: f64,
    #[serde(rename = "xGF/FF")]
    pub xgf_per_ff: Option<f64>,
    #[serde(rename = "GF/xGF")]
    pub gf_per_xgf: Option<f64>,
    #[serde(rename = "FshF%")]
    pub fshf_pct: Option<f64>,
    #[serde(rename = "GA")]
    pub ga: u32,
    #[serde(rename = "FA")]
    pub fa: u32,
    #[serde(rename = "xGA")]
    pub xga: f64,
    #[serde(rename = "xGA/FA")]
    pub xga_per_fa: Option<f64>,
    #[serde(rename = "GA/xGA")]
    pub ga_per_xga: Option<f64>,
    #[serde(rename = "FshA%")]
    pub fsha_pct: Option<f64>,
    #[serde(rename = "GC%")]
    pub gc_pct: Option<f64>,
    #[serde(rename = "AC%")]
    pub ac_pct: Option<f64>,
    #[serde(rename = "GI%")]
    pub gi_pct: Option<f64>,
    #[serde(rename = "FC%")]
    pub fc_pct: Option<f64>,
    #[serde(rename = "xGC%")]
    pub xgc_pct: Option<f64>,
}

impl ReportRow {
    fn assemble(
        key: StatKey,
        indiv: Option<&IndividualRow>,
        on_ice: Option<&OnIceRow>,
        toi: Option<&TimeOnIceRow>,
    ) -> Self {
        let (g, a1, a2, iff, ixg) = indiv
            .map(|r| (r.g, r.a1, r.a2, r.iff, r.ixg))
            .unwrap_or_default();
        let (gf, ff, xgf, ga, fa, xga) = on_ice
            .map(|r| (r.gf, r.ff, r.xgf, r.ga, r.fa, r.xga))
            .unwrap_or_default();
        let gp = toi
            .map(|t| t.gp)
            .or_else(|| on_ice.map(|r| r.gp))
            .unwrap_or(0);
        let gf_f = gf as f64;

        Self {
            player: None,
            player_id: key.player_id,
            season: key.season,
            team: key.team,
            gp,
            toi: toi.map(TimeOnIceRow::toi).unwrap_or(0.0),
            g,
            a1,
            a2,
            iff,
            ixg,
            ixg_per_iff: ratio(ixg, iff as f64),
            g_per_ixg: ratio(g as f64, ixg),
            ifsh_pct: ratio(g as f64, iff as f64),
            gf,
            ff,
            xgf,
            xgf_per_ff: ratio(xgf, ff as f64),
            gf_per_xgf: ratio(gf_f, xgf),
            fshf_pct: ratio(gf_f, ff as f64),
            ga,
            fa,
            xga,
            xga_per_fa: ratio(xga, fa as f64),
            ga_per_xga: ratio(ga as f64, xga),
            fsha_pct: ratio(ga as f64, fa as f64),
            gc_pct: ratio(g as f64, gf_f),
            ac_pct: ratio((a1 + a2) as f64, gf_f),
            gi_pct: ratio((g + a1 + a2) as f64, gf_f),
            fc_pct: ratio(iff as f64, ff as f64),
            xgc_pct: ratio(ixg, xgf),
        }
    }

    pub fn points(&self) -> u32 {
        self.g + self.a1 + self.a2
    }
}

/// The merged, sorted report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsReport {
    pub season: String,
    pub rows: Vec<ReportRow>,
}

impl StatsReport {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows for one player, one per team/season.
    pub fn player(&self, id: PlayerId) -> impl Iterator<Item = &ReportRow> {
        self.rows.iter().filter(move |r| r.player_id == id)
    }
}

type TimeOnIceKey = (PlayerId, String, Option<String>);

fn toi_key(join: TimeOnIceJoin, id: PlayerId, team: &str, season: &str) -> TimeOnIceKey {
    let season = match join {
        TimeOnIceJoin::PlayerTeam => None,
        TimeOnIceJoin::PlayerTeamSeason => Some(season.to_string()),
    };
    (id, team.to_string(), season)
}

/// Join the three aggregate tables and the roster into one report.
///
/// `season_label` is used for rows that only exist in a season-agnostic
/// TOI table.
pub fn merge_stats(
    individual: &[IndividualRow],
    on_ice: &[OnIceRow],
    toi: &[TimeOnIceRow],
    roster: &Roster,
    season_label: &str,
    join: TimeOnIceJoin,
) -> StatsReport {
    let mut joined: BTreeMap<StatKey, (Option<&IndividualRow>, Option<&OnIceRow>)> =
        BTreeMap::new();
    for row in individual {
        joined.entry(row.key.clone()).or_default().0 = Some(row);
    }
    for row in on_ice {
        joined.entry(row.key.clone()).or_default().1 = Some(row);
    }

    let toi_index: BTreeMap<TimeOnIceKey, &TimeOnIceRow> = toi
        .iter()
        .map(|t| ((t.player_id, t.team.clone(), t.season.clone()), t))
        .collect();
    let mut toi_used: BTreeSet<TimeOnIceKey> = BTreeSet::new();

    let mut rows = Vec::with_capacity(joined.len());
    for (key, (indiv, ice)) in joined {
        let tk = toi_key(join, key.player_id, &key.team, &key.season);
        let time = toi_index.get(&tk).copied();
        if time.is_some() {
            toi_used.insert(tk);
        }
        rows.push(ReportRow::assemble(key, indiv, ice, time));
    }

    for (tk, time) in toi_index {
        if toi_used.contains(&tk) {
            continue;
        }
        let season = time
            .season
            .clone()
            .unwrap_or_else(|| season_label.to_string());
        let key = StatKey::new(time.player_id, time.team.clone(), season);
        rows.push(ReportRow::assemble(key, None, None, Some(time)));
    }

    let mut unmatched = 0usize;
    for row in &mut rows {
        row.player = roster.name_of(row.player_id).map(str::to_string);
        if row.player.is_none() {
            unmatched += 1;
            debug!(player_id = %row.player_id, team = %row.team, "no roster name for player");
        }
    }

    rows.sort_by(|a, b| {
        (a.player.is_none(), &a.player, &a.season, &a.team, a.player_id).cmp(&(
            b.player.is_none(),
            &b.player,
            &b.season,
            &b.team,
            b.player_id,
        ))
    });

    debug!(rows = rows.len(), unmatched, "merge done");
    StatsReport {
        season: season_label.to_string(),
        rows,
    }
}
