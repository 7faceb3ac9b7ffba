//! # Aggregation Pipeline
//!
//! The single entry point: filter → xG → three aggregators → merge.
//!
//! ## Snapshot rule
//! All three aggregators read tables derived from the same input before the
//! merge runs. The shift timeline gets the period/season-type filtered
//! table (it must see every `change`); the individual and on-ice
//! aggregators get the strength-filtered one, sorted into
//! [`Event::chronological_cmp`] order so float sums come out the same
//! whatever order the rows arrived in.
//!
//! [`Event::chronological_cmp`]: crate::events::Event::chronological_cmp

use crate::aggregate::{
    individual_stats, merge_stats, on_ice_stats, time_on_ice, toi, StatsReport,
};
use crate::config::AggregationConfig;
use crate::error::Result;
use crate::events::EventTable;
use crate::roster::{backfill_player_ids, Roster};
use crate::source::{EventSource, RosterSource};
use crate::xg::{ensure_xg, XgModel};
use tracing::{info, warn};

/// Aggregate a materialized event table into the final report.
pub fn aggregate(
    table: &EventTable,
    config: &AggregationConfig,
    xg: Option<&dyn XgModel>,
    roster: &Roster,
) -> Result<StatsReport> {
    config.validate()?;
    let filter = config.filter();

    let mut plays = filter.apply(table)?;
    ensure_xg(&mut plays, xg)?;
    if !roster.is_empty() {
        backfill_player_ids(&mut plays, roster);
    }
    plays.sort_chronological();
    let timeline_input = table.filtered(|e| filter.admits_period(e));
    timeline_input.require(&toi::REQUIRED, "time-on-ice aggregation")?;

    let (individual, on_ice) = if config.parallel {
        rayon::join(
            || individual_stats(&plays),
            || on_ice_stats(&plays, config.on_ice_fenwick),
        )
    } else {
        (
            individual_stats(&plays),
            on_ice_stats(&plays, config.on_ice_fenwick),
        )
    };
    let (individual, on_ice) = (individual?, on_ice?);

    if plays.is_empty() {
        warn!(
            season = %config.season,
            strength = ?config.game_strength,
            "no qualifying events after filtering; report is empty"
        );
        return Ok(StatsReport {
            season: config.season.clone(),
            rows: Vec::new(),
        });
    }

    let toi_rows = time_on_ice(
        &timeline_input,
        &config.game_strength,
        config.toi_join,
        config.parallel,
    )?;

    let report = merge_stats(
        &individual,
        &on_ice,
        &toi_rows,
        roster,
        &config.season,
        config.toi_join,
    );
    info!(
        season = %config.season,
        events = plays.len(),
        rows = report.len(),
        "aggregation complete"
    );
    Ok(report)
}

/// Load the season's events and roster from injected sources, then
/// [`aggregate`].
pub fn aggregate_from_source(
    events: &dyn EventSource,
    roster: &dyn RosterSource,
    config: &AggregationConfig,
    xg: Option<&dyn XgModel>,
) -> Result<StatsReport> {
    let table = events.load_events(&config.season)?;
    let roster = roster.load_roster(&config.season)?;
    aggregate(&table, config, xg, &roster)
}
