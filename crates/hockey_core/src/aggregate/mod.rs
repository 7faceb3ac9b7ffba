//! # Aggregate Module
//!
//! Per-player tables built from a filtered event table.
//!
//! - `individual` - on-puck production (G, A1, A2, iFF, ixG)
//! - `on_ice` - for/against counts fanned out to every skater on the ice
//! - `toi` - games played and time on ice from the shift timeline
//! - `merge` - joins the three into the final report
//!
//! Each aggregator reads the table and returns a new, independent table;
//! rows come out sorted by key so repeated runs are identical.

pub mod individual;
pub mod merge;
pub mod on_ice;
pub mod toi;

pub use individual::{individual_stats, IndividualRow};
pub use merge::{merge_stats, ReportRow, StatsReport, REPORT_COLUMNS};
pub use on_ice::{on_ice_stats, OnIceRow};
pub use toi::{time_on_ice, TimeOnIceRow};

use crate::events::PlayerId;
use serde::{Deserialize, Serialize};

/// Join key shared by the individual and on-ice tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StatKey {
    pub player_id: PlayerId,
    pub team: String,
    pub season: String,
}

impl StatKey {
    pub fn new(player_id: PlayerId, team: impl Into<String>, season: impl Into<String>) -> Self {
        Self {
            player_id,
            team: team.into(),
            season: season.into(),
        }
    }
}

/// `num / den`, or `None` when the denominator is zero or either side is
/// not finite.
pub fn ratio(num: f64, den: f64) -> Option<f64> {
    if den == 0.0 || !den.is_finite() || !num.is_finite() {
        None
    } else {
        Some(num / den)
    }
}
