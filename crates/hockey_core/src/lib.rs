//! # hockey_core - Play-by-Play Statistical Aggregation
//!
//! Turns a normalized hockey play-by-play table into per-player
//! individual, on-ice and time-on-ice statistics, merged into one report.
//!
//! ## Features
//! - Season-type, period and strength-state filtering
//! - Per-second shift timeline rebuilt from `change` events
//! - On-ice fan-out of every qualifying event to all skaters on the ice
//! - Deterministic, sorted output with undefined ratios left empty
//!
//! ```rust
//! use hockey_core::{aggregate, AggregationConfig, EventTable, Roster};
//!
//! let table = EventTable::from_events(Vec::new());
//! let config = AggregationConfig::five_on_five("20232024");
//! let report = aggregate(&table, &config, None, &Roster::new()).unwrap();
//! assert!(report.is_empty());
//! ```

pub mod aggregate;
pub mod config;
pub mod error;
pub mod events;
pub mod pipeline;
pub mod roster;
pub mod shifts;
pub mod source;
pub mod xg;

#[cfg(test)]
mod test_support;

pub use aggregate::{
    individual_stats, merge_stats, on_ice_stats, ratio, time_on_ice, IndividualRow, OnIceRow,
    ReportRow, StatKey, StatsReport, TimeOnIceRow, REPORT_COLUMNS,
};
pub use config::{AggregationConfig, OnIceFenwick, TimeOnIceJoin};
pub use error::{Result, StatsError};
pub use events::{
    remove_event_types, split_shifts, Column, Event, EventFilter, EventTable, EventType,
    GameStrength, PlayerId, SeasonType, Side, StrengthState, DEFAULT_REMOVED,
};
pub use pipeline::{aggregate, aggregate_from_source};
pub use roster::{backfill_player_ids, Roster, RosterEntry};
pub use shifts::{ShiftRecord, ShiftTimeline, TimelineSecond};
pub use source::{EventSource, InMemorySource, RosterSource};
pub use xg::{ensure_xg, PrecomputedXg, XgModel};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
