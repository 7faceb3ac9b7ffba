//! # Shifts Module
//!
//! Continuous on-ice rosters rebuilt from `change` rows.

pub mod timeline;

pub use timeline::{ShiftRecord, ShiftTimeline, TimelineSecond};
