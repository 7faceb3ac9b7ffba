//! # Data Sources
//!
//! Capabilities injected into the pipeline instead of season-keyed file
//! lookups. The core never decides where events or rosters live.

use crate::error::{Result, StatsError};
use crate::events::EventTable;
use crate::roster::Roster;
use std::collections::BTreeMap;

/// Supplies the normalized event table for a season.
pub trait EventSource {
    fn load_events(&self, season: &str) -> Result<EventTable>;
}

/// Supplies the id → name reference for a season.
pub trait RosterSource {
    fn load_roster(&self, season: &str) -> Result<Roster>;
}

/// A fixed roster serves every season.
impl RosterSource for Roster {
    fn load_roster(&self, _season: &str) -> Result<Roster> {
        Ok(self.clone())
    }
}

/// Event tables held in memory, keyed by season label.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    seasons: BTreeMap<String, EventTable>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_season(mut self, season: impl Into<String>, table: EventTable) -> Self {
        self.insert(season, table);
        self
    }

    /// Appends to the season's table if one is already present.
    pub fn insert(&mut self, season: impl Into<String>, table: EventTable) {
        match self.seasons.entry(season.into()) {
            std::collections::btree_map::Entry::Occupied(mut slot) => slot.get_mut().extend(table),
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(table);
            }
        }
    }
}

impl EventSource for InMemorySource {
    fn load_events(&self, season: &str) -> Result<EventTable> {
        self.seasons
            .get(season)
            .cloned()
            .ok_or_else(|| StatsError::Source(format!("no events loaded for season {}", season)))
    }
}
