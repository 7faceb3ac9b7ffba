//! # Event Table
//!
//! An in-memory play-by-play table plus the set of columns its source
//! actually carried. Typed rows cannot express "column missing", so the
//! schema travels alongside them and each stage checks what it needs.

use super::event::Event;
use crate::error::{Result, StatsError};
use std::collections::BTreeSet;

/// Logical columns of the play-by-play schema. Slot families
/// (`home_on_1_id` .. `home_on_6_id`) are one logical column each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    GameId,
    Season,
    SeasonType,
    Period,
    SecondsElapsed,
    EventType,
    EventTeam,
    HomeTeam,
    AwayTeam,
    StrengthState,
    EventPlayer1,
    EventPlayer2,
    EventPlayer3,
    HomeOnIce,
    AwayOnIce,
    HomeGoalie,
    AwayGoalie,
    Xg,
    EventLength,
    RushMod,
}

impl Column {
    pub const ALL: [Column; 20] = [
        Column::GameId,
        Column::Season,
        Column::SeasonType,
        Column::Period,
        Column::SecondsElapsed,
        Column::EventType,
        Column::EventTeam,
        Column::HomeTeam,
        Column::AwayTeam,
        Column::StrengthState,
        Column::EventPlayer1,
        Column::EventPlayer2,
        Column::EventPlayer3,
        Column::HomeOnIce,
        Column::AwayOnIce,
        Column::HomeGoalie,
        Column::AwayGoalie,
        Column::Xg,
        Column::EventLength,
        Column::RushMod,
    ];

    /// Header name in the flat-file schema. For slot families this is the
    /// first slot.
    pub fn name(self) -> &'static str {
        match self {
            Column::GameId => "game_id",
            Column::Season => "season",
            Column::SeasonType => "season_type",
            Column::Period => "period",
            Column::SecondsElapsed => "seconds_elapsed",
            Column::EventType => "event_type",
            Column::EventTeam => "event_team_abbr",
            Column::HomeTeam => "home_team_abbr",
            Column::AwayTeam => "away_team_abbr",
            Column::StrengthState => "strength_state",
            Column::EventPlayer1 => "event_player_1_id",
            Column::EventPlayer2 => "event_player_2_id",
            Column::EventPlayer3 => "event_player_3_id",
            Column::HomeOnIce => "home_on_1_id",
            Column::AwayOnIce => "away_on_1_id",
            Column::HomeGoalie => "home_goalie_id",
            Column::AwayGoalie => "away_goalie_id",
            Column::Xg => "xG",
            Column::EventLength => "event_length",
            Column::RushMod => "rush_mod",
        }
    }

    pub fn from_header(header: &str) -> Option<Column> {
        let header = header.trim();
        if header.starts_with("home_on_") && header.ends_with("_id") {
            return Some(Column::HomeOnIce);
        }
        if header.starts_with("away_on_") && header.ends_with("_id") {
            return Some(Column::AwayOnIce);
        }
        Column::ALL.into_iter().find(|c| c.name() == header)
    }
}

/// Play-by-play rows with their column schema.
#[derive(Debug, Clone, Default)]
pub struct EventTable {
    events: Vec<Event>,
    columns: BTreeSet<Column>,
}

impl EventTable {
    /// Table whose source carried the full schema.
    pub fn from_events(events: Vec<Event>) -> Self {
        Self {
            events,
            columns: Column::ALL.into_iter().collect(),
        }
    }

    /// Table with an explicit schema, e.g. from file headers.
    pub fn with_columns(events: Vec<Event>, columns: impl IntoIterator<Item = Column>) -> Self {
        Self {
            events,
            columns: columns.into_iter().collect(),
        }
    }

    pub fn without_column(mut self, column: Column) -> Self {
        self.columns.remove(&column);
        self
    }

    pub fn mark_column(&mut self, column: Column) {
        self.columns.insert(column);
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    pub fn columns(&self) -> impl Iterator<Item = Column> + '_ {
        self.columns.iter().copied()
    }

    /// Fail with the first column in `required` the table lacks.
    pub fn require(&self, required: &[Column], stage: &'static str) -> Result<()> {
        match required.iter().find(|c| !self.has_column(**c)) {
            Some(missing) => Err(StatsError::MissingColumn {
                column: missing.name(),
                stage,
            }),
            None => Ok(()),
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut [Event] {
        &mut self.events
    }

    /// Put rows in [`Event::chronological_cmp`] order.
    pub fn sort_chronological(&mut self) {
        self.events.sort_by(Event::chronological_cmp);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Same schema, rows kept by `keep`.
    pub fn filtered(&self, mut keep: impl FnMut(&Event) -> bool) -> EventTable {
        EventTable {
            events: self.events.iter().filter(|e| keep(e)).cloned().collect(),
            columns: self.columns.clone(),
        }
    }

    /// Append another table's rows; the schema becomes the intersection.
    pub fn extend(&mut self, other: EventTable) {
        if self.events.is_empty() && self.columns.is_empty() {
            *self = other;
            return;
        }
        self.columns = self.columns.intersection(&other.columns).copied().collect();
        self.events.extend(other.events);
    }

    /// Distinct game ids in first-seen order.
    pub fn game_ids(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.events
            .iter()
            .map(|e| e.game_id.as_str())
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventType;

    #[test]
    fn test_require_reports_first_missing_column() {
        let table = EventTable::from_events(vec![]).without_column(Column::Xg);
        assert!(table.require(&[Column::GameId, Column::Period], "test").is_ok());
        let err = table.require(&[Column::GameId, Column::Xg], "xG check").unwrap_err();
        assert!(matches!(
            err,
            StatsError::MissingColumn { column: "xG", stage: "xG check" }
        ));
    }

    #[test]
    fn test_slot_headers_map_to_families() {
        assert_eq!(Column::from_header("home_on_4_id"), Some(Column::HomeOnIce));
        assert_eq!(Column::from_header("away_on_6_id"), Some(Column::AwayOnIce));
        assert_eq!(Column::from_header("xG"), Some(Column::Xg));
        assert_eq!(Column::from_header("description"), None);
    }

    #[test]
    fn test_extend_intersects_schema() {
        let mut a = EventTable::from_events(vec![Event::new("1", "s", EventType::Hit, 1, 1)]);
        let b = EventTable::from_events(vec![Event::new("2", "s", EventType::Hit, 1, 1)])
            .without_column(Column::RushMod);
        a.extend(b);
        assert_eq!(a.len(), 2);
        assert!(!a.has_column(Column::RushMod));
        assert_eq!(a.game_ids(), vec!["1", "2"]);
    }
}
