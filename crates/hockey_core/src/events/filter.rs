//! # Event Filtering
//!
//! Selects the rows eligible for aggregation and splits shift-change rows
//! from plays.
//!
//! ## Rules
//! 1. `season_type` must be in the requested set
//! 2. Shootout rows (period 5+) never count
//! 3. Unless the strength filter is `all`, the row's `strength_state`
//!    must be listed; rows with no strength label are dropped

use super::event::Event;
use super::table::{Column, EventTable};
use super::types::{EventType, GameStrength, SeasonType};
use crate::error::{Result, StatsError};
use tracing::debug;

/// Event types dropped from plays by default when splitting out shifts.
pub const DEFAULT_REMOVED: [EventType; 4] = [
    EventType::PeriodStart,
    EventType::PeriodEnd,
    EventType::Challenge,
    EventType::Stoppage,
];

/// Season-type and strength filter applied before aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct EventFilter {
    pub season_types: Vec<SeasonType>,
    pub game_strength: GameStrength,
}

impl EventFilter {
    pub fn new(season_types: Vec<SeasonType>, game_strength: GameStrength) -> Self {
        Self {
            season_types,
            game_strength,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.season_types.is_empty() {
            return Err(StatsError::InvalidFilter(
                "season_types must name at least one season type".to_string(),
            ));
        }
        if let GameStrength::Only(states) = &self.game_strength {
            if states.is_empty() {
                return Err(StatsError::InvalidFilter(
                    "game_strength list is empty; use \"all\" for every state".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Season-type and period checks only, ignoring strength.
    pub fn admits_period(&self, event: &Event) -> bool {
        self.season_types.contains(&event.season_type) && !event.is_shootout()
    }

    pub fn admits(&self, event: &Event) -> bool {
        if !self.admits_period(event) {
            return false;
        }
        match (&self.game_strength, event.strength_state) {
            (GameStrength::All, _) => true,
            (strength, Some(state)) => strength.admits(state),
            (_, None) => false,
        }
    }

    /// Rows eligible for aggregation.
    pub fn apply(&self, table: &EventTable) -> Result<EventTable> {
        self.validate()?;
        table.require(&[Column::SeasonType, Column::Period], "event filtering")?;
        if !self.game_strength.is_all() {
            table.require(&[Column::StrengthState], "strength filtering")?;
        }

        let filtered = table.filtered(|e| self.admits(e));
        debug!(
            input = table.len(),
            kept = filtered.len(),
            strength = ?self.game_strength,
            "filtered play-by-play"
        );
        Ok(filtered)
    }
}

/// Drop every row whose type is in `remove`.
pub fn remove_event_types(table: &EventTable, remove: &[EventType]) -> EventTable {
    table.filtered(|e| !remove.contains(&e.event_type))
}

/// Split a combined feed into plays (minus `remove`) and `change` rows.
pub fn split_shifts(table: &EventTable, remove: &[EventType]) -> (EventTable, EventTable) {
    let plays =
        table.filtered(|e| e.event_type != EventType::Change && !remove.contains(&e.event_type));
    let shifts = table.filtered(|e| e.event_type == EventType::Change);
    (plays, shifts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::StrengthState;
    use crate::test_support::GameBuilder;

    fn mixed_game() -> EventTable {
        let mut game = GameBuilder::new("2021020045", "TOR", "MTL");
        game.change(0, &[1, 2, 3, 4, 5], &[11, 12, 13, 14, 15]);
        game.shot(EventType::Goal, 100, "TOR", [Some(1), Some(2), None], 0.3);
        game.shot_at(EventType::ShotOnGoal, 200, "MTL", 11, "5v4");
        game.shot_at(EventType::MissedShot, 300, "TOR", 1, "4v5");
        game.event(EventType::Stoppage, 301);
        game.shootout_goal(3905, "TOR", 1);
        game.build()
    }

    #[test]
    fn test_shootout_always_excluded() {
        let filter = EventFilter::new(vec![SeasonType::Regular], GameStrength::All);
        let kept = filter.apply(&mixed_game()).unwrap();
        assert!(kept.events().iter().all(|e| e.period < 5));
        assert_eq!(kept.len(), mixed_game().len() - 1);
    }

    #[test]
    fn test_strength_filter_drops_other_states() {
        let filter = EventFilter::new(vec![SeasonType::Regular], GameStrength::even());
        let kept = filter.apply(&mixed_game()).unwrap();
        assert!(kept
            .events()
            .iter()
            .all(|e| e.strength_state == Some(StrengthState::EVEN)));
        assert!(!kept.events().iter().any(|e| e.seconds_elapsed == 200));
        assert!(!kept.events().iter().any(|e| e.seconds_elapsed == 300));
    }

    #[test]
    fn test_season_type_filter() {
        let filter = EventFilter::new(vec![SeasonType::Playoff], GameStrength::All);
        assert!(filter.apply(&mixed_game()).unwrap().is_empty());
    }

    #[test]
    fn test_empty_filters_rejected() {
        let no_types = EventFilter::new(vec![], GameStrength::All);
        assert!(matches!(
            no_types.apply(&mixed_game()),
            Err(StatsError::InvalidFilter(_))
        ));
        let no_states = EventFilter::new(vec![SeasonType::Regular], GameStrength::Only(vec![]));
        assert!(no_states.validate().is_err());
    }

    #[test]
    fn test_strength_column_required_only_when_filtering() {
        let table = mixed_game().without_column(Column::StrengthState);
        let all = EventFilter::new(vec![SeasonType::Regular], GameStrength::All);
        assert!(all.apply(&table).is_ok());
        let even = EventFilter::new(vec![SeasonType::Regular], GameStrength::even());
        assert!(matches!(
            even.apply(&table),
            Err(StatsError::MissingColumn { column: "strength_state", .. })
        ));
    }

    #[test]
    fn test_split_shifts_separates_changes() {
        let (plays, shifts) = split_shifts(&mixed_game(), &DEFAULT_REMOVED);
        assert!(shifts.events().iter().all(|e| e.event_type == EventType::Change));
        assert_eq!(shifts.len(), 1);
        assert!(!plays
            .events()
            .iter()
            .any(|e| matches!(e.event_type, EventType::Change | EventType::Stoppage)));

        let without_goals = remove_event_types(&plays, &[EventType::Goal]);
        assert!(without_goals.events().iter().all(|e| e.event_type != EventType::Goal));
    }
}
