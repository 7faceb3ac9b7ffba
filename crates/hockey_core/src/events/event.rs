//! # Play-by-Play Event Row
//!
//! One normalized play-by-play entry. On-ice rosters are held as ordered
//! id lists per side; unused slots are simply absent.

use super::types::{EventType, PlayerId, SeasonType, StrengthState};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Maximum number of on-ice slots per side in the feed.
pub const ON_ICE_SLOTS: usize = 6;

/// Final regulation-or-overtime period; period 5 is the shootout.
pub const LAST_COUNTED_PERIOD: u8 = 4;

/// Home or away half of an event row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Home, Side::Away];

    pub fn opponent(self) -> Side {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }
}

/// A single play-by-play row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub game_id: String,
    pub season: String,
    pub season_type: SeasonType,
    pub period: u8,
    /// Seconds since opening faceoff, period-adjusted.
    pub seconds_elapsed: u32,
    /// Feed sequence number within the game, when the source has one.
    #[serde(default)]
    pub event_num: Option<u32>,
    pub event_type: EventType,
    pub event_team_abbr: Option<String>,
    pub home_team_abbr: String,
    pub away_team_abbr: String,
    pub strength_state: Option<StrengthState>,

    /// Shooter/scorer, primary assist, secondary assist (role depends on type).
    #[serde(default)]
    pub event_player_ids: [Option<PlayerId>; 3],
    #[serde(default)]
    pub event_player_names: [Option<String>; 3],
    #[serde(default)]
    pub event_goalie: Option<PlayerId>,

    #[serde(default)]
    pub home_on: Vec<PlayerId>,
    #[serde(default)]
    pub away_on: Vec<PlayerId>,
    #[serde(default)]
    pub home_goalie: Option<PlayerId>,
    #[serde(default)]
    pub away_goalie: Option<PlayerId>,

    #[serde(default, rename = "xG")]
    pub xg: Option<f64>,
    /// Seconds this on-ice configuration persisted.
    #[serde(default)]
    pub event_length: Option<f64>,
    #[serde(default)]
    pub rush_mod: Option<f64>,
}

impl Event {
    /// Bare event with empty rosters; tests and loaders fill in the rest.
    pub fn new(
        game_id: impl Into<String>,
        season: impl Into<String>,
        event_type: EventType,
        period: u8,
        seconds_elapsed: u32,
    ) -> Self {
        Self {
            game_id: game_id.into(),
            season: season.into(),
            season_type: SeasonType::Regular,
            period,
            seconds_elapsed,
            event_num: None,
            event_type,
            event_team_abbr: None,
            home_team_abbr: String::new(),
            away_team_abbr: String::new(),
            strength_state: None,
            event_player_ids: [None; 3],
            event_player_names: [None, None, None],
            event_goalie: None,
            home_on: Vec::new(),
            away_on: Vec::new(),
            home_goalie: None,
            away_goalie: None,
            xg: None,
            event_length: None,
            rush_mod: None,
        }
    }

    /// Shooter, scorer, hitter, etc.
    pub fn player_1(&self) -> Option<PlayerId> {
        self.event_player_ids[0]
    }

    /// Primary assist on goals.
    pub fn player_2(&self) -> Option<PlayerId> {
        self.event_player_ids[1]
    }

    /// Secondary assist on goals.
    pub fn player_3(&self) -> Option<PlayerId> {
        self.event_player_ids[2]
    }

    pub fn on_ice(&self, side: Side) -> &[PlayerId] {
        match side {
            Side::Home => &self.home_on,
            Side::Away => &self.away_on,
        }
    }

    pub fn team(&self, side: Side) -> &str {
        match side {
            Side::Home => &self.home_team_abbr,
            Side::Away => &self.away_team_abbr,
        }
    }

    /// Which side acted, if the acting team is one of the two in the game.
    pub fn acting_side(&self) -> Option<Side> {
        let team = self.event_team_abbr.as_deref()?;
        if team == self.home_team_abbr {
            Some(Side::Home)
        } else if team == self.away_team_abbr {
            Some(Side::Away)
        } else {
            None
        }
    }

    /// xG with nulls counted as zero.
    pub fn xg_or_zero(&self) -> f64 {
        self.xg.filter(|v| v.is_finite()).unwrap_or(0.0)
    }

    /// Strength derived from the on-ice slots rather than the feed label.
    pub fn derived_strength(&self) -> StrengthState {
        StrengthState::from_on_ice(&self.away_on, self.away_goalie, &self.home_on, self.home_goalie)
    }

    pub fn is_shootout(&self) -> bool {
        self.period > LAST_COUNTED_PERIOD
    }

    /// Chronological sort key within a game.
    pub fn order_key(&self) -> (u8, u32, u32) {
        (self.period, self.seconds_elapsed, self.event_num.unwrap_or(0))
    }

    /// Total order over rows: game, then [`Event::order_key`], then row
    /// content. Rows sharing a second without an `event_num` therefore sort
    /// the same way whatever order they arrived in.
    pub fn chronological_cmp(&self, other: &Event) -> Ordering {
        self.game_id
            .cmp(&other.game_id)
            .then_with(|| self.order_key().cmp(&other.order_key()))
            .then_with(|| self.event_type.as_str().cmp(other.event_type.as_str()))
            .then_with(|| self.event_team_abbr.cmp(&other.event_team_abbr))
            .then_with(|| self.event_player_ids.cmp(&other.event_player_ids))
            .then_with(|| self.home_on.cmp(&other.home_on))
            .then_with(|| self.away_on.cmp(&other.away_on))
            .then_with(|| self.home_goalie.cmp(&other.home_goalie))
            .then_with(|| self.away_goalie.cmp(&other.away_goalie))
            .then_with(|| cmp_measure(self.xg, other.xg))
            .then_with(|| cmp_measure(self.event_length, other.event_length))
            .then_with(|| cmp_measure(self.rush_mod, other.rush_mod))
    }
}

fn cmp_measure(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        _ => a.is_some().cmp(&b.is_some()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acting_side_matches_team_abbr() {
        let mut event = Event::new("2021020045", "20212022", EventType::Goal, 1, 100);
        event.home_team_abbr = "TOR".into();
        event.away_team_abbr = "MTL".into();
        event.event_team_abbr = Some("MTL".into());
        assert_eq!(event.acting_side(), Some(Side::Away));

        event.event_team_abbr = Some("BOS".into());
        assert_eq!(event.acting_side(), None);

        event.event_team_abbr = None;
        assert_eq!(event.acting_side(), None);
    }

    #[test]
    fn test_null_and_nan_xg_count_as_zero() {
        let mut event = Event::new("g", "s", EventType::ShotOnGoal, 1, 5);
        assert_eq!(event.xg_or_zero(), 0.0);
        event.xg = Some(f64::NAN);
        assert_eq!(event.xg_or_zero(), 0.0);
        event.xg = Some(0.25);
        assert_eq!(event.xg_or_zero(), 0.25);
    }

    #[test]
    fn test_shootout_period() {
        assert!(!Event::new("g", "s", EventType::Goal, 4, 3900).is_shootout());
        assert!(Event::new("g", "s", EventType::Goal, 5, 3900).is_shootout());
    }

    #[test]
    fn test_chronological_cmp_breaks_same_second_ties_by_content() {
        let mut a = Event::new("2021020045", "20212022", EventType::Change, 1, 30);
        a.home_on = vec![PlayerId(2)];
        let mut b = a.clone();
        b.home_on = vec![PlayerId(3)];

        assert_eq!(a.order_key(), b.order_key());
        assert_eq!(a.chronological_cmp(&b), Ordering::Less);
        assert_eq!(b.chronological_cmp(&a), Ordering::Greater);

        b.event_num = Some(1);
        a.event_num = Some(2);
        assert_eq!(a.chronological_cmp(&b), Ordering::Greater);
    }
}
