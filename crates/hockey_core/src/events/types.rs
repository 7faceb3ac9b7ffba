//! # Event Vocabulary
//!
//! Identifier, event-type, season-type and strength-state types shared by
//! every stage of the pipeline.

use crate::error::{Result, StatsError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// League player identifier. Stable across a season; the join key for
/// every aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Play-by-play event type, using the league feed's kebab-case names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    Faceoff,
    Hit,
    BlockedShot,
    MissedShot,
    ShotOnGoal,
    Goal,
    Giveaway,
    Takeaway,
    Penalty,
    DelayedPenalty,
    Change,
    Stoppage,
    PeriodStart,
    PeriodEnd,
    GameEnd,
    Challenge,
    GoalieOn,
    /// Anything the feed emits that the pipeline has no rule for.
    Other(String),
}

impl EventType {
    pub fn as_str(&self) -> &str {
        match self {
            EventType::Faceoff => "faceoff",
            EventType::Hit => "hit",
            EventType::BlockedShot => "blocked-shot",
            EventType::MissedShot => "missed-shot",
            EventType::ShotOnGoal => "shot-on-goal",
            EventType::Goal => "goal",
            EventType::Giveaway => "giveaway",
            EventType::Takeaway => "takeaway",
            EventType::Penalty => "penalty",
            EventType::DelayedPenalty => "delayed-penalty",
            EventType::Change => "change",
            EventType::Stoppage => "stoppage",
            EventType::PeriodStart => "period-start",
            EventType::PeriodEnd => "period-end",
            EventType::GameEnd => "game-end",
            EventType::Challenge => "challenge",
            EventType::GoalieOn => "goalie-on",
            EventType::Other(name) => name,
        }
    }

    /// Unblocked shot attempt: goal, shot on goal or missed shot.
    pub fn is_fenwick(&self) -> bool {
        matches!(
            self,
            EventType::Goal | EventType::ShotOnGoal | EventType::MissedShot
        )
    }

    /// Any shot attempt, blocked or not.
    pub fn is_corsi(&self) -> bool {
        self.is_fenwick() || *self == EventType::BlockedShot
    }
}

impl From<&str> for EventType {
    fn from(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "faceoff" => EventType::Faceoff,
            "hit" => EventType::Hit,
            "blocked-shot" => EventType::BlockedShot,
            "missed-shot" => EventType::MissedShot,
            "shot-on-goal" => EventType::ShotOnGoal,
            "goal" => EventType::Goal,
            "giveaway" => EventType::Giveaway,
            "takeaway" => EventType::Takeaway,
            "penalty" => EventType::Penalty,
            "delayed-penalty" => EventType::DelayedPenalty,
            "change" => EventType::Change,
            "stoppage" => EventType::Stoppage,
            "period-start" => EventType::PeriodStart,
            "period-end" => EventType::PeriodEnd,
            "game-end" => EventType::GameEnd,
            "challenge" => EventType::Challenge,
            "goalie-on" => EventType::GoalieOn,
            other => EventType::Other(other.to_string()),
        }
    }
}

impl From<String> for EventType {
    fn from(raw: String) -> Self {
        EventType::from(raw.as_str())
    }
}

impl From<EventType> for String {
    fn from(event_type: EventType) -> Self {
        event_type.as_str().to_string()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Part of the league calendar a game belongs to. Codes follow the NHL
/// game-id convention (`01` preseason, `02` regular season, `03` playoffs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "SeasonTypeRepr", into = "u8")]
pub enum SeasonType {
    Preseason,
    Regular,
    Playoff,
}

impl SeasonType {
    pub fn code(self) -> u8 {
        match self {
            SeasonType::Preseason => 1,
            SeasonType::Regular => 2,
            SeasonType::Playoff => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(SeasonType::Preseason),
            2 => Some(SeasonType::Regular),
            3 => Some(SeasonType::Playoff),
            _ => None,
        }
    }
}

impl FromStr for SeasonType {
    type Err = StatsError;

    fn from_str(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if let Ok(code) = trimmed.parse::<f64>() {
            if code.fract() == 0.0 && (0.0..=255.0).contains(&code) {
                if let Some(season_type) = SeasonType::from_code(code as u8) {
                    return Ok(season_type);
                }
            }
            return Err(StatsError::InvalidSeasonType(raw.to_string()));
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "pr" | "pre" | "preseason" => Ok(SeasonType::Preseason),
            "r" | "reg" | "regular" => Ok(SeasonType::Regular),
            "p" | "playoff" | "playoffs" => Ok(SeasonType::Playoff),
            _ => Err(StatsError::InvalidSeasonType(raw.to_string())),
        }
    }
}

impl From<SeasonType> for u8 {
    fn from(season_type: SeasonType) -> Self {
        season_type.code()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SeasonTypeRepr {
    Code(u8),
    Name(String),
}

impl TryFrom<SeasonTypeRepr> for SeasonType {
    type Error = StatsError;

    fn try_from(repr: SeasonTypeRepr) -> Result<Self> {
        match repr {
            SeasonTypeRepr::Code(code) => SeasonType::from_code(code)
                .ok_or_else(|| StatsError::InvalidSeasonType(code.to_string())),
            SeasonTypeRepr::Name(name) => name.parse(),
        }
    }
}

/// Skater matchup, away skaters first: `5v4` means the away side has five
/// skaters and the home side four. Goalies are not counted.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct StrengthState {
    pub away: u8,
    pub home: u8,
}

impl StrengthState {
    pub const EVEN: StrengthState = StrengthState { away: 5, home: 5 };

    pub fn new(away: u8, home: u8) -> Self {
        Self { away, home }
    }

    /// Derive the state from live on-ice slots, excluding each side's goalie.
    pub fn from_on_ice(
        away_on: &[PlayerId],
        away_goalie: Option<PlayerId>,
        home_on: &[PlayerId],
        home_goalie: Option<PlayerId>,
    ) -> Self {
        let skaters = |on: &[PlayerId], goalie: Option<PlayerId>| {
            on.iter().filter(|&&id| Some(id) != goalie).count() as u8
        };
        Self {
            away: skaters(away_on, away_goalie),
            home: skaters(home_on, home_goalie),
        }
    }
}

impl fmt::Display for StrengthState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}v{}", self.away, self.home)
    }
}

impl FromStr for StrengthState {
    type Err = StatsError;

    fn from_str(raw: &str) -> Result<Self> {
        let invalid = || StatsError::InvalidStrength(raw.to_string());
        let (away, home) = raw.trim().split_once(['v', 'V']).ok_or_else(invalid)?;
        Ok(Self {
            away: away.trim().parse().map_err(|_| invalid())?,
            home: home.trim().parse().map_err(|_| invalid())?,
        })
    }
}

impl TryFrom<String> for StrengthState {
    type Error = StatsError;

    fn try_from(raw: String) -> Result<Self> {
        raw.parse()
    }
}

impl From<StrengthState> for String {
    fn from(state: StrengthState) -> Self {
        state.to_string()
    }
}

/// Strength-state filter: every state, or an explicit allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "GameStrengthRepr", into = "GameStrengthRepr")]
pub enum GameStrength {
    #[default]
    All,
    Only(Vec<StrengthState>),
}

impl GameStrength {
    pub fn even() -> Self {
        GameStrength::Only(vec![StrengthState::EVEN])
    }

    /// Parse `"all"` or a comma-separated list such as `"5v5,5v4"`.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.trim().eq_ignore_ascii_case("all") {
            return Ok(GameStrength::All);
        }
        let states = raw
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(str::parse)
            .collect::<Result<Vec<StrengthState>>>()?;
        if states.is_empty() {
            return Err(StatsError::InvalidFilter(format!(
                "empty strength list {:?}",
                raw
            )));
        }
        Ok(GameStrength::Only(states))
    }

    pub fn admits(&self, state: StrengthState) -> bool {
        match self {
            GameStrength::All => true,
            GameStrength::Only(states) => states.contains(&state),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, GameStrength::All)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum GameStrengthRepr {
    Keyword(String),
    List(Vec<StrengthState>),
}

impl TryFrom<GameStrengthRepr> for GameStrength {
    type Error = StatsError;

    fn try_from(repr: GameStrengthRepr) -> Result<Self> {
        match repr {
            GameStrengthRepr::Keyword(raw) => GameStrength::parse(&raw),
            GameStrengthRepr::List(states) => Ok(GameStrength::Only(states)),
        }
    }
}

impl From<GameStrength> for GameStrengthRepr {
    fn from(strength: GameStrength) -> Self {
        match strength {
            GameStrength::All => GameStrengthRepr::Keyword("all".to_string()),
            GameStrength::Only(states) => GameStrengthRepr::List(states),
        }
    }
}

/// Season label (`"20212022"`) encoded in the first four digits of an NHL
/// game id.
pub fn season_from_game_id(game_id: &str) -> Option<String> {
    let start: u32 = game_id.get(..4)?.parse().ok()?;
    Some(format!("{}{}", start, start + 1))
}

/// Season type encoded in digits five and six of an NHL game id.
pub fn season_type_from_game_id(game_id: &str) -> Option<SeasonType> {
    let code: u8 = game_id.get(4..6)?.parse().ok()?;
    SeasonType::from_code(code)
}
