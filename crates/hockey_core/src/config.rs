//! # Aggregation Configuration
//!
//! Everything a stats run needs besides the events themselves. Loadable
//! from YAML or JSON.
//!
//! ```rust
//! use hockey_core::config::AggregationConfig;
//!
//! let even = AggregationConfig::five_on_five("20232024");
//! let yaml = "season: '20232024'\nseason_types: [2]\ngame_strength: all\n";
//! let all = AggregationConfig::from_yaml_str(yaml).unwrap();
//! assert!(all.game_strength.is_all());
//! assert!(!even.game_strength.is_all());
//! ```

use crate::error::{Result, StatsError};
use crate::events::{EventFilter, GameStrength, SeasonType};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which shot attempts count toward on-ice FF/FA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnIceFenwick {
    /// Goals, shots on goal and missed shots.
    #[default]
    Unblocked,
    /// Unblocked attempts plus blocked shots.
    AllAttempts,
}

/// How the TOI table is joined onto the individual/on-ice rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOnIceJoin {
    /// Player and team only; one TOI figure spans every season in the input.
    #[default]
    PlayerTeam,
    /// Player, team and season.
    PlayerTeamSeason,
}

fn default_season_types() -> Vec<SeasonType> {
    vec![SeasonType::Regular, SeasonType::Playoff]
}

/// Aggregation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Label for the report, e.g. `"20232024"`. Stamped onto rows that
    /// carry no season of their own.
    pub season: String,
    #[serde(default = "default_season_types")]
    pub season_types: Vec<SeasonType>,
    #[serde(default)]
    pub game_strength: GameStrength,
    #[serde(default)]
    pub on_ice_fenwick: OnIceFenwick,
    #[serde(default)]
    pub toi_join: TimeOnIceJoin,
    /// Build per-game shift timelines on the rayon pool.
    #[serde(default)]
    pub parallel: bool,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            season: String::new(),
            season_types: default_season_types(),
            game_strength: GameStrength::All,
            on_ice_fenwick: OnIceFenwick::default(),
            toi_join: TimeOnIceJoin::default(),
            parallel: false,
        }
    }
}

impl AggregationConfig {
    /// Every situation, regular season and playoffs.
    pub fn all_situations(season: impl Into<String>) -> Self {
        Self {
            season: season.into(),
            ..Self::default()
        }
    }

    /// Even strength only.
    pub fn five_on_five(season: impl Into<String>) -> Self {
        Self {
            season: season.into(),
            game_strength: GameStrength::even(),
            ..Self::default()
        }
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.yaml`/`.yml` or `.json` file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&raw),
            Some("json") => Self::from_json_str(&raw),
            other => Err(StatsError::Config(format!(
                "unsupported config extension {:?} for {}",
                other,
                path.display()
            ))),
        }
    }

    pub fn filter(&self) -> EventFilter {
        EventFilter::new(self.season_types.clone(), self.game_strength.clone())
    }

    pub fn validate(&self) -> Result<()> {
        self.filter().validate()
    }
}
