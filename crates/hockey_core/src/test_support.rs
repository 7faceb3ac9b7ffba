//! Synthetic game fixtures shared by the unit tests.

use crate::events::{
    season_from_game_id, season_type_from_game_id, Event, EventTable, EventType, PlayerId,
    SeasonType, StrengthState,
};

/// Builds one game's play-by-play in chronological order. Plays inherit the
/// roster of the most recent `change`.
pub struct GameBuilder {
    game_id: String,
    season: String,
    season_type: SeasonType,
    home: String,
    away: String,
    home_on: Vec<PlayerId>,
    away_on: Vec<PlayerId>,
    events: Vec<Event>,
}

impl GameBuilder {
    pub fn new(game_id: &str, home: &str, away: &str) -> Self {
        Self {
            game_id: game_id.to_string(),
            season: season_from_game_id(game_id).unwrap_or_else(|| "20232024".to_string()),
            season_type: season_type_from_game_id(game_id).unwrap_or(SeasonType::Regular),
            home: home.to_string(),
            away: away.to_string(),
            home_on: Vec::new(),
            away_on: Vec::new(),
            events: Vec::new(),
        }
    }

    fn base(&self, event_type: EventType, second: u32) -> Event {
        let mut event = Event::new(
            self.game_id.clone(),
            self.season.clone(),
            event_type,
            (second / 1200 + 1).min(4) as u8,
            second,
        );
        event.season_type = self.season_type;
        event.event_num = Some(self.events.len() as u32 + 1);
        event.home_team_abbr = self.home.clone();
        event.away_team_abbr = self.away.clone();
        event.home_on = self.home_on.clone();
        event.away_on = self.away_on.clone();
        event.strength_state = Some(event.derived_strength());
        event
    }

    /// Line change at `second`; the given skaters become the on-ice roster.
    pub fn change(&mut self, second: u32, home: &[u64], away: &[u64]) -> &mut Self {
        self.home_on = home.iter().copied().map(PlayerId).collect();
        self.away_on = away.iter().copied().map(PlayerId).collect();
        let event = self.base(EventType::Change, second);
        self.events.push(event);
        self
    }

    pub fn shot(
        &mut self,
        event_type: EventType,
        second: u32,
        team: &str,
        players: [Option<u64>; 3],
        xg: f64,
    ) -> &mut Self {
        let mut event = self.base(event_type, second);
        event.event_team_abbr = Some(team.to_string());
        event.event_player_ids = players.map(|p| p.map(PlayerId));
        event.xg = Some(xg);
        event.event_length = Some(1.0);
        self.events.push(event);
        self
    }

    /// Shot with an explicit feed strength label.
    pub fn shot_at(
        &mut self,
        event_type: EventType,
        second: u32,
        team: &str,
        shooter: u64,
        strength: &str,
    ) -> &mut Self {
        self.shot(event_type, second, team, [Some(shooter), None, None], 0.1);
        if let Some(last) = self.events.last_mut() {
            last.strength_state = strength.parse::<StrengthState>().ok();
        }
        self
    }

    pub fn event(&mut self, event_type: EventType, second: u32) -> &mut Self {
        let event = self.base(event_type, second);
        self.events.push(event);
        self
    }

    pub fn shootout_goal(&mut self, second: u32, team: &str, shooter: u64) -> &mut Self {
        let mut event = self.base(EventType::Goal, second);
        event.period = 5;
        event.event_team_abbr = Some(team.to_string());
        event.event_player_ids[0] = Some(PlayerId(shooter));
        self.events.push(event);
        self
    }

    pub fn end(&mut self, second: u32) -> &mut Self {
        self.event(EventType::GameEnd, second)
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.clone()
    }

    pub fn build(&self) -> EventTable {
        EventTable::from_events(self.events())
    }
}

/// Concatenate several games into one table.
pub fn season_table(games: &[&GameBuilder]) -> EventTable {
    EventTable::from_events(games.iter().flat_map(|g| g.events()).collect())
}
