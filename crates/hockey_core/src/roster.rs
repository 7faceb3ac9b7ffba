//! # Roster Reference
//!
//! Player display names keyed by id, plus the name-based id fallback used
//! for feeds that only carry names.
//!
//! Names are NOT unique: two players can share one. Name resolution only
//! succeeds for names that map to exactly one id.

use crate::events::{EventTable, PlayerId};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One roster line as published per team and season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub season: Option<String>,
}

impl RosterEntry {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            team: None,
            season: None,
        }
    }
}

/// Id → display name lookup, with a reverse index for the name fallback.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    names: FxHashMap<PlayerId, String>,
    by_name: FxHashMap<String, Vec<PlayerId>>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from entries. The first name seen for an id wins, so a player
    /// listed on several teams or seasons keeps one display name.
    pub fn from_entries(entries: impl IntoIterator<Item = RosterEntry>) -> Self {
        let mut roster = Self::new();
        for entry in entries {
            roster.insert(entry.id, entry.name);
        }
        roster
    }

    pub fn insert(&mut self, id: PlayerId, name: String) {
        if self.names.contains_key(&id) {
            return;
        }
        let ids = self.by_name.entry(normalize_name(&name)).or_default();
        if !ids.contains(&id) {
            ids.push(id);
        }
        self.names.insert(id, name);
    }

    pub fn name_of(&self, id: PlayerId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Id for `name` if exactly one rostered player carries it.
    pub fn resolve_name(&self, name: &str) -> Option<PlayerId> {
        match self.by_name.get(&normalize_name(name))?.as_slice() {
            [only] => Some(*only),
            many => {
                warn!(player = name, candidates = many.len(), "ambiguous player name left unresolved");
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Fill missing `event_player_N` ids from their names. Returns how many
/// slots were filled.
pub fn backfill_player_ids(table: &mut EventTable, roster: &Roster) -> usize {
    let mut filled = 0;
    for event in table.events_mut() {
        for slot in 0..3 {
            if event.event_player_ids[slot].is_some() {
                continue;
            }
            let Some(name) = event.event_player_names[slot].as_deref() else {
                continue;
            };
            if let Some(id) = roster.resolve_name(name) {
                event.event_player_ids[slot] = Some(id);
                filled += 1;
            }
        }
    }
    debug!(filled, "backfilled player ids from names");
    filled
}
