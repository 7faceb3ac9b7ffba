//! # Events Module
//!
//! Normalized play-by-play schema and the filtering that precedes
//! aggregation.
//!
//! - `types` - ids, event types, season types, strength states
//! - `event` - one play-by-play row
//! - `table` - rows plus the column schema their source carried
//! - `filter` - season-type / period / strength selection, shift split

pub mod event;
pub mod filter;
pub mod table;
pub mod types;

pub use event::{Event, Side, LAST_COUNTED_PERIOD, ON_ICE_SLOTS};
pub use filter::{remove_event_types, split_shifts, EventFilter, DEFAULT_REMOVED};
pub use table::{Column, EventTable};
pub use types::{
    season_from_game_id, season_type_from_game_id, EventType, GameStrength, PlayerId, SeasonType,
    StrengthState,
};
