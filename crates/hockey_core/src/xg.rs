//! # Expected Goals Hook
//!
//! The xG model is external; the pipeline only needs a scoring function
//! over events. When the play-by-play arrives without an `xG` column the
//! model is run over the filtered rows before aggregation.

use crate::error::{Result, StatsError};
use crate::events::{Column, Event, EventTable};
use rustc_hash::FxHashMap;
use tracing::info;

/// Scores one event with a goal probability in `[0, 1]`, or `None` when the
/// event is not a shot the model understands.
pub trait XgModel: Send + Sync {
    fn name(&self) -> &str;

    fn score(&self, event: &Event) -> Option<f64>;
}

/// Scores produced offline, keyed by `(game_id, event_num)`.
#[derive(Debug, Clone, Default)]
pub struct PrecomputedXg {
    scores: FxHashMap<(String, u32), f64>,
}

impl PrecomputedXg {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, game_id: impl Into<String>, event_num: u32, xg: f64) {
        self.scores.insert((game_id.into(), event_num), xg);
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

impl XgModel for PrecomputedXg {
    fn name(&self) -> &str {
        "precomputed"
    }

    fn score(&self, event: &Event) -> Option<f64> {
        let num = event.event_num?;
        self.scores.get(&(event.game_id.clone(), num)).copied()
    }
}

/// Make sure the table has an `xG` column, scoring it with `model` if the
/// source did not provide one. Scores outside `[0, 1]` are clamped.
pub fn ensure_xg(table: &mut EventTable, model: Option<&dyn XgModel>) -> Result<()> {
    if table.has_column(Column::Xg) {
        return Ok(());
    }
    let model = model.ok_or(StatsError::MissingColumn {
        column: Column::Xg.name(),
        stage: "xG backfill (no model supplied)",
    })?;

    let mut scored = 0usize;
    for event in table.events_mut() {
        event.xg = model.score(event).map(|p| p.clamp(0.0, 1.0));
        if event.xg.is_some() {
            scored += 1;
        }
    }
    table.mark_column(Column::Xg);
    info!(model = model.name(), rows = table.len(), scored, "applied xG model");
    Ok(())
}
