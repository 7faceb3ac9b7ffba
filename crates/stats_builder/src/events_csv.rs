//! Play-by-play CSV reader and writer
//!
//! Reads the flat event layout (one row per event, six on-ice slot columns
//! per side) into an [`EventTable`]. The table's schema is taken from the
//! header row, so a file without e.g. `xG` yields a table without
//! [`Column::Xg`] and the core decides whether that is fatal.
//!
//! Feeds exported through dataframes write integer ids as floats
//! (`8478402.0`) and missing values as `nan`; both are accepted.

use anyhow::{bail, Context, Result};
use hockey_core::events::{
    season_from_game_id, season_type_from_game_id, Column, Event, EventTable, EventType,
    PlayerId, SeasonType, StrengthState, ON_ICE_SLOTS,
};
use hockey_core::{EventSource, StatsError};
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Row counts from one load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadStats {
    pub rows: u32,
    /// Rows whose `strength_state` could not be parsed and was left empty.
    pub bad_strength: u32,
    /// Whether season or season type had to be derived from game ids.
    pub derived_season: bool,
}

/// Header name → field index.
struct Headers {
    index: FxHashMap<String, usize>,
}

impl Headers {
    fn new(record: &csv::StringRecord) -> Self {
        let index = record
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().trim_start_matches('\u{feff}').to_string(), i))
            .collect();
        Self { index }
    }

    fn has(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Trimmed cell, `None` for absent columns, empty cells and `nan`.
    fn get<'r>(&self, record: &'r csv::StringRecord, name: &str) -> Option<&'r str> {
        let raw = record.get(*self.index.get(name)?)?.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("nan") || raw.eq_ignore_ascii_case("na") {
            None
        } else {
            Some(raw)
        }
    }
}

/// Integer that may have been written as a float.
fn parse_int(raw: &str) -> Option<u64> {
    if let Ok(v) = raw.parse::<u64>() {
        return Some(v);
    }
    let v = raw.parse::<f64>().ok()?;
    if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 {
        Some(v as u64)
    } else {
        None
    }
}

/// Id-like text column (`game_id`, `season`), with a float suffix removed.
fn parse_label(raw: &str) -> String {
    match parse_int(raw) {
        Some(v) => v.to_string(),
        None => raw.to_string(),
    }
}

fn parse_float(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| !v.is_nan())
}

fn parse_player(headers: &Headers, record: &csv::StringRecord, name: &str) -> Option<PlayerId> {
    headers.get(record, name).and_then(parse_int).map(PlayerId)
}

fn required<'r>(
    headers: &Headers,
    record: &'r csv::StringRecord,
    name: &str,
    line: u64,
) -> Result<&'r str> {
    match headers.get(record, name) {
        Some(v) => Ok(v),
        None => bail!("line {}: `{}` is empty", line, name),
    }
}

fn header_columns(headers: &Headers) -> Vec<Column> {
    let mut columns: Vec<Column> = headers
        .index
        .keys()
        .filter_map(|h| Column::from_header(h))
        .collect();
    columns.sort();
    columns.dedup();
    columns
}

/// Parse play-by-play CSV from any reader.
pub fn read_events_from<R: std::io::Read>(reader: R) -> Result<(EventTable, LoadStats)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers = Headers::new(reader.headers().context("Failed to read CSV header")?);
    let mut columns = header_columns(&headers);

    for column in ["game_id", "event_type", "period", "seconds_elapsed"] {
        if !headers.has(column) {
            bail!(StatsError::MissingColumn {
                column,
                stage: "event CSV load",
            });
        }
    }

    let mut stats = LoadStats::default();
    let mut derived_all = true;
    let mut events = Vec::new();

    for result in reader.records() {
        let record = result.context("Failed to read CSV record")?;
        stats.rows += 1;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let game_id = parse_label(required(&headers, &record, "game_id", line)?);
        let season = match headers.get(&record, "season") {
            Some(raw) => Some(parse_label(raw)),
            None => season_from_game_id(&game_id),
        };
        let raw_period = required(&headers, &record, "period", line)?;
        let Some(period) = parse_int(raw_period).and_then(|p| u8::try_from(p).ok()) else {
            bail!("line {}: invalid period {:?}", line, raw_period);
        };
        let raw_seconds = required(&headers, &record, "seconds_elapsed", line)?;
        let Some(seconds) = parse_int(raw_seconds).and_then(|s| u32::try_from(s).ok()) else {
            bail!("line {}: invalid seconds_elapsed {:?}", line, raw_seconds);
        };
        let event_type = EventType::from(required(&headers, &record, "event_type", line)?);

        let mut event = Event::new(
            game_id,
            season.clone().unwrap_or_default(),
            event_type,
            period,
            seconds,
        );

        let season_type = match headers.get(&record, "season_type") {
            Some(raw) => Some(
                raw.parse::<SeasonType>()
                    .with_context(|| format!("line {}: invalid season_type", line))?,
            ),
            None => season_type_from_game_id(&event.game_id),
        };
        match season_type {
            Some(st) => event.season_type = st,
            None => derived_all = false,
        }
        if season.is_none() {
            derived_all = false;
        }

        event.event_num = headers
            .get(&record, "event_num")
            .and_then(parse_int)
            .and_then(|n| u32::try_from(n).ok());
        event.event_team_abbr = headers.get(&record, "event_team_abbr").map(str::to_string);
        event.home_team_abbr = headers
            .get(&record, "home_team_abbr")
            .unwrap_or_default()
            .to_string();
        event.away_team_abbr = headers
            .get(&record, "away_team_abbr")
            .unwrap_or_default()
            .to_string();

        event.strength_state = match headers.get(&record, "strength_state") {
            Some(raw) => match raw.parse::<StrengthState>() {
                Ok(state) => Some(state),
                Err(_) => {
                    stats.bad_strength += 1;
                    None
                }
            },
            None => None,
        };

        for n in 0..3 {
            event.event_player_ids[n] =
                parse_player(&headers, &record, &format!("event_player_{}_id", n + 1));
            event.event_player_names[n] = headers
                .get(&record, &format!("event_player_{}_name", n + 1))
                .map(str::to_string);
        }
        event.event_goalie = parse_player(&headers, &record, "event_goalie_id");

        for slot in 1..=ON_ICE_SLOTS {
            if let Some(id) = parse_player(&headers, &record, &format!("home_on_{}_id", slot)) {
                event.home_on.push(id);
            }
            if let Some(id) = parse_player(&headers, &record, &format!("away_on_{}_id", slot)) {
                event.away_on.push(id);
            }
        }
        event.home_goalie = parse_player(&headers, &record, "home_goalie_id");
        event.away_goalie = parse_player(&headers, &record, "away_goalie_id");

        event.xg = headers.get(&record, "xG").and_then(parse_float);
        event.event_length = headers.get(&record, "event_length").and_then(parse_float);
        event.rush_mod = headers.get(&record, "rush_mod").and_then(parse_float);

        events.push(event);
    }

    if derived_all && !events.is_empty() {
        for column in [Column::Season, Column::SeasonType] {
            if !columns.contains(&column) {
                columns.push(column);
                stats.derived_season = true;
            }
        }
    }
    if stats.bad_strength > 0 {
        warn!(rows = stats.bad_strength, "unparsable strength_state left empty");
    }
    debug!(rows = stats.rows, columns = columns.len(), "parsed event CSV");
    Ok((EventTable::with_columns(events, columns), stats))
}

/// Read a play-by-play CSV file.
pub fn read_events(path: &Path) -> Result<(EventTable, LoadStats)> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open event CSV: {}", path.display()))?;
    let (table, stats) = read_events_from(file)
        .with_context(|| format!("Failed to parse event CSV: {}", path.display()))?;
    info!(path = %path.display(), rows = stats.rows, games = table.game_ids().len(), "loaded events");
    Ok((table, stats))
}

const WRITE_HEADER: [&str; 18] = [
    "game_id",
    "season",
    "season_type",
    "period",
    "seconds_elapsed",
    "event_num",
    "event_type",
    "event_team_abbr",
    "home_team_abbr",
    "away_team_abbr",
    "strength_state",
    "event_player_1_id",
    "event_player_2_id",
    "event_player_3_id",
    "event_goalie_id",
    "xG",
    "event_length",
    "rush_mod",
];

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Write events in the same flat layout [`read_events`] accepts.
pub fn write_events(table: &EventTable, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create event CSV: {}", path.display()))?;

    let mut header: Vec<String> = WRITE_HEADER.iter().map(|h| h.to_string()).collect();
    for n in 1..=3 {
        header.push(format!("event_player_{}_name", n));
    }
    for side in ["home", "away"] {
        for slot in 1..=ON_ICE_SLOTS {
            header.push(format!("{}_on_{}_id", side, slot));
        }
        header.push(format!("{}_goalie_id", side));
    }
    writer.write_record(&header)?;

    for e in table.events() {
        let mut row = vec![
            e.game_id.clone(),
            e.season.clone(),
            e.season_type.code().to_string(),
            e.period.to_string(),
            e.seconds_elapsed.to_string(),
            opt(e.event_num),
            e.event_type.as_str().to_string(),
            e.event_team_abbr.clone().unwrap_or_default(),
            e.home_team_abbr.clone(),
            e.away_team_abbr.clone(),
            opt(e.strength_state),
            opt(e.event_player_ids[0]),
            opt(e.event_player_ids[1]),
            opt(e.event_player_ids[2]),
            opt(e.event_goalie),
            opt(e.xg),
            opt(e.event_length),
            opt(e.rush_mod),
        ];
        row.extend(e.event_player_names.iter().map(|n| n.clone().unwrap_or_default()));
        for (on_ice, goalie) in [(&e.home_on, e.home_goalie), (&e.away_on, e.away_goalie)] {
            for slot in 0..ON_ICE_SLOTS {
                row.push(opt(on_ice.get(slot)));
            }
            row.push(opt(goalie));
        }
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Event CSVs laid out one file per season. `{season}` in the template is
/// replaced by the requested season label.
#[derive(Debug, Clone)]
pub struct CsvEventSource {
    template: String,
}

impl CsvEventSource {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn path_for(&self, season: &str) -> PathBuf {
        PathBuf::from(self.template.replace("{season}", season))
    }
}

impl EventSource for CsvEventSource {
    fn load_events(&self, season: &str) -> hockey_core::Result<EventTable> {
        let path = self.path_for(season);
        read_events(&path)
            .map(|(table, _)| table)
            .map_err(|e| StatsError::Source(format!("{:#}", e)))
    }
}
