//! Roster and precomputed-xG CSV loaders

use anyhow::{bail, Context, Result};
use hockey_core::{PlayerId, PrecomputedXg, Roster, RosterEntry};
use std::path::Path;
use tracing::info;

fn column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers.iter().position(|h| {
        let h = h.trim().trim_start_matches('\u{feff}');
        names.iter().any(|n| *n == h)
    })
}

fn parse_id(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    raw.parse::<u64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0 && v.fract() == 0.0)
            .map(|v| v as u64)
    })
}

fn cell(record: &csv::StringRecord, idx: Option<usize>) -> Option<String> {
    let raw = record.get(idx?)?.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        None
    } else {
        Some(raw.to_string())
    }
}

/// Roster CSV: `id, fullName[, team_abbr, season]`. Rows without an id or
/// name are skipped.
pub fn read_roster_from<R: std::io::Read>(reader: R) -> Result<Vec<RosterEntry>> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers().context("Failed to read roster header")?.clone();
    let (Some(id_col), Some(name_col)) = (
        column(&headers, &["id", "player_id"]),
        column(&headers, &["fullName", "full_name", "name"]),
    ) else {
        bail!("roster CSV needs `id` and `fullName` columns");
    };
    let team_col = column(&headers, &["team_abbr", "team"]);
    let season_col = column(&headers, &["season"]);

    let mut entries = Vec::new();
    for result in reader.records() {
        let record = result.context("Failed to read roster record")?;
        let Some(id) = cell(&record, Some(id_col)).as_deref().and_then(parse_id) else {
            continue;
        };
        let Some(name) = cell(&record, Some(name_col)) else {
            continue;
        };
        entries.push(RosterEntry {
            id: PlayerId(id),
            name,
            team: cell(&record, team_col),
            season: cell(&record, season_col),
        });
    }
    Ok(entries)
}

pub fn read_roster(path: &Path) -> Result<Roster> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open roster CSV: {}", path.display()))?;
    let entries = read_roster_from(file)
        .with_context(|| format!("Failed to parse roster CSV: {}", path.display()))?;
    let roster = Roster::from_entries(entries);
    info!(path = %path.display(), players = roster.len(), "loaded roster");
    Ok(roster)
}

/// xG CSV: `game_id, event_num, xG`.
pub fn read_xg_from<R: std::io::Read>(reader: R) -> Result<PrecomputedXg> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers().context("Failed to read xG header")?.clone();
    let (Some(game_col), Some(num_col), Some(xg_col)) = (
        column(&headers, &["game_id"]),
        column(&headers, &["event_num"]),
        column(&headers, &["xG", "xg"]),
    ) else {
        bail!("xG CSV needs `game_id`, `event_num` and `xG` columns");
    };

    let mut model = PrecomputedXg::new();
    for result in reader.records() {
        let record = result.context("Failed to read xG record")?;
        let game = cell(&record, Some(game_col));
        let num = cell(&record, Some(num_col)).as_deref().and_then(parse_id);
        let xg = cell(&record, Some(xg_col)).and_then(|v| v.parse::<f64>().ok());
        if let (Some(game), Some(num), Some(xg)) = (game, num, xg) {
            let game = parse_id(&game).map(|g| g.to_string()).unwrap_or(game);
            model.insert(game, num as u32, xg);
        }
    }
    Ok(model)
}

pub fn read_xg(path: &Path) -> Result<PrecomputedXg> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open xG CSV: {}", path.display()))?;
    let model = read_xg_from(file)
        .with_context(|| format!("Failed to parse xG CSV: {}", path.display()))?;
    info!(path = %path.display(), scores = model.len(), "loaded precomputed xG");
    Ok(model)
}
