//! Stats Builder CLI
//!
//! Play-by-play CSV → per-player stats report
//! Shift dumps, feed splitting and report verification

#[cfg(feature = "cli")]
use anyhow::{Context, Result};
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use hockey_core::{AggregationConfig, GameStrength, Roster, SeasonType, XgModel};
#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use tracing::info;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "stats_builder")]
#[command(about = "Aggregate hockey play-by-play into skater stats", long_about = None)]
struct Cli {
    /// Debug-level logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Build the per-player report from a play-by-play CSV
    Stats {
        /// Play-by-play CSV
        #[arg(long)]
        events: PathBuf,

        /// Roster CSV (id, fullName)
        #[arg(long)]
        roster: Option<PathBuf>,

        /// Precomputed xG CSV (game_id, event_num, xG)
        #[arg(long)]
        xg: Option<PathBuf>,

        /// YAML or JSON aggregation config
        #[arg(long)]
        config: Option<PathBuf>,

        /// Season label, e.g. 20232024
        #[arg(long)]
        season: Option<String>,

        /// Strength states ("5v5,5v4") or "all"
        #[arg(long)]
        strength: Option<String>,

        /// Season type codes or names ("2,3")
        #[arg(long, value_delimiter = ',')]
        season_types: Option<Vec<String>>,

        /// Build shift timelines in parallel
        #[arg(long, default_value = "false")]
        parallel: bool,

        /// Output report CSV
        #[arg(long)]
        out: PathBuf,

        /// Output metadata JSON file
        #[arg(long)]
        metadata: Option<PathBuf>,
    },

    /// Dump reconstructed shifts for every game in a play-by-play CSV
    Timeline {
        #[arg(long)]
        events: PathBuf,

        #[arg(long)]
        out: PathBuf,
    },

    /// Split a combined feed into plays and line changes
    Split {
        #[arg(long)]
        events: PathBuf,

        /// Output CSV for plays (period markers, stoppages, challenges removed)
        #[arg(long)]
        plays: PathBuf,

        /// Output CSV for change events
        #[arg(long)]
        shifts: PathBuf,
    },

    /// Check a report against its metadata checksum
    Verify {
        #[arg(long)]
        report: PathBuf,

        #[arg(long)]
        metadata: PathBuf,
    },
}

#[cfg(feature = "cli")]
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_target(false)
        .init();
}

#[cfg(feature = "cli")]
fn resolve_config(
    path: Option<PathBuf>,
    season: Option<String>,
    strength: Option<String>,
    season_types: Option<Vec<String>>,
    parallel: bool,
) -> Result<AggregationConfig> {
    let mut config = match path {
        Some(path) => AggregationConfig::from_path(&path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => AggregationConfig::default(),
    };
    if let Some(season) = season {
        config.season = season;
    }
    if let Some(strength) = strength {
        config.game_strength = GameStrength::parse(&strength)?;
    }
    if let Some(types) = season_types {
        config.season_types = types
            .iter()
            .map(|t| t.parse::<SeasonType>())
            .collect::<hockey_core::Result<Vec<_>>>()?;
    }
    config.parallel |= parallel;
    config.validate()?;
    Ok(config)
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Stats {
            events,
            roster,
            xg,
            config,
            season,
            strength,
            season_types,
            parallel,
            out,
            metadata,
        } => {
            let mut config = resolve_config(config, season, strength, season_types, parallel)?;
            let (table, _) = stats_builder::read_events(&events)?;
            if config.season.is_empty() {
                config.season = table
                    .events()
                    .first()
                    .map(|e| e.season.clone())
                    .unwrap_or_default();
            }
            let roster = match roster {
                Some(path) => stats_builder::read_roster(&path)?,
                None => Roster::new(),
            };
            let model = xg.map(|path| stats_builder::read_xg(&path)).transpose()?;

            let report = hockey_core::aggregate(
                &table,
                &config,
                model.as_ref().map(|m| m as &dyn XgModel),
                &roster,
            )
            .with_context(|| format!("Aggregation failed for {}", events.display()))?;

            let meta = stats_builder::write_report(&report, &config, &out)?;
            info!(
                out = %out.display(),
                rows = meta.row_count,
                checksum = %meta.checksum,
                "report written"
            );
            if let Some(path) = metadata {
                stats_builder::save_metadata(&path, &meta)?;
                info!(path = %path.display(), "metadata saved");
            }
        }

        Commands::Timeline { events, out } => {
            let (table, _) = stats_builder::read_events(&events)?;
            let timelines = hockey_core::ShiftTimeline::build_all(&table, true);
            let shifts: Vec<_> = timelines.iter().flat_map(|t| t.shifts()).collect();
            stats_builder::write_shifts(&shifts, &out)?;
            info!(games = timelines.len(), shifts = shifts.len(), out = %out.display(), "shifts written");
        }

        Commands::Split {
            events,
            plays,
            shifts,
        } => {
            let (table, _) = stats_builder::read_events(&events)?;
            let (play_rows, change_rows) =
                hockey_core::split_shifts(&table, &hockey_core::DEFAULT_REMOVED);
            stats_builder::write_events(&play_rows, &plays)?;
            stats_builder::write_events(&change_rows, &shifts)?;
            info!(plays = play_rows.len(), changes = change_rows.len(), "feed split");
        }

        Commands::Verify { report, metadata } => {
            let meta = stats_builder::load_metadata(&metadata)?;
            if stats_builder::verify_report(&report, &meta.checksum)? {
                info!(report = %report.display(), rows = meta.row_count, "report verification passed");
            } else {
                anyhow::bail!(
                    "report verification failed: {} does not match checksum {}",
                    report.display(),
                    meta.checksum
                );
            }
        }
    }

    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("stats_builder CLI is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
