//! `bwatch` - CLI for balloonwatch
//!
//! This binary is the serving layer: it wires configuration, the HTTP
//! snapshot source, the narrator backend, and the narrative cache around the
//! analytic core, and renders results for humans or as JSON.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::Context;
use chrono::Utc;
use clap::Parser;

use balloonwatch::cache::{CacheStore, JsonFileStore, NarrativeCache, NarrativeKind};
use balloonwatch::cli::{
    Cli, Command, ConfigCommand, NarrateArgs, NarrateCommand, OutputFormat, SnapshotCommand,
    WindowCommand,
};
use balloonwatch::clock::{Clock, SystemClock};
use balloonwatch::narrator::{self, prompts, Narrator, NO_ANOMALY_DATA};
use balloonwatch::position::HOURS_AVAILABLE;
use balloonwatch::report::{AnalysisResponse, SnapshotResponse, TrajectoryResponse};
use balloonwatch::source::{HttpSource, SnapshotSource};
use balloonwatch::{init_logging, Analysis, Config, Position, SnapshotFetcher};

type Fetcher = SnapshotFetcher<HttpSource>;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    let fetcher = SnapshotFetcher::new(HttpSource::new(
        config.source.base_url.clone(),
        config.source_timeout(),
    ));

    match cli.command {
        Command::Snapshot(cmd) => handle_snapshot(&fetcher, &cmd),
        Command::History(cmd) => handle_history(&config, &fetcher, &cmd),
        Command::Trajectories(cmd) => handle_trajectories(&config, &fetcher, &cmd),
        Command::Summary(cmd) => handle_summary(&config, &fetcher, &cmd),
        Command::Anomalies(cmd) => handle_anomalies(&config, &fetcher, &cmd),
        Command::Narrate(args) => handle_narrate(&config, &fetcher, args),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

/// Requested window, clamped to what the feed retains.
fn window(config: &Config, hours: Option<u32>) -> u32 {
    hours
        .unwrap_or_else(|| config.default_hours())
        .min(HOURS_AVAILABLE)
}

fn handle_snapshot(fetcher: &Fetcher, cmd: &SnapshotCommand) -> anyhow::Result<()> {
    let balloons = fetcher.fetch_snapshot(cmd.hours_ago)?;

    if cmd.format == OutputFormat::Json {
        let response = SnapshotResponse {
            timestamp: Utc::now(),
            balloons,
        };
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_positions(&balloons, cmd.format);
    }
    Ok(())
}

fn handle_history(config: &Config, fetcher: &Fetcher, cmd: &WindowCommand) -> anyhow::Result<()> {
    let positions = fetcher.fetch_historical_data(window(config, cmd.hours));

    if cmd.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&positions)?);
    } else {
        print_positions(&positions, cmd.format);
    }
    Ok(())
}

fn handle_trajectories(
    config: &Config,
    fetcher: &Fetcher,
    cmd: &WindowCommand,
) -> anyhow::Result<()> {
    let analysis = Analysis::fetch(fetcher, window(config, cmd.hours));

    match cmd.format {
        OutputFormat::Json => {
            let response = TrajectoryResponse::new(Utc::now(), &analysis.trajectories);
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Plain | OutputFormat::Table => {
            if analysis.trajectories.is_empty() {
                println!("No trajectories available.");
            }
            for trajectory in analysis.trajectories.values() {
                let newest = trajectory.newest();
                let oldest = trajectory.oldest();
                println!(
                    "balloon {:>4}  {:>2} points  {:>3}h ago ({:>7.2}, {:>8.2}) -> now-{}h ({:>7.2}, {:>8.2})",
                    trajectory.balloon_id(),
                    trajectory.len(),
                    oldest.hours_ago,
                    oldest.latitude,
                    oldest.longitude,
                    newest.hours_ago,
                    newest.latitude,
                    newest.longitude,
                );
            }
        }
    }
    Ok(())
}

fn handle_summary(config: &Config, fetcher: &Fetcher, cmd: &WindowCommand) -> anyhow::Result<()> {
    let analysis = Analysis::fetch(fetcher, window(config, cmd.hours));

    if cmd.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&analysis.summary)?);
    } else {
        println!("{}", analysis.summary);
    }
    Ok(())
}

fn handle_anomalies(
    config: &Config,
    fetcher: &Fetcher,
    cmd: &WindowCommand,
) -> anyhow::Result<()> {
    let analysis = Analysis::fetch(fetcher, window(config, cmd.hours));

    match cmd.format {
        OutputFormat::Json => {
            let response = AnalysisResponse::new(Utc::now(), &analysis);
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Plain | OutputFormat::Table => {
            println!("{}", analysis.anomalies);
            if !analysis.anomalies.records.is_empty() {
                println!();
            }
            for record in &analysis.anomalies.records {
                println!("{}", serde_json::to_string(record)?);
            }
        }
    }
    Ok(())
}

fn handle_narrate(config: &Config, fetcher: &Fetcher, args: NarrateArgs) -> anyhow::Result<()> {
    let narrator = narrator::from_config(config)?;
    let hours = window(config, args.hours);

    let mut cache = (config.cache.enabled && !args.command.no_cache()).then(|| {
        NarrativeCache::new(
            JsonFileStore::open(config.cache_path()),
            SystemClock,
            config.cache_ttl(),
        )
    });

    let text = produce_narrative(
        narrator.as_ref(),
        fetcher,
        hours,
        &args.command,
        cache.as_mut(),
    )?;
    println!("{text}");
    Ok(())
}

/// Serve the narrative for `command` over the last `hours` snapshots.
///
/// The feed is only fetched when the cache cannot answer.
fn produce_narrative<S, C, St, K>(
    narrator: &dyn Narrator,
    fetcher: &SnapshotFetcher<S, C>,
    hours: u32,
    command: &NarrateCommand,
    cache: Option<&mut NarrativeCache<St, K>>,
) -> balloonwatch::Result<String>
where
    S: SnapshotSource,
    C: Clock,
    St: CacheStore,
    K: Clock,
{
    let generate = || narrate(narrator, &Analysis::fetch(fetcher, hours), command);

    match (cache_kind(command), cache) {
        (Some(kind), Some(cache)) => {
            let narrative = cache.get_or_generate(kind, hours, generate)?;
            if narrative.cached {
                tracing::info!(%kind, hours, generated_at = %narrative.generated_at, "Serving cached narrative");
            }
            Ok(narrative.text)
        }
        _ => generate(),
    }
}

fn narrate(
    narrator: &dyn Narrator,
    analysis: &Analysis,
    command: &NarrateCommand,
) -> balloonwatch::Result<String> {
    let data_summary = analysis.data_summary();
    match command {
        NarrateCommand::Ask { question } => narrator.answer_question(&data_summary, question),
        NarrateCommand::Insights { .. } => {
            narrator.answer_question(&data_summary, prompts::GENERAL_INSIGHTS_QUESTION)
        }
        NarrateCommand::Anomalies { .. } => {
            if analysis.is_empty() {
                Ok(NO_ANOMALY_DATA.to_string())
            } else {
                narrator.narrate_anomalies(&analysis.anomaly_summary())
            }
        }
        NarrateCommand::Launch { .. } => narrator.recommend_launch_sites(&data_summary),
    }
}

fn cache_kind(command: &NarrateCommand) -> Option<NarrativeKind> {
    match command {
        NarrateCommand::Ask { .. } => None,
        NarrateCommand::Insights { .. } => Some(NarrativeKind::GeneralInsights),
        NarrateCommand::Anomalies { .. } => Some(NarrativeKind::Anomalies),
        NarrateCommand::Launch { .. } => Some(NarrativeKind::LaunchRecommendations),
    }
}

fn print_positions(positions: &[Position], format: OutputFormat) {
    if positions.is_empty() {
        println!("No balloon data available.");
        return;
    }
    if format == OutputFormat::Table {
        println!(
            "{:>6}  {:>9}  {:>10}  {:>9}  {:>3}  timestamp",
            "id", "latitude", "longitude", "alt (km)", "h"
        );
    }
    for p in positions {
        println!(
            "{:>6}  {:>9.4}  {:>10.4}  {:>9.3}  {:>3}  {}",
            p.balloon_id,
            p.latitude,
            p.longitude,
            p.altitude,
            p.hours_ago,
            p.timestamp.to_rfc3339()
        );
    }
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                let mut shown = config.clone();
                if shown.narrator.api_key.is_some() {
                    shown.narrator.api_key = Some("<redacted>".to_string());
                }
                println!("{}", serde_json::to_string_pretty(&shown)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Source]");
                println!("  Base URL:           {}", config.source.base_url);
                println!("  Timeout (s):        {}", config.source.timeout_secs);
                println!("  Default hours:      {}", config.default_hours());
                println!();
                println!("[Narrator]");
                println!("  Backend:            {:?}", config.narrator.backend);
                println!("  API base:           {}", config.narrator.api_base);
                println!("  Model:              {}", config.narrator.model);
                println!(
                    "  API key:            {}",
                    if config.narrator.api_key.is_some() {
                        "set"
                    } else {
                        "not set"
                    }
                );
                println!();
                println!("[Cache]");
                println!("  Enabled:            {}", config.cache.enabled);
                println!("  TTL (s):            {}", config.cache.ttl_secs);
                println!("  Path:               {}", config.cache_path().display());
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
