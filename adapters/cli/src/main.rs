#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that generates parks and runs headless simulations.

mod settings;

use std::{path::PathBuf, thread};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use theme_park_core::{Command, Event, GenerationConfig};
use theme_park_system_analytics::{Analytics, StatsSample};
use theme_park_world::{self as world, query, Park};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::settings::{load_map, Settings};

/// Theme park simulation driver.
#[derive(Debug, Parser)]
#[command(name = "theme-park", version)]
struct Cli {
    /// TOML file with optional [generation] and [simulation] tables.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Seed for every random choice; overrides the configured seed.
    #[arg(long, global = true)]
    seed: Option<u64>,
    /// Most verbose log level printed to stderr.
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Generates a park and prints its ASCII map.
    Generate,
    /// Runs the visitor simulation and prints periodic statistics.
    Run {
        /// Number of ticks to simulate.
        #[arg(long, default_value_t = 1_000)]
        ticks: u64,
        /// ASCII park map to load instead of generating one.
        #[arg(long)]
        map: Option<PathBuf>,
        /// Pace ticks at the configured ticks per second.
        #[arg(long)]
        realtime: bool,
        /// Ticks between two statistics lines; zero prints only the summary.
        #[arg(long, default_value_t = 100)]
        report_every: u64,
        /// Print the park map before simulating.
        #[arg(long)]
        show_map: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

/// Entry point for the theme park command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::from(cli.log_level))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install tracing subscriber")?;

    let mut settings = Settings::load(cli.config.as_deref())?;
    if cli.seed.is_some() {
        settings.generation.seed = cli.seed;
    }
    let seed = settings.generation.seed.unwrap_or_else(rand::random);
    info!(seed, "random source seeded");
    let mut park = Park::new(seed);

    match cli.mode {
        Mode::Generate => {
            generate(&mut park, settings.generation)?;
            print!("{}", query::grid(&park).to_ascii());
        }
        Mode::Run {
            ticks,
            map,
            realtime,
            report_every,
            show_map,
        } => {
            match map {
                Some(path) => {
                    let grid = load_map(&path)?;
                    let _ = submit(&mut park, Command::LoadPark { grid });
                }
                None => generate(&mut park, settings.generation)?,
            }
            if show_map {
                print!("{}", query::grid(&park).to_ascii());
            }
            let events = submit(
                &mut park,
                Command::ConfigureSimulation {
                    config: settings.simulation,
                },
            );
            ensure_accepted(&events)?;

            run(&mut park, ticks, realtime, report_every);
        }
    }

    Ok(())
}

fn generate(park: &mut Park, config: GenerationConfig) -> Result<()> {
    let events = submit(park, Command::GeneratePark { config });
    ensure_accepted(&events)?;
    for event in &events {
        if let Event::ParkGenerated { requested, placed } = event {
            if placed < requested {
                eprintln!("placed {placed} of {requested} requested attractions");
            }
        }
    }
    Ok(())
}

fn run(park: &mut Park, ticks: u64, realtime: bool, report_every: u64) {
    let interval = query::tick_interval(park);
    let mut analytics = Analytics::new();

    for _ in 0..ticks {
        let events = submit(park, Command::Tick);
        let sample = analytics
            .handle(
                &events,
                query::visitors(park),
                query::simulation_config(park),
            )
            .copied();
        if let Some(sample) = sample {
            if report_every > 0 && sample.tick % report_every == 0 {
                println!("{}", format_sample(&sample));
            }
        }
        if realtime {
            thread::sleep(interval);
        }
    }

    if let Some(sample) = analytics.latest() {
        println!("final {}", format_sample(sample));
    }
    for attraction in query::attractions(park) {
        println!(
            "attraction {:>3} at ({:>3}, {:>3}) {:<13} riders {}/{} queue {:>3} popularity {:.1}",
            attraction.id.get(),
            attraction.cell.column(),
            attraction.cell.row(),
            attraction
                .tags
                .first()
                .map(|genre| format!("{genre:?}"))
                .unwrap_or_default(),
            attraction.riders,
            attraction.capacity,
            attraction.queuers,
            attraction.popularity,
        );
    }
}

fn submit(park: &mut Park, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(park, command, &mut events);
    events
}

fn ensure_accepted(events: &[Event]) -> Result<()> {
    for event in events {
        if let Event::ConfigurationRejected { reason } = event {
            bail!("configuration rejected: {reason}");
        }
    }
    Ok(())
}

fn format_sample(sample: &StatsSample) -> String {
    let stats = &sample.stats;
    format!(
        "tick {:>6}: present {:>4} (riding {:>3}, queued {:>3}, moving {:>3}) entered {:>5} exited {:>5} satisfaction {:>5.1} [{:.0}..{:.0}]",
        sample.tick,
        stats.counts.present(),
        stats.counts.riding,
        stats.counts.in_queue,
        stats.counts.moving,
        stats.entered,
        stats.exited,
        stats.average_satisfaction,
        sample.departure_threshold_min,
        sample.departure_threshold_max,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_flags_parse() {
        let cli = Cli::try_parse_from([
            "theme-park",
            "--seed",
            "42",
            "run",
            "--ticks",
            "20",
            "--report-every",
            "5",
            "--log-level",
            "debug",
        ])
        .expect("valid arguments");

        assert_eq!(cli.seed, Some(42));
        assert_eq!(cli.log_level, LogLevel::Debug);
        match cli.mode {
            Mode::Run {
                ticks,
                report_every,
                realtime,
                map,
                show_map,
            } => {
                assert_eq!(ticks, 20);
                assert_eq!(report_every, 5);
                assert!(!realtime);
                assert!(!show_map);
                assert!(map.is_none());
            }
            Mode::Generate => panic!("expected run mode"),
        }
    }

    #[test]
    fn rejected_configuration_is_an_error() {
        let events = [Event::ConfigurationRejected {
            reason: theme_park_core::ConfigError::ZeroRoadWidth,
        }];
        let error = ensure_accepted(&events).expect_err("rejection surfaces");
        assert!(error.to_string().contains("road width"));
        assert!(ensure_accepted(&[Event::SimulationConfigured]).is_ok());
    }

    #[test]
    fn seeded_generation_prints_a_bordered_map() {
        let mut park = Park::new(3);
        let config = GenerationConfig {
            width: 30,
            height: 20,
            internal_node_count: 10,
            attraction_count: 3,
            seed: Some(3),
            ..GenerationConfig::default()
        };
        generate(&mut park, config).expect("valid configuration");

        let map = query::grid(&park).to_ascii();
        let rows: Vec<&str> = map.lines().collect();
        assert_eq!(rows.len(), 20);
        assert!(rows[0].chars().all(|symbol| symbol == 'X'));
        assert!(map.contains('E'));
    }
}
