use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use video_wall_core::{AppConfig, Catalog, HapticEvent, PatternTable, Scenario, Simulation};

fn main() -> video_wall_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            config,
            scenario,
            catalog,
            seed,
            json,
        } => run_simulate(config, scenario, catalog, seed, json),
        Commands::Catalog { file, seed, json } => run_catalog(file, seed, json),
        Commands::Patterns { intensity, json } => run_patterns(intensity, json),
    }
}

fn run_simulate(
    config: Option<PathBuf>,
    scenario: Option<PathBuf>,
    catalog: Option<PathBuf>,
    seed: Option<u64>,
    json: bool,
) -> video_wall_core::Result<()> {
    let config = match config {
        Some(path) => AppConfig::from_path(path)?,
        None => AppConfig::default(),
    };
    let scenario = match scenario {
        Some(path) => Scenario::from_path(path)?,
        None => Scenario::default(),
    };
    let catalog = load_catalog(catalog.as_ref())?.shuffled(seed.or(config.feed.shuffle_seed));
    tracing::info!(clips = catalog.len(), run_for_ms = scenario.run_for_ms, "starting simulation");

    let mut simulation = Simulation::new(config, catalog, scenario)?;
    let report = simulation.run();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for timed in &report.notices {
        println!("{:>7} ms  {:?}", timed.at_ms, timed.notice);
    }
    println!();
    println!("final active card: {}", report.final_active);
    println!("cards visited:     {:?}", report.visited);
    println!("frames sampled:    {}", report.frames_sampled);
    for (event, count) in &report.pulses_by_event {
        println!("  {event:<14} {count}");
    }
    Ok(())
}

fn run_catalog(
    file: Option<PathBuf>,
    seed: Option<u64>,
    json: bool,
) -> video_wall_core::Result<()> {
    let catalog = load_catalog(file.as_ref())?.shuffled(seed);

    if json {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }

    for (index, clip) in catalog.entries().iter().enumerate() {
        println!("{index:>3}  {:<16} {}", clip.src, clip.label);
    }
    Ok(())
}

fn run_patterns(intensity: f32, json: bool) -> video_wall_core::Result<()> {
    let config = AppConfig::default();
    let table = PatternTable::with_bounds(config.haptics.min_pulse_ms, config.haptics.max_pulse_ms);
    let resolved: Vec<_> = HapticEvent::ALL
        .iter()
        .map(|event| (event.name(), table.resolve(event.name(), intensity * event.gain())))
        .collect();

    if json {
        let map: serde_json::Map<_, _> = resolved
            .into_iter()
            .map(|(name, pattern)| (name.to_string(), serde_json::json!(pattern)))
            .collect();
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }

    for (name, pattern) in resolved {
        println!("{name:<14} {pattern:?}");
    }
    Ok(())
}

fn load_catalog(path: Option<&PathBuf>) -> video_wall_core::Result<Catalog> {
    match path {
        Some(path) => Catalog::from_path(path),
        None => Ok(Catalog::builtin()),
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Haptic short-video wall", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Drive the wall through a scripted session with simulated media.
    Simulate {
        /// JSON configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// JSON scenario describing clips, timing and user input.
        #[arg(short, long)]
        scenario: Option<PathBuf>,
        /// JSON clip list to use instead of the built-in one.
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Seed for the feed order.
        #[arg(long)]
        seed: Option<u64>,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the clip list in feed order.
    Catalog {
        /// JSON clip list to use instead of the built-in one.
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Seed for the shuffle.
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        json: bool,
    },
    /// Print every vibration pattern as it would be sent to the motor.
    Patterns {
        /// Intensity multiplier applied before clamping.
        #[arg(short, long, default_value_t = 1.0)]
        intensity: f32,
        #[arg(long)]
        json: bool,
    },
}
