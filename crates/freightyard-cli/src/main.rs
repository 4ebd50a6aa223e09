//! freightyard CLI -- inspect the standard network and drive scripted job runs.

mod logging;

use clap::{Parser, Subcommand};
use freightyard_core::config::EngineConfig;
use freightyard_core::engine::JobBoard;
use freightyard_core::event::{ChangeNotifier, NotifierHandle};
use freightyard_core::id::{JobId, StationId, Username};
use freightyard_core::network::Network;
use freightyard_core::rng::SimRng;
use freightyard_core::track::{TrackClass, random_track};
use freightyard_core::validation::{check_invariants, supply_gaps};
use freightyard_data::{ScenarioScript, load_config_or_default, load_scenario};
use std::fmt::Display;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

/// How long the observer waits for trailing change events after a scenario.
const EVENT_GRACE: Duration = Duration::from_millis(200);

#[derive(Parser)]
#[command(name = "freightyard")]
#[command(about = "Freight job economy over a fixed station network", long_about = None)]
struct Args {
    /// Configuration file (.ron, .toml or .json). Defaults to
    /// ./freightyard.{ron,toml,json} when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured RNG seed
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every station with its inputs, outputs and job counts
    Stations {
        #[arg(long)]
        json: bool,
    },
    /// List the spawned jobs at one station
    Jobs {
        /// Station code, e.g. SM
        station: StationId,

        /// Hide jobs active for other users
        #[arg(long)]
        user: Option<String>,

        #[arg(long)]
        json: bool,
    },
    /// Reserve, take and finish jobs in order, printing the change events
    Scenario {
        /// User running the jobs (a script may name its own)
        #[arg(long)]
        user: Option<String>,

        /// Scenario file listing the jobs to run
        #[arg(long, conflicts_with = "jobs")]
        script: Option<PathBuf>,

        /// Job ids, e.g. CM-SSL-1
        jobs: Vec<String>,
    },
    /// Check job invariants and the production graph
    Check,
}

fn main() {
    let args = Args::parse();
    logging::init_logging(args.verbose);

    let config = load_engine_config(&args);

    match args.command {
        Command::Stations { json } => cmd_stations(config, json),
        Command::Jobs {
            station,
            user,
            json,
        } => cmd_jobs(config, station, user.as_deref(), json),
        Command::Scenario { user, script, jobs } => cmd_scenario(config, user, script, jobs),
        Command::Check => cmd_check(config),
    }
}

/// Print `context: err` and exit with status 1.
fn fail(context: &str, err: impl Display) -> ! {
    eprintln!("Error: {context}: {err}");
    process::exit(1);
}

fn load_engine_config(args: &Args) -> EngineConfig {
    let cwd = std::env::current_dir().unwrap_or_else(|e| fail("reading working directory", e));
    let mut config = load_config_or_default(args.config.as_deref(), &cwd)
        .unwrap_or_else(|e| fail("loading configuration", e));
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    config
}

fn print_json(value: &impl serde::Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => fail("encoding JSON", e),
    }
}

// ===========================================================================
// stations
// ===========================================================================

fn cmd_stations(config: EngineConfig, json: bool) {
    let summaries = Network::standard(config).station_summaries();
    if json {
        print_json(&summaries);
        return;
    }

    println!(
        "{:<4} {:>6} {:>7} {:>6}  {:<28} {:<28} overflow",
        "id", "queued", "spawned", "active", "inputs", "outputs"
    );
    for s in &summaries {
        let list = |cargo: &[freightyard_core::cargo::CargoType]| {
            cargo.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(",")
        };
        let overflow = s
            .overflow
            .iter()
            .map(|(c, n)| format!("{c}:{n}"))
            .collect::<Vec<_>>()
            .join(",");
        println!(
            "{:<4} {:>6} {:>7} {:>6}  {:<28} {:<28} {}",
            s.station_id,
            s.queued,
            s.spawned,
            s.active,
            list(&s.inputs),
            list(&s.outputs),
            overflow
        );
    }
}

// ===========================================================================
// jobs
// ===========================================================================

fn cmd_jobs(config: EngineConfig, station: StationId, user: Option<&str>, json: bool) {
    let user = user.map(|u| Username::new(u).unwrap_or_else(|e| fail("--user", e)));
    let network = Network::standard(config);
    let views: Vec<_> = network
        .visible_jobs(station, user.as_ref())
        .iter()
        .map(|j| j.view())
        .collect();

    if json {
        print_json(&views);
        return;
    }

    if views.is_empty() {
        println!("No spawned jobs at {station}");
        return;
    }
    for v in &views {
        println!(
            "{:<10} {:<16} {} -> {} {:<10} {:>2} x {:<14} ${}",
            v.id,
            v.job_type.name(),
            v.starting_track,
            v.target_station,
            v.target_track,
            v.car_count,
            v.cargo_type.to_string(),
            v.wage
        );
    }
}

// ===========================================================================
// scenario
// ===========================================================================

fn cmd_scenario(
    config: EngineConfig,
    user: Option<String>,
    script: Option<PathBuf>,
    jobs: Vec<String>,
) {
    let script = match script {
        Some(path) => {
            let mut loaded = load_scenario(&path).unwrap_or_else(|e| fail("loading scenario", e));
            if user.is_some() {
                loaded.user = user;
            }
            loaded
        }
        None if jobs.is_empty() => fail("scenario", "give job ids or --script FILE"),
        None => ScenarioScript::from_jobs(user, jobs),
    };

    let notifier =
        ChangeNotifier::spawn(config.notifier.clone()).unwrap_or_else(|e| fail("notifier", e));
    let handle = notifier.handle();
    let observer = watch_everything(&handle);

    let mut parking = SimRng::new(config.seed);
    let board = JobBoard::new(Network::standard(config), Arc::new(handle));

    let mut failures = 0usize;
    for step in &script.steps {
        let user = match Username::new(script.user_for(step)) {
            Ok(u) => u,
            Err(e) => {
                tracing::warn!(job = %step.job, error = %e, "skipping step");
                failures += 1;
                continue;
            }
        };
        let id = JobId::from(step.job.as_str());
        if let Err(e) = run_step(&board, &user, &id, &mut parking) {
            tracing::warn!(job = %id, user = %user, error = %e, "step failed");
            failures += 1;
        }
    }

    while let Some(event) = observer.next_event(EVENT_GRACE) {
        match event.to_json() {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::warn!(error = %e, "could not encode event"),
        }
    }

    drop(board);
    print_json(&notifier.shutdown());

    if failures > 0 {
        eprintln!("{failures} of {} steps failed", script.steps.len());
        process::exit(1);
    }
}

/// Join as an observer subscribed to every station.
fn watch_everything(handle: &NotifierHandle) -> freightyard_core::event::Subscription {
    let observer = handle
        .join("observer")
        .unwrap_or_else(|e| fail("joining notifier", e));
    for station in StationId::ALL {
        if let Err(e) = handle.subscribe(observer.id(), station) {
            fail("subscribing", e);
        }
    }
    observer
}

fn run_step(
    board: &JobBoard,
    user: &Username,
    id: &JobId,
    parking: &mut SimRng,
) -> Result<(), freightyard_core::engine::TransitionError> {
    let reserved = board.reserve(user, id)?;
    tracing::info!(job = %id, user = %user, wage = reserved.wage(), "reserved");

    let taken = board.take(user, id)?;
    let track = taken
        .changed
        .first()
        .and_then(|j| j.destination_track())
        .map(|t| t.name())
        .unwrap_or_default();
    tracing::info!(
        job = %id,
        track = %track,
        despawned = taken.despawned.len(),
        spawned = taken.spawned.len(),
        "taken"
    );

    let finished = board.finish(user, id)?;
    tracing::info!(
        job = %id,
        created = ?finished.created_ids(),
        despawned = finished.despawned.len(),
        spawned = finished.spawned.len(),
        "finished"
    );

    if let Some(track) = random_track(reserved.destination(), TrackClass::Storage, parking) {
        tracing::info!(job = %id, track = %track.name(), "park the engine");
    }
    Ok(())
}

// ===========================================================================
// check
// ===========================================================================

fn cmd_check(config: EngineConfig) {
    let network = Network::standard(config);
    let violations = check_invariants(&network);
    let gaps = supply_gaps(&network);

    for v in &violations {
        println!("violation: {v}");
    }
    for g in &gaps {
        println!("supply gap: {g}");
    }

    if violations.is_empty() && gaps.is_empty() {
        println!(
            "ok: {} stations, {} jobs",
            network.stations().count(),
            network.job_count()
        );
    } else {
        process::exit(1);
    }
}
