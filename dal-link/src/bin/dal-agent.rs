//! Robot agent
//!
//! Runs one telemetry session against the simulated robot on a fixed tick:
//! streams pose+range and image datagrams, accepts waypoints from a planner
//! on TCP port base + id and acknowledges arrivals.
//!
//! # Usage
//!
//! ```bash
//! dal-agent --robot-id 0
//! dal-agent --config configs/dal.toml --robot-id 1 --drivetrain differential
//! ```

use clap::Parser;
use dal_link::config::AppConfig;
use dal_link::{
    Differential, Drivetrain, Holonomic, SimulatedRobot, SteeringPolicy, TelemetrySession,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// DAL robot agent
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Robot id, overrides the config file
    #[arg(short, long)]
    robot_id: Option<u8>,

    /// Drivetrain (holonomic | differential), overrides the config file
    #[arg(short, long)]
    drivetrain: Option<Drivetrain>,

    /// Stop after this many ticks
    #[arg(long)]
    ticks: Option<u64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };
    if let Some(id) = args.robot_id {
        config.robot.id = id;
        // Without a file, pick the reference vehicle for this id
        if args.config.is_none() {
            config.robot.drivetrain = Drivetrain::for_robot_id(id);
        }
    }
    if let Some(drivetrain) = args.drivetrain {
        config.robot.drivetrain = drivetrain;
    }

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    log::info!(
        "DAL agent v{} starting (robot {}, {} drive)",
        env!("CARGO_PKG_VERSION"),
        config.robot.id,
        config.robot.drivetrain
    );

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })?;

    let robot = SimulatedRobot::from_config(&config);
    match config.robot.drivetrain {
        Drivetrain::Holonomic => {
            let policy = Holonomic::from_config(&config.navigation);
            run(&config, robot, policy, &running, args.ticks)
        }
        Drivetrain::Differential => {
            let policy = Differential::from_config(&config.navigation);
            run(&config, robot, policy, &running, args.ticks)
        }
    }
}

fn run<P: SteeringPolicy>(
    config: &AppConfig,
    robot: SimulatedRobot,
    policy: P,
    running: &AtomicBool,
    max_ticks: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = TelemetrySession::from_config(config, robot, policy)?;
    log::info!("Waiting for planner on {}", session.command_addr()?);

    let period = Duration::from_millis(config.telemetry.tick_ms);
    let mut ticks = 0u64;

    while running.load(Ordering::Relaxed) {
        let started = Instant::now();
        session.tick();
        ticks += 1;

        if max_ticks.is_some_and(|limit| ticks >= limit) {
            break;
        }

        if let Some(remaining) = period.checked_sub(started.elapsed()) {
            thread::sleep(remaining);
        }
    }

    session.shutdown();
    log::info!(
        "Agent stopped after {} ticks ({} collisions)",
        ticks,
        session.robot().collisions()
    );
    Ok(())
}
