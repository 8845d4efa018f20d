//! Map observer
//!
//! Receives pose+range and image telemetry from every robot, folds the
//! scans into one shared occupancy grid and logs map statistics. The final
//! map can be written as a PGM image on exit.
//!
//! # Usage
//!
//! ```bash
//! dal-mapper
//! dal-mapper --config configs/dal.toml --output map.pgm
//! ```

use clap::Parser;
use dal_link::config::AppConfig;
use dal_link::observer::write_pgm;
use dal_link::{ImageObserver, MapObserver};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// DAL map observer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Interface to receive telemetry on
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// Write the map here as PGM on exit
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Seconds between statistics lines
    #[arg(long, default_value_t = 5)]
    stats_every: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })?;

    let net = &config.network;
    let mut maps = MapObserver::bind(format!("{}:{}", args.bind, net.pose_port), &config.mapping)?;
    let mut images = ImageObserver::bind(format!("{}:{}", args.bind, net.image_port))?;

    let stats_every = Duration::from_secs(args.stats_every.max(1));
    let mut last_stats = Instant::now();
    let mut malformed = 0usize;

    while running.load(Ordering::Relaxed) {
        let summary = maps.poll();
        malformed += summary.malformed;
        images.poll();

        if last_stats.elapsed() >= stats_every {
            last_stats = Instant::now();
            let stats = maps.grid().stats();
            log::info!(
                "Map: free={} occupied={} unknown={} frozen={} (malformed datagrams: {})",
                stats.free,
                stats.occupied,
                stats.unknown,
                stats.frozen,
                malformed
            );
            for track in maps.tracks() {
                log::info!(
                    "  robot {}: ({:.2}, {:.2}) {:.0}deg, {} datagrams, {} scans, {} frames",
                    track.robot_id,
                    track.last_pose.x,
                    track.last_pose.y,
                    track.last_pose.theta.to_degrees(),
                    track.datagrams,
                    track.scans_folded,
                    images.frame_count(track.robot_id)
                );
            }
        }

        thread::sleep(POLL_INTERVAL);
    }

    if let Some(path) = &args.output {
        let file = BufWriter::new(File::create(path)?);
        write_pgm(&maps.snapshot(), file)?;
        log::info!("Map written to {}", path.display());
    }
    Ok(())
}
