//! Waypoint planner
//!
//! Connects to a robot agent's command port and walks it through a route,
//! one waypoint at a time, waiting for each `REACHED` acknowledgment.
//!
//! # Usage
//!
//! ```bash
//! dal-planner --robot-id 0
//! dal-planner --robot-id 1 --waypoint 1,1 --waypoint -1,2 --repeat
//! ```

use clap::Parser;
use dal_grid::WorldPoint;
use dal_link::PlannerClient;
use dal_link::config::AppConfig;
use dal_link::planner::default_route;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// DAL waypoint planner
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Robot to drive; its command port is base + id
    #[arg(short, long, default_value_t = 0)]
    robot_id: u8,

    /// Host running the agent
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Route point as `x,y` (repeatable); the built-in route is used when absent
    #[arg(short, long = "waypoint", value_parser = parse_point)]
    waypoints: Vec<WorldPoint>,

    /// Start over after the last waypoint
    #[arg(long)]
    repeat: bool,

    /// Connection timeout in seconds
    #[arg(long, default_value_t = 5)]
    timeout: u64,
}

fn parse_point(s: &str) -> Result<WorldPoint, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y, got '{}'", s))?;
    let x: f32 = x.trim().parse().map_err(|e| format!("bad x '{}': {}", x, e))?;
    let y: f32 = y.trim().parse().map_err(|e| format!("bad y '{}': {}", y, e))?;
    if !(x.is_finite() && y.is_finite()) {
        return Err(format!("non-finite point '{}'", s));
    }
    Ok(WorldPoint::new(x, y))
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
        // Second Ctrl-C while blocked on an acknowledgment exits at once
        if !r.swap(false, Ordering::Relaxed) {
            std::process::exit(130);
        }
        log::info!("Stopping after the current waypoint");
    })?;

    let route = if args.waypoints.is_empty() {
        default_route()
    } else {
        args.waypoints.clone()
    };

    let port = config.network.command_port(args.robot_id);
    let addr = format!("{}:{}", args.host, port);
    log::info!(
        "Planning {} waypoints for robot {} at {}{}",
        route.len(),
        args.robot_id,
        addr,
        if args.repeat { " (repeating)" } else { "" }
    );

    let mut client = PlannerClient::connect(addr.as_str(), Duration::from_secs(args.timeout))?;
    match client.follow_route(&route, args.repeat, &running) {
        Ok(reached) => log::info!("Planner done, {} waypoints acknowledged", reached),
        Err(e) if e.is_disconnect() => log::warn!("Robot closed the connection"),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_point() {
        assert_eq!(parse_point("1.5,-2").unwrap(), WorldPoint::new(1.5, -2.0));
        assert_eq!(parse_point(" 0 , 3 ").unwrap(), WorldPoint::new(0.0, 3.0));
        assert!(parse_point("1.5").is_err());
        assert!(parse_point("a,b").is_err());
        assert!(parse_point("inf,0").is_err());
    }
}
