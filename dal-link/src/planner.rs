//! Planner-side client for the command protocol.
//!
//! Sends one waypoint at a time and blocks until the robot acknowledges it.
//! One planner per robot, so the blocking wait is the whole control flow.

use crate::error::{Error, Result};
use crate::wire::{TextMessage, parse_reached};
use dal_grid::WorldPoint;
use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Demonstration route through the reference arena
pub const DEFAULT_ROUTE: [(f32, f32); 4] = [(-1.0, 2.0), (-1.0, 8.0), (1.0, 5.0), (2.0, 3.0)];

/// Blocking TCP client driving one robot.
pub struct PlannerClient {
    writer: TcpStream,
    reader: BufReader<TcpStream>,
    peer: SocketAddr,
    line: String,
}

impl PlannerClient {
    /// Connect with timeout to the first address that accepts.
    pub fn connect<A: ToSocketAddrs>(addr: A, timeout: Duration) -> Result<Self> {
        let mut last_err = None;
        for candidate in addr.to_socket_addrs()? {
            match TcpStream::connect_timeout(&candidate, timeout) {
                Ok(stream) => return Self::from_stream(stream),
                Err(e) => last_err = Some(e),
            }
        }
        Err(match last_err {
            Some(e) => Error::Io(e),
            None => Error::InvalidParameter("address resolved to nothing".to_string()),
        })
    }

    fn from_stream(stream: TcpStream) -> Result<Self> {
        let peer = stream.peer_addr()?;
        stream.set_nodelay(true)?;
        let reader = BufReader::new(stream.try_clone()?);
        log::info!("Connected to robot at {}", peer);
        Ok(Self {
            writer: stream,
            reader,
            peer,
            line: String::with_capacity(64),
        })
    }

    /// Robot address
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Bound the wait for acknowledgments (`None` waits forever)
    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.writer.set_read_timeout(timeout)?;
        Ok(())
    }

    /// Send one `WAYPOINT x y` line
    pub fn send_waypoint(&mut self, target: WorldPoint) -> Result<()> {
        let line = TextMessage::Waypoint(target).encode();
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }

    /// Block for the next line from the robot.
    ///
    /// `Ok(Some(point))` for an acknowledgment, `Ok(None)` for any other
    /// line, `ConnectionClosed` when the robot hung up.
    pub fn wait_for_arrival(&mut self) -> Result<Option<WorldPoint>> {
        self.line.clear();
        let n = self.reader.read_line(&mut self.line)?;
        if n == 0 {
            return Err(Error::ConnectionClosed);
        }
        match parse_reached(&self.line) {
            Some((x, y)) => Ok(Some(WorldPoint::new(x, y))),
            None => {
                log::warn!("Unexpected response: {:?}", self.line.trim_end());
                Ok(None)
            }
        }
    }

    /// Visit `waypoints` in order, once or until `running` clears.
    ///
    /// Returns the number of acknowledged waypoints.
    pub fn follow_route(
        &mut self,
        waypoints: &[WorldPoint],
        repeat: bool,
        running: &AtomicBool,
    ) -> Result<usize> {
        let mut reached = 0;
        if waypoints.is_empty() {
            return Ok(reached);
        }

        loop {
            for (i, target) in waypoints.iter().enumerate() {
                if !running.load(Ordering::Relaxed) {
                    return Ok(reached);
                }

                log::info!(
                    "[{}/{}] Sending waypoint ({:.2}, {:.2})",
                    i + 1,
                    waypoints.len(),
                    target.x,
                    target.y
                );
                self.send_waypoint(*target)?;

                match self.wait_for_arrival()? {
                    Some(point) => {
                        log::info!("Robot reached ({:.2}, {:.2})", point.x, point.y);
                        reached += 1;
                    }
                    None => log::warn!("No acknowledgment for ({:.2}, {:.2})", target.x, target.y),
                }
            }

            if !repeat {
                break;
            }
        }

        log::info!("Route complete: {}/{} waypoints", reached, waypoints.len());
        Ok(reached)
    }
}

/// Default route as points
pub fn default_route() -> Vec<WorldPoint> {
    DEFAULT_ROUTE
        .iter()
        .map(|&(x, y)| WorldPoint::new(x, y))
        .collect()
}
