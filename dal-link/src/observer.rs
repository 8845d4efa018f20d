//! Telemetry observers
//!
//! Receiving side of the UDP telemetry. [`MapObserver`] owns the shared
//! occupancy grid and folds every robot's scans into it one datagram at a
//! time, which serializes writers from any number of robots.
//! [`ImageObserver`] keeps the latest camera frame per robot.

use crate::config::MappingConfig;
use crate::error::Result;
use crate::wire::{ImageDatagram, ImageFrame, PoseDatagram};
use dal_grid::{FoldStats, GridSnapshot, OccupancyGrid, Pose2D};
use std::collections::BTreeMap;
use std::io::{ErrorKind, Write};
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

/// Largest UDP payload
const MAX_DATAGRAM_SIZE: usize = 65536;

/// Last known state of one robot.
#[derive(Clone, Debug, PartialEq)]
pub struct RobotTrack {
    /// Robot id from the datagrams
    pub robot_id: u8,
    /// Most recent reported pose
    pub last_pose: Pose2D,
    /// Pose datagrams received
    pub datagrams: u64,
    /// Datagrams whose ranges were folded
    pub scans_folded: u64,
}

/// Totals from one [`MapObserver::poll`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PollSummary {
    /// Datagrams received
    pub datagrams: usize,
    /// Datagrams that failed to decode
    pub malformed: usize,
    /// Scans folded into the grid
    pub scans_folded: usize,
    /// Beams folded
    pub beams: usize,
}

/// Receives pose+range datagrams and maps them.
pub struct MapObserver {
    socket: UdpSocket,
    grid: OccupancyGrid,
    mapping: MappingConfig,
    tracks: BTreeMap<u8, RobotTrack>,
    buffer: Vec<u8>,
}

impl MapObserver {
    /// Bind the pose port and create an empty grid.
    pub fn bind<A: ToSocketAddrs>(addr: A, mapping: &MappingConfig) -> Result<Self> {
        let grid = OccupancyGrid::new(mapping.grid_config()?)?;
        let socket = UdpSocket::bind(addr)?;
        socket.set_nonblocking(true)?;
        log::info!(
            "Map observer on {} ({}x{} cells at {:.2}m)",
            socket.local_addr()?,
            grid.width(),
            grid.height(),
            grid.resolution()
        );
        Ok(Self {
            socket,
            grid,
            mapping: mapping.clone(),
            tracks: BTreeMap::new(),
            buffer: vec![0u8; MAX_DATAGRAM_SIZE],
        })
    }

    /// Bound receive address
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Drain every pending datagram without blocking.
    pub fn poll(&mut self) -> PollSummary {
        let mut summary = PollSummary::default();
        loop {
            let len = match self.socket.recv(&mut self.buffer) {
                Ok(len) => len,
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::debug!("Pose receive failed: {}", e);
                    break;
                }
            };

            summary.datagrams += 1;
            let dgram = match PoseDatagram::decode(&self.buffer[..len]) {
                Ok(dgram) => dgram,
                Err(e) => {
                    log::debug!("Skipping malformed pose datagram: {}", e);
                    summary.malformed += 1;
                    continue;
                }
            };

            let stats = self.ingest(dgram);
            if stats.beams > 0 {
                summary.scans_folded += 1;
                summary.beams += stats.beams;
            }
        }
        summary
    }

    /// Record a decoded datagram and fold its scan.
    pub fn ingest(&mut self, dgram: PoseDatagram) -> FoldStats {
        let pose = dgram.pose();
        let track = self
            .tracks
            .entry(dgram.robot_id)
            .or_insert_with(|| {
                log::info!("First telemetry from robot {}", dgram.robot_id);
                RobotTrack {
                    robot_id: dgram.robot_id,
                    last_pose: pose,
                    datagrams: 0,
                    scans_folded: 0,
                }
            });
        track.last_pose = pose;
        track.datagrams += 1;

        if dgram.ranges.is_empty() {
            return FoldStats::default();
        }
        track.scans_folded += 1;

        let scan = self.mapping.scan_from(dgram.ranges);
        self.grid.fold(&pose, &scan)
    }

    /// Shared grid
    pub fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    /// Owned copy of the grid probabilities
    pub fn snapshot(&self) -> GridSnapshot {
        self.grid.snapshot()
    }

    /// Track of one robot
    pub fn track(&self, robot_id: u8) -> Option<&RobotTrack> {
        self.tracks.get(&robot_id)
    }

    /// Tracks ordered by robot id
    pub fn tracks(&self) -> impl Iterator<Item = &RobotTrack> {
        self.tracks.values()
    }
}

/// Keeps the most recent frame from each robot.
pub struct ImageObserver {
    socket: UdpSocket,
    latest: BTreeMap<u8, ImageFrame>,
    counts: BTreeMap<u8, u64>,
    buffer: Vec<u8>,
}

impl ImageObserver {
    /// Bind the image port
    pub fn bind<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_nonblocking(true)?;
        log::info!("Image observer on {}", socket.local_addr()?);
        Ok(Self {
            socket,
            latest: BTreeMap::new(),
            counts: BTreeMap::new(),
            buffer: vec![0u8; MAX_DATAGRAM_SIZE],
        })
    }

    /// Bound receive address
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Drain pending frames; returns how many decoded.
    pub fn poll(&mut self) -> usize {
        let mut frames = 0;
        loop {
            let len = match self.socket.recv(&mut self.buffer) {
                Ok(len) => len,
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::debug!("Image receive failed: {}", e);
                    break;
                }
            };

            match ImageDatagram::decode(&self.buffer[..len]) {
                Ok(dgram) => {
                    *self.counts.entry(dgram.robot_id).or_default() += 1;
                    self.latest.insert(dgram.robot_id, dgram.frame);
                    frames += 1;
                }
                Err(e) => log::debug!("Skipping malformed image datagram: {}", e),
            }
        }
        frames
    }

    /// Most recent frame from a robot
    pub fn latest(&self, robot_id: u8) -> Option<&ImageFrame> {
        self.latest.get(&robot_id)
    }

    /// Frames received from a robot
    pub fn frame_count(&self, robot_id: u8) -> u64 {
        self.counts.get(&robot_id).copied().unwrap_or(0)
    }
}

/// Write a snapshot as a binary PGM image: occupied dark, free light,
/// top row = highest y.
pub fn write_pgm<W: Write>(snapshot: &GridSnapshot, mut out: W) -> Result<()> {
    write!(out, "P5\n{} {}\n255\n", snapshot.width, snapshot.height)?;
    let mut row_bytes = Vec::with_capacity(snapshot.width);
    for row in (0..snapshot.height).rev() {
        row_bytes.clear();
        let start = row * snapshot.width;
        for &p in &snapshot.probability[start..start + snapshot.width] {
            row_bytes.push(((1.0 - p) * 255.0).round().clamp(0.0, 255.0) as u8);
        }
        out.write_all(&row_bytes)?;
    }
    Ok(())
}
