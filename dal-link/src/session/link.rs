//! Inbound command connection
//!
//! The robot listens on its command port and serves one planner at a time.
//! Everything is non-blocking and polled once per tick:
//!
//! ```text
//! 1. No connection: try accept()        (WouldBlock → nothing this tick)
//! 2. Connected: read up to 4 chunks     (0 bytes → peer closed)
//! 3. Reassemble lines, keep WAYPOINT commands, discard the rest
//! 4. Acks are written directly; a failed write drops the connection
//! ```
//!
//! A second planner connecting while one is active waits in the listen
//! backlog until the first one goes away.

use crate::error::{Error, Result};
use crate::wire::{LineBuffer, TextMessage};
use dal_grid::WorldPoint;
use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

/// Read chunk size
const READ_CHUNK: usize = 1024;

/// Chunks read per poll; the rest waits in the socket for later ticks
const MAX_READS_PER_POLL: usize = 4;

/// What one poll produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinkEvents {
    /// Waypoints in arrival order
    pub waypoints: Vec<WorldPoint>,
    /// Lines that were not commands
    pub discarded: usize,
    /// The active connection ended during this poll
    pub disconnected: bool,
}

struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
}

/// Non-blocking single-client command server.
pub struct CommandLink {
    listener: TcpListener,
    connection: Option<Connection>,
    buffer: LineBuffer,
    read_chunk: [u8; READ_CHUNK],
}

impl CommandLink {
    /// Bind the listening socket
    pub fn bind<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        log::info!("Command listener on {}", listener.local_addr()?);
        Ok(Self {
            listener,
            connection: None,
            buffer: LineBuffer::new(),
            read_chunk: [0; READ_CHUNK],
        })
    }

    /// Address planners connect to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept and read without blocking.
    ///
    /// At most [`MAX_READS_PER_POLL`] chunks are read, so a fast writer
    /// cannot hold the tick.
    pub fn poll(&mut self) -> LinkEvents {
        let mut events = LinkEvents::default();

        if self.connection.is_none() {
            self.try_accept();
        }

        let Some(conn) = self.connection.as_mut() else {
            return events;
        };

        let mut reads = 0;
        while reads < MAX_READS_PER_POLL {
            match conn.stream.read(&mut self.read_chunk) {
                Ok(0) => {
                    log::info!("Planner {} disconnected", conn.peer);
                    events.disconnected = true;
                    break;
                }
                Ok(n) => {
                    reads += 1;
                    for line in self.buffer.push(&self.read_chunk[..n]) {
                        match TextMessage::parse(&line) {
                            Some(TextMessage::Waypoint(point)) => events.waypoints.push(point),
                            _ => {
                                log::warn!("Discarding command line: {:?}", line);
                                events.discarded += 1;
                            }
                        }
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::warn!("Command read from {} failed: {}", conn.peer, e);
                    events.disconnected = true;
                    break;
                }
            }
        }

        if events.disconnected {
            self.disconnect();
        }
        events
    }

    /// Send `REACHED x y`; on failure the connection is dropped.
    pub fn send_ack(&mut self, target: WorldPoint) -> Result<()> {
        let Some(conn) = self.connection.as_mut() else {
            return Err(Error::ConnectionClosed);
        };

        let line = TextMessage::Reached(target).encode();
        let result = conn.stream.write_all(line.as_bytes()).and_then(|_| conn.stream.flush());
        match result {
            Ok(()) => {
                log::trace!("Sent {:?} to {}", line.trim_end(), conn.peer);
                Ok(())
            }
            Err(e) => {
                self.disconnect();
                Err(Error::Io(e))
            }
        }
    }

    /// Close the active connection, if any
    pub fn disconnect(&mut self) {
        if let Some(conn) = self.connection.take() {
            let _ = conn.stream.shutdown(std::net::Shutdown::Both);
        }
        self.buffer.clear();
    }

    fn try_accept(&mut self) {
        match self.listener.accept() {
            Ok((stream, peer)) => {
                if let Err(e) = stream.set_nonblocking(true) {
                    log::warn!("Rejecting planner {}: {}", peer, e);
                    return;
                }
                if let Err(e) = stream.set_nodelay(true) {
                    log::debug!("Failed to set TCP_NODELAY for {}: {}", peer, e);
                }
                log::info!("Planner connected from {}", peer);
                self.buffer.clear();
                self.connection = Some(Connection { stream, peer });
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {}
            Err(e) => log::warn!("Accept failed: {}", e),
        }
    }
}
