//! Line-oriented command protocol.

use dal_grid::WorldPoint;
use std::fmt;

/// Longest partial line kept while waiting for its newline
pub const MAX_LINE_LEN: usize = 4096;

/// One protocol line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TextMessage {
    /// Planner asks the robot to drive to a point
    Waypoint(WorldPoint),
    /// Robot reports arrival at the commanded point
    Reached(WorldPoint),
}

impl TextMessage {
    /// Parse one line (trailing `\n` / `\r\n` allowed).
    ///
    /// Returns `None` unless the line is exactly a known keyword followed by
    /// two finite decimals.
    pub fn parse(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace();
        let keyword = tokens.next()?;
        let x = parse_coord(tokens.next()?)?;
        let y = parse_coord(tokens.next()?)?;
        if tokens.next().is_some() {
            return None;
        }

        let point = WorldPoint::new(x, y);
        match keyword {
            "WAYPOINT" => Some(TextMessage::Waypoint(point)),
            "REACHED" => Some(TextMessage::Reached(point)),
            _ => None,
        }
    }

    /// Wire form including the terminating newline
    pub fn encode(&self) -> String {
        format!("{}\n", self)
    }
}

impl fmt::Display for TextMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextMessage::Waypoint(p) => write!(f, "WAYPOINT {} {}", p.x, p.y),
            TextMessage::Reached(p) => write!(f, "REACHED {} {}", p.x, p.y),
        }
    }
}

fn parse_coord(token: &str) -> Option<f32> {
    token.parse::<f32>().ok().filter(|v| v.is_finite())
}

/// Parse a `WAYPOINT x y` line
pub fn parse_waypoint(line: &str) -> Option<(f32, f32)> {
    match TextMessage::parse(line)? {
        TextMessage::Waypoint(p) => Some((p.x, p.y)),
        TextMessage::Reached(_) => None,
    }
}

/// Parse a `REACHED x y` line
pub fn parse_reached(line: &str) -> Option<(f32, f32)> {
    match TextMessage::parse(line)? {
        TextMessage::Reached(p) => Some((p.x, p.y)),
        TextMessage::Waypoint(_) => None,
    }
}

/// Reassembles `\n`-terminated lines from arbitrary stream reads.
///
/// A partial line longer than the cap is thrown away together with the rest
/// of that line, up to and including its newline.
#[derive(Debug)]
pub struct LineBuffer {
    pending: Vec<u8>,
    max_len: usize,
    overflowed: bool,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineBuffer {
    /// Buffer with the default [`MAX_LINE_LEN`] cap
    pub fn new() -> Self {
        Self::with_max_len(MAX_LINE_LEN)
    }

    /// Buffer that discards partial lines longer than `max_len` bytes
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            pending: Vec::with_capacity(256),
            max_len,
            overflowed: false,
        }
    }

    /// Append bytes and return every line they complete, in order.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in bytes {
            if byte == b'\n' {
                if self.overflowed {
                    self.overflowed = false;
                    continue;
                }
                if self.pending.last() == Some(&b'\r') {
                    self.pending.pop();
                }
                lines.push(String::from_utf8_lossy(&self.pending).into_owned());
                self.pending.clear();
            } else if !self.overflowed {
                self.pending.push(byte);
                if self.pending.len() > self.max_len {
                    log::warn!(
                        "Discarding command line longer than {} bytes",
                        self.max_len
                    );
                    self.pending.clear();
                    self.overflowed = true;
                }
            }
        }
        lines
    }

    /// Forget any partial line (new connection)
    pub fn clear(&mut self) {
        self.pending.clear();
        self.overflowed = false;
    }
}
