//! Binary telemetry datagrams.

use crate::error::{Error, Result};
use dal_grid::Pose2D;

/// Default ceiling for one image datagram (bytes)
pub const MAX_IMAGE_DATAGRAM: usize = 60_000;

#[inline]
fn ensure_len(buf: &[u8], needed: usize) -> Result<()> {
    if buf.len() < needed {
        Err(Error::Truncated {
            needed,
            actual: buf.len(),
        })
    } else {
        Ok(())
    }
}

#[inline]
fn read_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

#[inline]
fn read_f32(buf: &[u8], at: usize) -> f32 {
    f32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

/// Robot pose plus the range readings taken at that pose.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PoseDatagram {
    /// Sending robot
    pub robot_id: u8,
    /// X position (meters)
    pub x: f32,
    /// Y position (meters)
    pub y: f32,
    /// Heading (radians)
    pub heading: f32,
    /// Empty when the robot has no range sensor
    pub ranges: Vec<f32>,
}

impl PoseDatagram {
    /// id + x + y + heading + beam_count
    pub const HEADER_LEN: usize = 1 + 4 + 4 + 4 + 2;

    /// Largest beam count the header can express
    pub const MAX_BEAMS: usize = u16::MAX as usize;

    /// Build a datagram from a pose sample
    pub fn new(robot_id: u8, pose: &Pose2D, ranges: Vec<f32>) -> Self {
        Self {
            robot_id,
            x: pose.x,
            y: pose.y,
            heading: pose.theta,
            ranges,
        }
    }

    /// Pose carried by this datagram
    pub fn pose(&self) -> Pose2D {
        Pose2D::new(self.x, self.y, self.heading)
    }

    /// Encoded length in bytes
    pub fn encoded_len(&self) -> usize {
        Self::HEADER_LEN + self.ranges.len() * 4
    }

    /// Serialize to a fresh buffer
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut buf)?;
        Ok(buf)
    }

    /// Serialize into a reusable buffer (cleared first)
    pub fn encode_into(&self, buf: &mut Vec<u8>) -> Result<()> {
        if self.ranges.len() > Self::MAX_BEAMS {
            return Err(Error::InvalidParameter(format!(
                "{} beams exceed the {} a datagram can carry",
                self.ranges.len(),
                Self::MAX_BEAMS
            )));
        }

        buf.clear();
        buf.reserve(self.encoded_len());
        buf.push(self.robot_id);
        buf.extend_from_slice(&self.x.to_le_bytes());
        buf.extend_from_slice(&self.y.to_le_bytes());
        buf.extend_from_slice(&self.heading.to_le_bytes());
        buf.extend_from_slice(&(self.ranges.len() as u16).to_le_bytes());
        for range in &self.ranges {
            buf.extend_from_slice(&range.to_le_bytes());
        }
        Ok(())
    }

    /// Parse a datagram; bytes after the declared beams are ignored.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        ensure_len(buf, Self::HEADER_LEN)?;
        let count = read_u16(buf, 13) as usize;
        ensure_len(buf, Self::HEADER_LEN + count * 4)?;

        let ranges = buf[Self::HEADER_LEN..Self::HEADER_LEN + count * 4]
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        Ok(Self {
            robot_id: buf[0],
            x: read_f32(buf, 1),
            y: read_f32(buf, 5),
            heading: read_f32(buf, 9),
            ranges,
        })
    }
}

/// Image datagram header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageHeader {
    /// Sending robot
    pub robot_id: u8,
    /// Width in pixels
    pub width: u16,
    /// Height in pixels
    pub height: u16,
}

impl ImageHeader {
    /// id + width + height
    pub const LEN: usize = 1 + 2 + 2;

    /// Parse only the header
    pub fn decode(buf: &[u8]) -> Result<Self> {
        ensure_len(buf, Self::LEN)?;
        Ok(Self {
            robot_id: buf[0],
            width: read_u16(buf, 1),
            height: read_u16(buf, 3),
        })
    }

    /// RGB payload length implied by the dimensions
    pub fn payload_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

/// Packed 24-bit RGB frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageFrame {
    /// Width in pixels
    pub width: u16,
    /// Height in pixels
    pub height: u16,
    rgb: Vec<u8>,
}

impl ImageFrame {
    /// Wrap an RGB buffer; its length must be `width * height * 3`.
    pub fn from_rgb(width: u16, height: u16, rgb: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if rgb.len() != expected {
            return Err(Error::InvalidParameter(format!(
                "{}x{} RGB frame needs {} bytes, got {}",
                width,
                height,
                expected,
                rgb.len()
            )));
        }
        Ok(Self { width, height, rgb })
    }

    /// Convert a BGRA capture buffer (4 bytes per pixel) to RGB.
    pub fn from_bgra(width: u16, height: u16, bgra: &[u8]) -> Result<Self> {
        let pixels = width as usize * height as usize;
        if bgra.len() != pixels * 4 {
            return Err(Error::InvalidParameter(format!(
                "{}x{} BGRA frame needs {} bytes, got {}",
                width,
                height,
                pixels * 4,
                bgra.len()
            )));
        }

        let mut rgb = Vec::with_capacity(pixels * 3);
        for px in bgra.chunks_exact(4) {
            rgb.extend_from_slice(&[px[2], px[1], px[0]]);
        }
        Ok(Self { width, height, rgb })
    }

    /// RGB bytes, row-major, top row first
    pub fn rgb(&self) -> &[u8] {
        &self.rgb
    }

    /// RGB triple at (x, y)
    pub fn pixel(&self, x: u16, y: u16) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 3;
        Some([self.rgb[i], self.rgb[i + 1], self.rgb[i + 2]])
    }
}

/// Camera frame tagged with the robot that captured it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageDatagram {
    /// Sending robot
    pub robot_id: u8,
    /// RGB frame
    pub frame: ImageFrame,
}

impl ImageDatagram {
    /// Tag a frame with its robot
    pub fn new(robot_id: u8, frame: ImageFrame) -> Self {
        Self { robot_id, frame }
    }

    /// Encoded length in bytes
    pub fn encoded_len(&self) -> usize {
        ImageHeader::LEN + self.frame.rgb.len()
    }

    /// Serialize, refusing anything larger than `limit` bytes
    pub fn encode(&self, limit: usize) -> Result<Vec<u8>> {
        let size = self.encoded_len();
        if size > limit {
            return Err(Error::Oversize { size, limit });
        }

        let mut buf = Vec::with_capacity(size);
        buf.push(self.robot_id);
        buf.extend_from_slice(&self.frame.width.to_le_bytes());
        buf.extend_from_slice(&self.frame.height.to_le_bytes());
        buf.extend_from_slice(&self.frame.rgb);
        Ok(buf)
    }

    /// Parse header and full pixel payload
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let header = ImageHeader::decode(buf)?;
        let end = ImageHeader::LEN + header.payload_len();
        ensure_len(buf, end)?;
        let frame = ImageFrame::from_rgb(
            header.width,
            header.height,
            buf[ImageHeader::LEN..end].to_vec(),
        )?;
        Ok(Self {
            robot_id: header.robot_id,
            frame,
        })
    }
}
