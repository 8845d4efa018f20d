//! Wire formats
//!
//! # Telemetry (UDP, robot → observer)
//!
//! Every datagram is self-contained, packed, **little-endian**:
//!
//! ```text
//! Pose+Range (port 5555)
//! ┌──────┬──────┬──────┬─────────┬────────────┬──────────────────────┐
//! │ id   │ x    │ y    │ heading │ beam_count │ ranges               │
//! │ u8   │ f32  │ f32  │ f32     │ u16        │ beam_count × f32     │
//! └──────┴──────┴──────┴─────────┴────────────┴──────────────────────┘
//!   15-byte header
//!
//! Image (port 5556)
//! ┌──────┬───────┬────────┬─────────────────────────────┐
//! │ id   │ width │ height │ RGB, row-major, top row first│
//! │ u8   │ u16   │ u16    │ width × height × 3 bytes     │
//! └──────┴───────┴────────┴─────────────────────────────┘
//!   5-byte header
//! ```
//!
//! Image datagrams larger than the transport ceiling (60000 bytes by
//! default) are dropped by the sender, never fragmented.
//!
//! # Commands (TCP, planner ⇄ robot)
//!
//! ASCII lines terminated by `\n`:
//!
//! ```text
//! planner → robot:  WAYPOINT <x> <y>
//! robot → planner:  REACHED <x> <y>
//! ```
//!
//! A line that is not exactly a keyword plus two finite decimals is
//! discarded by the receiver; the stream continues with the next line.

mod command;
mod telemetry;

pub use command::{LineBuffer, MAX_LINE_LEN, TextMessage, parse_reached, parse_waypoint};
pub use telemetry::{ImageDatagram, ImageFrame, ImageHeader, MAX_IMAGE_DATAGRAM, PoseDatagram};
