//! Occupancy grid storage and the range-scan fold.
//!
//! ## Architecture
//!
//! ```text
//!   (Pose2D, RangeScan)
//!           │
//!           ▼
//!   ┌───────────────┐     BresenhamLine per beam
//!   │     fold      │ ──► miss along ray, hit/miss at endpoint
//!   └───────┬───────┘
//!           ▼
//!   ┌──────────────────────────────┐
//!   │        OccupancyGrid         │
//!   │  log_odds: [L L L L ...]     │  source of truth
//!   │  frozen:   [F F F F ...]     │  permanent locks
//!   │  probability: [p p p p ...]  │  derived view, rebuilt per fold
//!   └──────────────────────────────┘
//! ```
//!
//! ## Log-Odds Model
//!
//! ```text
//! L(x) = ln(P(x) / (1 - P(x)))
//! miss: L -= 0.2   (clamped to -4)
//! hit:  L += 0.7   (clamped to +4)
//! L <= -2 or L >= +2  →  cell frozen forever
//! P = 1 - 1 / (1 + e^L)
//! ```

mod config;
mod fold;
mod raycaster;
mod storage;

pub use config::{GridBounds, GridConfig, LogOddsConfig, MAX_CELLS};
pub use fold::FoldStats;
pub use storage::{GridSnapshot, GridStats, OccupancyGrid};
