//! Grid storage: parallel log-odds / frozen arrays and the derived
//! probability view.
//!
//! ## Memory Layout
//!
//! ```text
//! index = row * width + col
//!
//! log_odds:    [L L L L L L L L ...]   f32, source of truth
//! frozen:      [F F F F F F F F ...]   bool, set once, never cleared
//! probability: [p p p p p p p p ...]   f32, recomputed after each fold
//! ```

use super::config::{GridBounds, GridConfig};
use crate::core::{GridCoord, WorldPoint};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Result of applying one observation to one cell
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CellUpdate {
    /// Cell was already frozen, nothing changed
    Frozen,
    /// Log-odds moved, cell still accepts updates
    Updated,
    /// Log-odds moved and crossed the freeze threshold
    Froze,
}

/// Log-odds occupancy grid with freeze-on-confidence cells.
#[derive(Clone, Debug)]
pub struct OccupancyGrid {
    config: GridConfig,
    width: usize,
    height: usize,
    log_odds: Vec<f32>,
    frozen: Vec<bool>,
    probability: Vec<f32>,
}

impl OccupancyGrid {
    /// Create an all-unknown grid (every cell at p = 0.5).
    pub fn new(config: GridConfig) -> Result<Self> {
        config.validate()?;
        let width = config.width_cells();
        let height = config.height_cells();
        let cells = width * height;

        log::debug!(
            "Occupancy grid {}x{} cells at {:.3}m ({:?})",
            width,
            height,
            config.resolution,
            config.bounds
        );

        Ok(Self {
            config,
            width,
            height,
            log_odds: vec![0.0; cells],
            frozen: vec![false; cells],
            probability: vec![0.5; cells],
        })
    }

    /// Grid width in cells
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Meters per cell
    #[inline]
    pub fn resolution(&self) -> f32 {
        self.config.resolution
    }

    /// Mapped world rectangle
    #[inline]
    pub fn bounds(&self) -> GridBounds {
        self.config.bounds
    }

    /// Full configuration
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Total number of cells
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// Whether a coordinate lies inside the grid
    #[inline]
    pub fn contains(&self, coord: GridCoord) -> bool {
        coord.col >= 0
            && coord.row >= 0
            && (coord.col as usize) < self.width
            && (coord.row as usize) < self.height
    }

    #[inline]
    fn index(&self, coord: GridCoord) -> Option<usize> {
        if self.contains(coord) {
            Some(coord.row as usize * self.width + coord.col as usize)
        } else {
            None
        }
    }

    /// Convert a world point to the cell containing it.
    ///
    /// Points outside the bounds map to the nearest edge cell, so beams that
    /// overshoot the mapped area pile up on the boundary instead of being
    /// dropped.
    pub fn world_to_grid(&self, point: WorldPoint) -> GridCoord {
        let b = &self.config.bounds;
        let col = ((point.x - b.x_min) / self.config.resolution).floor() as i64;
        let row = ((point.y - b.y_min) / self.config.resolution).floor() as i64;
        GridCoord::new(
            col.clamp(0, self.width as i64 - 1) as i32,
            row.clamp(0, self.height as i64 - 1) as i32,
        )
    }

    /// World coordinates of a cell's centre
    pub fn grid_to_world(&self, coord: GridCoord) -> WorldPoint {
        let b = &self.config.bounds;
        WorldPoint::new(
            b.x_min + (coord.col as f32 + 0.5) * self.config.resolution,
            b.y_min + (coord.row as f32 + 0.5) * self.config.resolution,
        )
    }

    /// Row-major probability view (width × height, values in (0, 1))
    #[inline]
    pub fn probability(&self) -> &[f32] {
        &self.probability
    }

    /// Occupancy probability of one cell
    pub fn probability_at(&self, coord: GridCoord) -> Option<f32> {
        self.index(coord).map(|i| self.probability[i])
    }

    /// Internal log-odds of one cell
    pub fn log_odds_at(&self, coord: GridCoord) -> Option<f32> {
        self.index(coord).map(|i| self.log_odds[i])
    }

    /// Whether a cell has stopped accepting updates
    pub fn is_frozen(&self, coord: GridCoord) -> bool {
        self.index(coord).is_some_and(|i| self.frozen[i])
    }

    /// Owned copy of geometry and probabilities for renderers
    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            width: self.width,
            height: self.height,
            bounds: self.config.bounds,
            resolution: self.config.resolution,
            probability: self.probability.clone(),
        }
    }

    /// Count cells by classification.
    ///
    /// A cell is free below p = 0.4, occupied above p = 0.6 and unknown in
    /// between.
    pub fn stats(&self) -> GridStats {
        let mut stats = GridStats::default();
        for (&p, &frozen) in self.probability.iter().zip(self.frozen.iter()) {
            if p < 0.5 - GridStats::UNKNOWN_BAND {
                stats.free += 1;
            } else if p > 0.5 + GridStats::UNKNOWN_BAND {
                stats.occupied += 1;
            } else {
                stats.unknown += 1;
            }
            if frozen {
                stats.frozen += 1;
            }
        }
        stats
    }

    /// Convert log-odds to probability: `P = 1 - 1 / (1 + e^L)`
    #[inline]
    pub fn log_odds_to_probability(l: f32) -> f32 {
        1.0 - 1.0 / (1.0 + l.exp())
    }

    /// Apply free-space evidence to a cell.
    pub(crate) fn apply_miss(&mut self, coord: GridCoord) -> CellUpdate {
        let Some(i) = self.index(coord) else {
            return CellUpdate::Frozen;
        };
        if self.frozen[i] {
            return CellUpdate::Frozen;
        }
        let lo = &self.config.log_odds;
        let value = (self.log_odds[i] - lo.l_free).max(lo.l_min);
        self.log_odds[i] = value;
        if value <= lo.freeze_free {
            self.frozen[i] = true;
            CellUpdate::Froze
        } else {
            CellUpdate::Updated
        }
    }

    /// Apply obstacle evidence to a cell.
    pub(crate) fn apply_hit(&mut self, coord: GridCoord) -> CellUpdate {
        let Some(i) = self.index(coord) else {
            return CellUpdate::Frozen;
        };
        if self.frozen[i] {
            return CellUpdate::Frozen;
        }
        let lo = &self.config.log_odds;
        let value = (self.log_odds[i] + lo.l_occ).min(lo.l_max);
        self.log_odds[i] = value;
        if value >= lo.freeze_occ {
            self.frozen[i] = true;
            CellUpdate::Froze
        } else {
            CellUpdate::Updated
        }
    }

    /// Rebuild the probability view from the log-odds array.
    pub(crate) fn refresh_probability(&mut self) {
        for (p, &l) in self.probability.iter_mut().zip(self.log_odds.iter()) {
            *p = Self::log_odds_to_probability(l);
        }
    }
}

/// Owned probability map plus the geometry needed to draw it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridSnapshot {
    /// Width in cells
    pub width: usize,
    /// Height in cells
    pub height: usize,
    /// Mapped world rectangle
    pub bounds: GridBounds,
    /// Meters per cell
    pub resolution: f32,
    /// Row-major probabilities, row 0 at `y_min`
    pub probability: Vec<f32>,
}

impl GridSnapshot {
    /// Probability at (col, row), if inside the grid
    pub fn at(&self, col: usize, row: usize) -> Option<f32> {
        if col < self.width && row < self.height {
            Some(self.probability[row * self.width + col])
        } else {
            None
        }
    }
}

/// Cell counts by classification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridStats {
    /// Cells with p < 0.4
    pub free: usize,
    /// Cells with p > 0.6
    pub occupied: usize,
    /// Cells with 0.4 <= p <= 0.6
    pub unknown: usize,
    /// Cells that no longer accept updates
    pub frozen: usize,
}

impl GridStats {
    const UNKNOWN_BAND: f32 = 0.1;

    /// Total observed cells
    pub fn known(&self) -> usize {
        self.free + self.occupied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid_10x10() -> OccupancyGrid {
        // 1m x 1m at 10cm
        OccupancyGrid::new(GridConfig::with_bounds(0.0, 1.0, 0.0, 1.0, 0.1)).unwrap()
    }

    #[test]
    fn test_grid_creation() {
        let grid = grid_10x10();
        assert_eq!(grid.width(), 10);
        assert_eq!(grid.height(), 10);
        assert_eq!(grid.cell_count(), 100);
        assert!(grid.probability().iter().all(|&p| p == 0.5));
    }

    #[test]
    fn test_world_to_grid_conversion() {
        let grid = grid_10x10();
        assert_eq!(grid.world_to_grid(WorldPoint::new(0.0, 0.0)), GridCoord::new(0, 0));
        assert_eq!(grid.world_to_grid(WorldPoint::new(0.55, 0.25)), GridCoord::new(5, 2));
    }

    #[test]
    fn test_world_to_grid_clamps_outside_points() {
        let grid = grid_10x10();
        assert_eq!(grid.world_to_grid(WorldPoint::new(-5.0, 0.5)), GridCoord::new(0, 5));
        assert_eq!(grid.world_to_grid(WorldPoint::new(7.0, 9.0)), GridCoord::new(9, 9));
        assert_eq!(grid.world_to_grid(WorldPoint::new(0.5, -0.01)), GridCoord::new(5, 0));
    }

    #[test]
    fn test_grid_to_world_is_cell_centre() {
        let grid = grid_10x10();
        let p = grid.grid_to_world(GridCoord::new(0, 3));
        assert_relative_eq!(p.x, 0.05, epsilon = 1e-6);
        assert_relative_eq!(p.y, 0.35, epsilon = 1e-6);
        assert_eq!(grid.world_to_grid(p), GridCoord::new(0, 3));
    }

    #[test]
    fn test_log_odds_probability_conversion() {
        assert_relative_eq!(OccupancyGrid::log_odds_to_probability(0.0), 0.5);
        assert_relative_eq!(
            OccupancyGrid::log_odds_to_probability(4.0),
            0.98201376,
            epsilon = 1e-6
        );
        assert_relative_eq!(
            OccupancyGrid::log_odds_to_probability(-4.0),
            0.01798621,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_apply_hit_freezes_after_three() {
        let mut grid = grid_10x10();
        let c = GridCoord::new(4, 4);
        assert_eq!(grid.apply_hit(c), CellUpdate::Updated); // 0.7
        assert_eq!(grid.apply_hit(c), CellUpdate::Updated); // 1.4
        assert_eq!(grid.apply_hit(c), CellUpdate::Froze); // 2.1
        assert!(grid.is_frozen(c));
        assert_eq!(grid.apply_miss(c), CellUpdate::Frozen);
        assert_relative_eq!(grid.log_odds_at(c).unwrap(), 2.1, epsilon = 1e-5);
    }

    #[test]
    fn test_apply_miss_freezes_after_ten() {
        let mut grid = grid_10x10();
        let c = GridCoord::new(1, 1);
        for _ in 0..9 {
            assert_ne!(grid.apply_miss(c), CellUpdate::Froze);
        }
        assert!(!grid.is_frozen(c));
        // Ten steps of 0.2 land on -2.0 give or take rounding
        grid.apply_miss(c);
        grid.apply_miss(c);
        assert!(grid.is_frozen(c));
        assert!(grid.log_odds_at(c).unwrap() <= -2.0 + 1e-5);
    }

    #[test]
    fn test_out_of_range_queries() {
        let grid = grid_10x10();
        assert_eq!(grid.probability_at(GridCoord::new(10, 0)), None);
        assert_eq!(grid.log_odds_at(GridCoord::new(-1, 0)), None);
        assert!(!grid.is_frozen(GridCoord::new(0, 100)));
    }

    #[test]
    fn test_stats_counts_everything() {
        let mut grid = grid_10x10();
        for _ in 0..3 {
            grid.apply_hit(GridCoord::new(0, 0));
        }
        for _ in 0..3 {
            grid.apply_miss(GridCoord::new(1, 0));
        }
        grid.refresh_probability();
        let stats = grid.stats();
        assert_eq!(stats.occupied, 1);
        assert_eq!(stats.free, 1);
        assert_eq!(stats.unknown, 98);
        assert_eq!(stats.frozen, 1);
        assert_eq!(stats.known(), 2);
    }

    #[test]
    fn test_snapshot_matches_view() {
        let mut grid = grid_10x10();
        grid.apply_hit(GridCoord::new(2, 3));
        grid.refresh_probability();
        let snap = grid.snapshot();
        assert_eq!(snap.width, 10);
        assert_eq!(snap.at(2, 3), grid.probability_at(GridCoord::new(2, 3)));
        assert_eq!(snap.at(10, 0), None);
    }
}
