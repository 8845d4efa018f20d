//! Configuration types for the occupancy grid.

use crate::error::{GridError, Result};
use serde::{Deserialize, Serialize};

/// Largest grid accepted (cells); about 600 MB of cell state
pub const MAX_CELLS: usize = 1 << 26;

/// World-space rectangle covered by the grid (meters)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridBounds {
    /// Left edge
    pub x_min: f32,
    /// Right edge
    pub x_max: f32,
    /// Bottom edge
    pub y_min: f32,
    /// Top edge
    pub y_max: f32,
}

impl GridBounds {
    /// Create bounds from edges
    pub fn new(x_min: f32, x_max: f32, y_min: f32, y_max: f32) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Width in meters
    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    /// Height in meters
    pub fn height(&self) -> f32 {
        self.y_max - self.y_min
    }
}

/// Grid geometry and sensor model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Mapped area
    pub bounds: GridBounds,

    /// Meters per cell (e.g. 0.15 = 15cm cells)
    pub resolution: f32,

    /// Readings at or beyond this distance count as "no obstacle" (meters)
    pub max_range: f32,

    /// Evidence weights and limits
    #[serde(default)]
    pub log_odds: LogOddsConfig,
}

impl GridConfig {
    /// Config for the given bounds and resolution with default sensor model
    pub fn with_bounds(x_min: f32, x_max: f32, y_min: f32, y_max: f32, resolution: f32) -> Self {
        Self {
            bounds: GridBounds::new(x_min, x_max, y_min, y_max),
            resolution,
            max_range: 3.5,
            log_odds: LogOddsConfig::default(),
        }
    }

    /// Set the sensor max range
    pub fn with_max_range(mut self, max_range: f32) -> Self {
        self.max_range = max_range;
        self
    }

    /// Grid width in cells (`ceil(width / resolution)`, at least 1)
    pub fn width_cells(&self) -> usize {
        cells_along(self.bounds.width(), self.resolution)
    }

    /// Grid height in cells (`ceil(height / resolution)`, at least 1)
    pub fn height_cells(&self) -> usize {
        cells_along(self.bounds.height(), self.resolution)
    }

    /// Total cell count, `None` past [`MAX_CELLS`]
    pub fn cell_count(&self) -> Option<usize> {
        self.width_cells()
            .checked_mul(self.height_cells())
            .filter(|&cells| cells <= MAX_CELLS)
    }

    /// Check that the configuration describes a non-empty grid
    pub fn validate(&self) -> Result<()> {
        let b = &self.bounds;
        let all_finite = [b.x_min, b.x_max, b.y_min, b.y_max, self.resolution, self.max_range]
            .iter()
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(GridError::InvalidGeometry(
                "bounds, resolution and max_range must be finite".to_string(),
            ));
        }
        if b.x_max <= b.x_min || b.y_max <= b.y_min {
            return Err(GridError::InvalidGeometry(format!(
                "empty bounds x=[{}, {}] y=[{}, {}]",
                b.x_min, b.x_max, b.y_min, b.y_max
            )));
        }
        if self.resolution <= 0.0 {
            return Err(GridError::InvalidGeometry(format!(
                "resolution must be positive, got {}",
                self.resolution
            )));
        }
        if self.max_range <= 0.0 {
            return Err(GridError::InvalidGeometry(format!(
                "max_range must be positive, got {}",
                self.max_range
            )));
        }
        if self.cell_count().is_none() {
            return Err(GridError::InvalidGeometry(format!(
                "{}m x {}m at {}m exceeds {} cells",
                b.width(),
                b.height(),
                self.resolution,
                MAX_CELLS
            )));
        }
        self.log_odds.validate()
    }
}

/// Cells needed to cover `extent`, saturating at `usize::MAX`
fn cells_along(extent: f32, resolution: f32) -> usize {
    let cells = (f64::from(extent) / f64::from(resolution)).ceil();
    if cells >= usize::MAX as f64 {
        usize::MAX
    } else {
        (cells as usize).max(1)
    }
}

/// Log-odds update parameters.
///
/// With the defaults a wall freezes after three hits and free space after
/// ten misses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogOddsConfig {
    /// Decrement applied for a beam passing through (free evidence)
    #[serde(default = "default_l_free")]
    pub l_free: f32,

    /// Increment applied at a beam endpoint inside max range (occupied evidence)
    #[serde(default = "default_l_occ")]
    pub l_occ: f32,

    /// Lower clamp. P ≈ 0.018
    #[serde(default = "default_l_min")]
    pub l_min: f32,

    /// Upper clamp. P ≈ 0.982
    #[serde(default = "default_l_max")]
    pub l_max: f32,

    /// A cell moving toward free freezes at or below this value
    #[serde(default = "default_freeze_free")]
    pub freeze_free: f32,

    /// A cell moving toward occupied freezes at or above this value
    #[serde(default = "default_freeze_occ")]
    pub freeze_occ: f32,
}

fn default_l_free() -> f32 {
    0.2
}
fn default_l_occ() -> f32 {
    0.7
}
fn default_l_min() -> f32 {
    -4.0
}
fn default_l_max() -> f32 {
    4.0
}
fn default_freeze_free() -> f32 {
    -2.0
}
fn default_freeze_occ() -> f32 {
    2.0
}

impl Default for LogOddsConfig {
    fn default() -> Self {
        Self {
            l_free: default_l_free(),
            l_occ: default_l_occ(),
            l_min: default_l_min(),
            l_max: default_l_max(),
            freeze_free: default_freeze_free(),
            freeze_occ: default_freeze_occ(),
        }
    }
}

impl LogOddsConfig {
    fn validate(&self) -> Result<()> {
        if !(self.l_min < self.freeze_free
            && self.freeze_free < 0.0
            && 0.0 < self.freeze_occ
            && self.freeze_occ < self.l_max)
        {
            return Err(GridError::InvalidGeometry(format!(
                "log-odds limits must satisfy l_min < freeze_free < 0 < freeze_occ < l_max, got {:?}",
                self
            )));
        }
        if self.l_free <= 0.0 || self.l_occ <= 0.0 {
            return Err(GridError::InvalidGeometry(
                "l_free and l_occ must be positive step sizes".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_counts_round_up() {
        let config = GridConfig::with_bounds(-3.475, 3.475, -11.13, 11.41, 0.15);
        assert_eq!(config.width_cells(), 47); // 6.95 / 0.15 = 46.33
        assert_eq!(config.height_cells(), 151); // 22.54 / 0.15 = 150.27
    }

    #[test]
    fn test_validate_rejects_bad_geometry() {
        assert!(GridConfig::with_bounds(0.0, 1.0, 0.0, 1.0, 0.1).validate().is_ok());
        assert!(GridConfig::with_bounds(1.0, 0.0, 0.0, 1.0, 0.1).validate().is_err());
        assert!(GridConfig::with_bounds(0.0, 1.0, 0.0, 1.0, 0.0).validate().is_err());
        assert!(GridConfig::with_bounds(0.0, f32::NAN, 0.0, 1.0, 0.1).validate().is_err());
        assert!(
            GridConfig::with_bounds(0.0, 1.0, 0.0, 1.0, 0.1)
                .with_max_range(-1.0)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_oversized_grid_rejected() {
        let huge = GridConfig::with_bounds(-1e6, 1e6, -1e6, 1e6, 0.01);
        assert_eq!(huge.cell_count(), None);
        assert!(matches!(huge.validate(), Err(GridError::InvalidGeometry(_))));

        // Finite extent overflowing f32 subtraction
        let wide = GridConfig::with_bounds(-f32::MAX, f32::MAX, 0.0, 1.0, 1.0);
        assert!(wide.validate().is_err());

        let tiny = GridConfig::with_bounds(0.0, 1.0, 0.0, 1.0, 1e-30);
        assert!(tiny.validate().is_err());

        let reference = GridConfig::with_bounds(-3.475, 3.475, -11.13, 11.41, 0.15);
        assert_eq!(reference.cell_count(), Some(47 * 151));
    }
}
