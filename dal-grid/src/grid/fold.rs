//! Range scan fusion.
//!
//! Every beam clears the cells it crosses and, when it returned inside the
//! sensor's range, marks its endpoint as an obstacle. A beam with no usable
//! return (beyond range, non-positive or non-finite) is cast out to
//! `max_range` and clears free space all the way, endpoint included.

use super::raycaster::BresenhamLine;
use super::storage::{CellUpdate, OccupancyGrid};
use crate::core::{Pose2D, RangeScan, WorldPoint};

/// Counters from one [`OccupancyGrid::fold`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FoldStats {
    /// Beams processed
    pub beams: usize,
    /// Beams whose endpoint received obstacle evidence
    pub hits: usize,
    /// Beams cast to max range
    pub misses: usize,
    /// Cell updates applied (frozen cells excluded)
    pub cells_updated: usize,
    /// Cells that crossed a freeze threshold during this fold
    pub newly_frozen: usize,
}

impl FoldStats {
    fn record(&mut self, update: CellUpdate) {
        match update {
            CellUpdate::Frozen => {}
            CellUpdate::Updated => self.cells_updated += 1,
            CellUpdate::Froze => {
                self.cells_updated += 1;
                self.newly_frozen += 1;
            }
        }
    }
}

impl OccupancyGrid {
    /// Fuse one range scan taken at `pose` into the grid.
    ///
    /// Beam `i` points at `pose.theta + scan.angle_min + i * scan.angle_increment`.
    /// The probability view is recomputed once after all beams. An empty
    /// scan leaves the grid untouched.
    pub fn fold(&mut self, pose: &Pose2D, scan: &RangeScan) -> FoldStats {
        let mut stats = FoldStats::default();
        if scan.is_empty() {
            return stats;
        }

        let max_range = self.config().max_range;
        let origin = pose.position();
        let origin_coord = self.world_to_grid(origin);

        for (i, &reading) in scan.ranges.iter().enumerate() {
            let is_hit = RangeScan::is_return(reading) && reading < max_range;
            let range = if is_hit { reading } else { max_range };

            let angle = pose.theta + scan.beam_angle(i);
            let endpoint = WorldPoint::new(
                origin.x + range * angle.cos(),
                origin.y + range * angle.sin(),
            );
            let endpoint_coord = self.world_to_grid(endpoint);

            for coord in BresenhamLine::new(origin_coord, endpoint_coord) {
                let update = if coord == endpoint_coord && is_hit {
                    self.apply_hit(coord)
                } else {
                    self.apply_miss(coord)
                };
                stats.record(update);
            }

            stats.beams += 1;
            if is_hit {
                stats.hits += 1;
            } else {
                stats.misses += 1;
            }
        }

        self.refresh_probability();

        log::trace!(
            "Folded {} beams ({} hits, {} cells, {} frozen)",
            stats.beams,
            stats.hits,
            stats.cells_updated,
            stats.newly_frozen
        );

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GridCoord;
    use crate::grid::GridConfig;
    use approx::assert_relative_eq;

    /// 4m x 4m at 10cm, robot cell (20, 20) at the origin
    fn create_grid() -> OccupancyGrid {
        OccupancyGrid::new(GridConfig::with_bounds(-2.0, 2.0, -2.0, 2.0, 0.1)).unwrap()
    }

    fn single_beam(range: f32) -> RangeScan {
        RangeScan::new(vec![range], 0.0, 0.0)
    }

    #[test]
    fn test_empty_scan_is_noop() {
        let mut grid = create_grid();
        let before = grid.snapshot();
        let stats = grid.fold(&Pose2D::new(0.0, 0.0, 0.0), &RangeScan::default());
        assert_eq!(stats, FoldStats::default());
        assert_eq!(grid.snapshot(), before);
    }

    #[test]
    fn test_hit_marks_endpoint_and_clears_path() {
        let mut grid = create_grid();
        let pose = Pose2D::new(0.05, 0.05, 0.0);
        let stats = grid.fold(&pose, &single_beam(1.0));

        assert_eq!(stats.beams, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);

        // Endpoint x = 1.05 -> col 30
        let wall = GridCoord::new(30, 20);
        assert_relative_eq!(grid.log_odds_at(wall).unwrap(), 0.7, epsilon = 1e-6);
        assert!(grid.probability_at(wall).unwrap() > 0.5);

        for col in 20..30 {
            let c = GridCoord::new(col, 20);
            assert_relative_eq!(grid.log_odds_at(c).unwrap(), -0.2, epsilon = 1e-6);
            assert!(grid.probability_at(c).unwrap() < 0.5);
        }
        // Beyond the wall stays unknown
        assert_eq!(grid.log_odds_at(GridCoord::new(31, 20)), Some(0.0));
        assert_eq!(stats.cells_updated, 11);
    }

    #[test]
    fn test_out_of_range_reading_is_miss() {
        let mut grid = create_grid();
        let pose = Pose2D::new(0.05, 0.05, 0.0);
        let stats = grid.fold(&pose, &single_beam(10.0));

        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 1);
        // Cast to max_range 3.5 from x = 0.05 overshoots the bounds, so the
        // endpoint clamps to the last column and is cleared too.
        let edge = GridCoord::new(39, 20);
        assert_relative_eq!(grid.log_odds_at(edge).unwrap(), -0.2, epsilon = 1e-6);
    }

    #[test]
    fn test_invalid_readings_are_misses() {
        for reading in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY, 0.0, -1.0, 3.5] {
            let mut grid = create_grid();
            let stats = grid.fold(&Pose2D::new(0.05, 0.05, 0.0), &single_beam(reading));
            assert_eq!(stats.misses, 1, "reading {reading}");
            assert_eq!(grid.stats().occupied, 0, "reading {reading}");
        }
    }

    #[test]
    fn test_heading_rotates_beams() {
        let mut grid = create_grid();
        let pose = Pose2D::new(0.05, 0.05, std::f32::consts::FRAC_PI_2);
        grid.fold(&pose, &single_beam(1.0));
        // Pointing +Y: endpoint y = 1.05 -> row 30
        assert_relative_eq!(
            grid.log_odds_at(GridCoord::new(20, 30)).unwrap(),
            0.7,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_repeated_hits_freeze_wall() {
        let mut grid = create_grid();
        let pose = Pose2D::new(0.05, 0.05, 0.0);
        let wall = GridCoord::new(30, 20);

        let mut frozen_total = 0;
        for _ in 0..3 {
            frozen_total += grid.fold(&pose, &single_beam(1.0)).newly_frozen;
        }
        assert!(grid.is_frozen(wall));
        assert_eq!(frozen_total, 1);

        // A later beam passing through the wall cannot erode it
        let locked = grid.log_odds_at(wall).unwrap();
        grid.fold(&pose, &single_beam(2.0));
        assert_eq!(grid.log_odds_at(wall).unwrap(), locked);
    }

    #[test]
    fn test_full_circle_scan_surrounds_robot() {
        let mut grid = create_grid();
        let scan = RangeScan::full_circle(vec![1.0; 360], 0.0);
        let stats = grid.fold(&Pose2D::new(0.0, 0.0, 0.0), &scan);
        assert_eq!(stats.beams, 360);
        assert_eq!(stats.hits, 360);

        let grid_stats = grid.stats();
        assert!(grid_stats.occupied > 0);
        assert!(grid_stats.free > 0);
        // Robot cell was crossed by every beam
        assert!(grid.is_frozen(grid.world_to_grid(WorldPoint::new(0.0, 0.0))));
    }
}
