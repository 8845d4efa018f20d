//! Property tests for the occupancy grid.
//!
//! Run with: cargo test -p dal-grid --test grid_properties

use dal_grid::{GridConfig, GridCoord, GridError, OccupancyGrid, Pose2D, RangeScan};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

fn small_grid() -> OccupancyGrid {
    // 2m x 2m at 10cm, beams regularly overshoot the bounds
    OccupancyGrid::new(GridConfig::with_bounds(-1.0, 1.0, -1.0, 1.0, 0.1)).unwrap()
}

/// Any reading a real sensor driver might hand over, garbage included.
fn arb_reading() -> impl Strategy<Value = f32> {
    prop_oneof![
        8 => 0.05f32..4.0,
        1 => Just(f32::NAN),
        1 => Just(f32::INFINITY),
        1 => Just(0.0f32),
        1 => -1.0f32..0.0,
    ]
}

fn arb_pose() -> impl Strategy<Value = Pose2D> {
    (-1.2f32..1.2, -1.2f32..1.2, -4.0f32..4.0).prop_map(|(x, y, t)| Pose2D::new(x, y, t))
}

fn arb_scan() -> impl Strategy<Value = RangeScan> {
    (prop::collection::vec(arb_reading(), 0..48), -3.2f32..3.2)
        .prop_map(|(ranges, angle_min)| RangeScan::full_circle(ranges, angle_min))
}

fn all_coords(grid: &OccupancyGrid) -> Vec<GridCoord> {
    let mut coords = Vec::with_capacity(grid.cell_count());
    for row in 0..grid.height() as i32 {
        for col in 0..grid.width() as i32 {
            coords.push(GridCoord::new(col, row));
        }
    }
    coords
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn log_odds_and_probability_stay_bounded(
        observations in prop::collection::vec((arb_pose(), arb_scan()), 1..12)
    ) {
        let mut grid = small_grid();
        for (pose, scan) in &observations {
            grid.fold(pose, scan);
        }
        for coord in all_coords(&grid) {
            let l = grid.log_odds_at(coord).unwrap();
            prop_assert!((-4.0..=4.0).contains(&l), "log-odds {} at {:?}", l, coord);
        }
        for &p in grid.probability() {
            prop_assert!(p > 0.0 && p < 1.0, "probability {}", p);
        }
    }

    #[test]
    fn frozen_cells_never_change(
        observations in prop::collection::vec((arb_pose(), arb_scan()), 2..16)
    ) {
        let mut grid = small_grid();
        let coords = all_coords(&grid);
        let mut locked: Vec<Option<f32>> = vec![None; coords.len()];

        for (pose, scan) in &observations {
            grid.fold(pose, scan);
            for (i, &coord) in coords.iter().enumerate() {
                let l = grid.log_odds_at(coord).unwrap();
                match locked[i] {
                    Some(value) => {
                        prop_assert!(grid.is_frozen(coord));
                        prop_assert_eq!(l, value);
                    }
                    None => {
                        if grid.is_frozen(coord) {
                            prop_assert!(l <= -2.0 || l >= 2.0);
                            locked[i] = Some(l);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn empty_scan_leaves_grid_unchanged(
        observations in prop::collection::vec((arb_pose(), arb_scan()), 0..6),
        pose in arb_pose(),
        angle_min in -3.2f32..3.2,
    ) {
        let mut grid = small_grid();
        for (p, scan) in &observations {
            grid.fold(p, scan);
        }
        let before = grid.snapshot();
        let stats = grid.fold(&pose, &RangeScan::full_circle(Vec::new(), angle_min));
        prop_assert_eq!(stats.beams, 0);
        prop_assert_eq!(grid.snapshot(), before);
    }

    #[test]
    fn beam_count_matches_scan(pose in arb_pose(), scan in arb_scan()) {
        let mut grid = small_grid();
        let stats = grid.fold(&pose, &scan);
        prop_assert_eq!(stats.beams, scan.len());
        prop_assert_eq!(stats.hits + stats.misses, scan.len());
    }
}

#[test]
fn reference_room_geometry() {
    let config = GridConfig::with_bounds(-3.475, 3.475, -11.13, 11.41, 0.15);
    let grid = OccupancyGrid::new(config).unwrap();
    assert_eq!(grid.width(), 47);
    assert_eq!(grid.height(), 151);
    assert_eq!(grid.probability().len(), 47 * 151);
    assert_eq!(grid.stats().unknown, 47 * 151);
}

#[test]
fn invalid_geometry_is_rejected() {
    let config = GridConfig::with_bounds(1.0, -1.0, 0.0, 1.0, 0.1);
    assert!(OccupancyGrid::new(config).is_err());
}

#[test]
fn oversized_grid_is_rejected_before_allocation() {
    let config = GridConfig::with_bounds(-5e5, 5e5, -5e5, 5e5, 0.001);
    assert!(matches!(
        OccupancyGrid::new(config),
        Err(GridError::InvalidGeometry(_))
    ));
}
