//! Bresenham ray casting for occupancy grid updates.
//!
//! Integer-only line drawing between grid cells:
//!
//! ```text
//! From (0,0) to (7,3):
//!
//!     3 │        ●
//!     2 │     ●●
//!     1 │  ●●
//!     0 ●●
//!       └──────────
//!        0 1 2 3 4 5 6 7
//! ```
//!
//! The start cell comes first and the end cell last, with no gaps.

use crate::core::GridCoord;

/// Cells on the 8-connected line between two grid cells, both inclusive.
///
/// Uses the symmetric error term `e = dx - dy`, so no octant swapping is
/// needed.
pub(crate) struct BresenhamLine {
    cell: GridCoord,
    end: GridCoord,
    dx: i32,
    dy: i32,
    step_col: i32,
    step_row: i32,
    err: i32,
    finished: bool,
}

impl BresenhamLine {
    pub(crate) fn new(start: GridCoord, end: GridCoord) -> Self {
        let dx = (end.col - start.col).abs();
        let dy = -(end.row - start.row).abs();
        Self {
            cell: start,
            end,
            dx,
            dy,
            step_col: if start.col < end.col { 1 } else { -1 },
            step_row: if start.row < end.row { 1 } else { -1 },
            err: dx + dy,
            finished: false,
        }
    }
}

impl Iterator for BresenhamLine {
    type Item = GridCoord;

    fn next(&mut self) -> Option<GridCoord> {
        if self.finished {
            return None;
        }
        let here = self.cell;
        if here == self.end {
            self.finished = true;
            return Some(here);
        }

        let e2 = 2 * self.err;
        if e2 >= self.dy {
            self.err += self.dy;
            self.cell.col += self.step_col;
        }
        if e2 <= self.dx {
            self.err += self.dx;
            self.cell.row += self.step_row;
        }
        Some(here)
    }
}
