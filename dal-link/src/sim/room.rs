//! Rectangular room used by the simulated robot.

/// Axis-aligned walls.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Room {
    /// West wall
    pub x_min: f32,
    /// East wall
    pub x_max: f32,
    /// South wall
    pub y_min: f32,
    /// North wall
    pub y_max: f32,
}

impl Room {
    /// Room between the given walls
    pub fn new(x_min: f32, x_max: f32, y_min: f32, y_max: f32) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Whether a disc of `radius` at (x, y) fits between the walls
    pub fn fits(&self, x: f32, y: f32, radius: f32) -> bool {
        x - radius >= self.x_min
            && x + radius <= self.x_max
            && y - radius >= self.y_min
            && y + radius <= self.y_max
    }

    /// Distance from (ox, oy) along `angle` to the first wall.
    ///
    /// Returns `max_range` if no wall is closer. The origin is assumed to be
    /// inside the room.
    pub fn ray_cast(&self, ox: f32, oy: f32, angle: f32, max_range: f32) -> f32 {
        let (dy, dx) = angle.sin_cos();
        let mut nearest = max_range;

        if dx > 1e-9 {
            nearest = nearest.min((self.x_max - ox) / dx);
        } else if dx < -1e-9 {
            nearest = nearest.min((self.x_min - ox) / dx);
        }
        if dy > 1e-9 {
            nearest = nearest.min((self.y_max - oy) / dy);
        } else if dy < -1e-9 {
            nearest = nearest.min((self.y_min - oy) / dy);
        }

        nearest.max(0.0)
    }
}
