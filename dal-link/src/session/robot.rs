//! RobotIo trait definition

use crate::navigation::SteeringIntent;
use crate::wire::ImageFrame;
use dal_grid::Pose2D;

/// Device layer of one robot: sensors in, drivetrain commands out.
///
/// The session calls the sample methods at most once per tick and
/// [`RobotIo::apply`] exactly once per tick, always after sampling.
pub trait RobotIo {
    /// Current pose with the raw (uncorrected) heading
    fn pose(&mut self) -> Pose2D;

    /// Range readings, `None` without a range sensor
    fn range_scan(&mut self) -> Option<Vec<f32>>;

    /// Camera frame, `None` without a camera or when no frame is ready
    fn image(&mut self) -> Option<ImageFrame>;

    /// Drive with this command until the next tick
    fn apply(&mut self, intent: SteeringIntent);

    /// Whether `range_scan` can return data
    fn has_range_sensor(&self) -> bool;

    /// Whether `image` can return frames
    fn has_image_sensor(&self) -> bool;
}
