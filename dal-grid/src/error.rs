//! Error types for the occupancy grid

/// Result type alias
pub type Result<T> = std::result::Result<T, GridError>;

/// Grid construction errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    /// Bounds, resolution or sensor range cannot describe a grid
    #[error("Invalid grid geometry: {0}")]
    InvalidGeometry(String),
}
