//! Error types shared across the crate.

use thiserror::Error;

/// Startup configuration problems. Always fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing detection parameter `{0}`")]
    Missing(&'static str),
    #[error("invalid detection parameter `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Tank quad geometry that cannot be rectified.
///
/// Never surfaced as a failure: the rectifier logs it and falls back to
/// identity scaling by the frame dimensions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("tank quad has zero {axis}")]
    ZeroExtent { axis: &'static str },
    #[error("tank quad encloses no area (corners are collinear)")]
    ZeroArea,
    #[error("perspective transform is singular")]
    Singular,
}

/// The frame source stopped yielding usable frames.
#[derive(Debug, Error)]
pub enum FrameAcquisitionError {
    #[error("frame source reached end of stream")]
    EndOfStream,
    #[error("frame source failed: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("could not open frame source after {attempts} attempt(s): {source}")]
    Open {
        attempts: u32,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("frame is {got_width}x{got_height}, source was opened at {width}x{height}")]
    ResolutionChanged {
        width: u32,
        height: u32,
        got_width: u32,
        got_height: u32,
    },
}

/// Errors that terminate tracking.
#[derive(Debug, Error)]
pub enum TrackError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    #[error(transparent)]
    FrameAcquisition(#[from] FrameAcquisitionError),
}
