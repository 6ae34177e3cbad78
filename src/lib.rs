//! Single-object tracker fusing color and motion segmentation.
//!
//! A [`Tracker`] turns camera frames into a perspective-corrected, normalized
//! position of one colored moving object. The position is published through a
//! lock-free [`PositionStore`] so query paths never contend with the tracking
//! loop.

pub mod error;
pub mod integration;
pub mod tracker;
pub mod vision;

pub use error::{ConfigError, FrameAcquisitionError, GeometryError, TrackError};
pub use integration::{
    DebugSink, DetectionParamsBuilder, FrameIter, FrameSource, RetryPolicy, RunSummary,
    ShutdownHandle, TrackingLoop,
};
pub use tracker::{
    DetectionParams, GatePolicy, NormalizedPosition, PositionReader, PositionStore, TankQuad,
    TickOutcome, TickReport, Tracker, TrackerConfig,
};
pub use vision::{Frame, Mask};
