//! Integration with the outside world: frame sources, calibration input,
//! the tracking loop and the debug side channel.

mod builder;
mod debug;
mod pipeline;
mod retry;
mod source;

pub use builder::{DetectionParamsBuilder, RawDetectionParams, RawTankArea};
pub use debug::{DebugSink, RECTIFIED_VIEW_MAX_HEIGHT, annotate, overlay_mask, rectified_view};
pub use pipeline::{RunSummary, ShutdownHandle, TrackingLoop};
pub use retry::{RetryExhausted, RetryPolicy};
pub use source::{FrameIter, FrameSource, open_with_retry};
