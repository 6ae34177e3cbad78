//! Tracker configuration.
//!
//! [`DetectionParams`] come from calibration and have no defaults; build them
//! with [`DetectionParamsBuilder`](crate::integration::DetectionParamsBuilder).
//! [`TrackerConfig`] holds the pipeline's own tunables and defaults to the
//! values the tracker was tuned with.

use crate::vision::{AreaBounds, ChannelRange, ColorSpec, MorphologyParams, MotionConfig};

use super::gate::GatePolicy;

/// Calibrated detection parameters. Every field is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionParams {
    pub hue_low_band: ChannelRange,
    pub hue_high_band: ChannelRange,
    pub saturation: ChannelRange,
    pub value: ChannelRange,
    /// Already normalized to an odd size of at least 1.
    pub blur_size: usize,
    pub erode_iterations: u32,
    pub dilate_iterations: u32,
    pub min_area: u32,
    pub max_area: u32,
}

impl DetectionParams {
    pub fn color_spec(&self) -> ColorSpec {
        ColorSpec {
            hue: [self.hue_low_band, self.hue_high_band],
            saturation: self.saturation,
            value: self.value,
        }
    }

    pub fn morphology(&self) -> MorphologyParams {
        MorphologyParams {
            blur_size: self.blur_size,
            erode_iterations: self.erode_iterations,
            dilate_iterations: self.dilate_iterations,
        }
    }

    pub fn area_bounds(&self) -> AreaBounds {
        AreaBounds::new(self.min_area, self.max_area)
    }
}

/// Configuration for the [`Tracker`](super::Tracker).
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub gate: GatePolicy,
    pub motion: MotionConfig,
    /// Number of accepted positions averaged by the smoother.
    pub smoothing_window: usize,
    /// Frames fed to the background model before detections are trusted.
    pub warmup_frames: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            gate: GatePolicy::default(),
            motion: MotionConfig::default(),
            smoothing_window: 5,
            warmup_frames: 30,
        }
    }
}
