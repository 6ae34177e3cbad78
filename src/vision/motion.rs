//! Adaptive per-pixel background model.
//!
//! Each pixel keeps a running RGB mean and one isotropic variance. A pixel is
//! foreground when its squared distance to the mean exceeds
//! `var_threshold * variance`. The learning rate starts at 1 and settles at
//! `1 / history`, so the first frames are absorbed quickly and the output is
//! only meaningful after a warm-up burst.

use ndarray::{Array2, Array3};

use super::frame::{Frame, Mask};

/// Background model tunables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionConfig {
    /// Number of frames after which the learning rate stops decreasing.
    pub history: u32,
    /// Squared-distance threshold in units of the pixel variance.
    pub var_threshold: f32,
    /// Variance assigned to every pixel on the first frame.
    pub var_init: f32,
    pub var_min: f32,
    pub var_max: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            history: 200,
            var_threshold: 25.0,
            var_init: 15.0,
            var_min: 4.0,
            var_max: 75.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BackgroundModel {
    config: MotionConfig,
    mean: Array3<f32>,
    variance: Array2<f32>,
    frames_seen: u32,
}

impl BackgroundModel {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            config,
            mean: Array3::zeros((0, 0, 3)),
            variance: Array2::zeros((0, 0)),
            frames_seen: 0,
        }
    }

    /// Number of frames the model has learned from.
    pub fn frames_seen(&self) -> u32 {
        self.frames_seen
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    /// Forget everything learned so far.
    pub fn reset(&mut self) {
        self.frames_seen = 0;
    }

    /// Classify the frame against the learned background, then learn from it.
    ///
    /// The first frame (or the first after a resolution change) seeds the
    /// model and yields an empty mask.
    pub fn apply(&mut self, frame: &Frame) -> Mask {
        let (h, w) = (frame.height() as usize, frame.width() as usize);
        if self.frames_seen == 0 || self.variance.dim() != (h, w) {
            self.seed(frame);
            return Mask::zeros((h, w));
        }

        self.frames_seen = self.frames_seen.saturating_add(1);
        let alpha = 1.0 / self.frames_seen.min(self.config.history.max(1)) as f32;
        let MotionConfig {
            var_threshold,
            var_min,
            var_max,
            ..
        } = self.config;

        let pixels = frame.as_array();
        Mask::from_shape_fn((h, w), |(y, x)| {
            let mut diff = [0.0f32; 3];
            let mut dist2 = 0.0;
            for (c, d) in diff.iter_mut().enumerate() {
                *d = pixels[[y, x, c]] as f32 - self.mean[[y, x, c]];
                dist2 += *d * *d;
            }

            let var = self.variance[[y, x]];
            let foreground = dist2 > var_threshold * var;

            for (c, d) in diff.iter().enumerate() {
                self.mean[[y, x, c]] += alpha * d;
            }
            self.variance[[y, x]] = (var + alpha * (dist2 - var)).clamp(var_min, var_max);

            if foreground { 255 } else { 0 }
        })
    }

    fn seed(&mut self, frame: &Frame) {
        let (h, w) = (frame.height() as usize, frame.width() as usize);
        self.mean = frame.as_array().mapv(|v| v as f32);
        self.variance = Array2::from_elem((h, w), self.config.var_init);
        self.frames_seen = 1;
    }
}

impl Default for BackgroundModel {
    fn default() -> Self {
        Self::new(MotionConfig::default())
    }
}
