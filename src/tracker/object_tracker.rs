//! The per-tick detection and tracking pipeline.

use tracing::{debug, info, warn};

use super::config::{DetectionParams, TrackerConfig};
use super::gate::{GateVerdict, ValidityGate};
use super::perspective::PerspectiveRectifier;
use super::position::{NormalizedPosition, PositionReader, PositionStore};
use super::quad::TankQuad;
use super::smoother::Smoother;
use crate::error::FrameAcquisitionError;
use crate::vision::{
    BackgroundModel, ColorSpec, ContourExtractor, DetectionCandidate, Frame, Mask,
    MorphologyParams, fuse, refine,
};

/// Shortest background warm-up that yields a usable motion mask.
pub const MIN_WARMUP_FRAMES: u32 = 20;

/// What happened to the target during one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// The background model is still learning; nothing was detected or published.
    WarmingUp,
    /// No blob survived filtering.
    NoDetection,
    /// A blob was found but jumped too far from the last accepted position.
    Rejected {
        position: NormalizedPosition,
        jump: f32,
    },
    /// The blob was accepted and the smoothed position published.
    Accepted {
        position: NormalizedPosition,
        smoothed: NormalizedPosition,
        jump: f32,
    },
}

/// Summary of one processed frame, for logging and debug views.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// 1-based index of the processed frame.
    pub tick: u64,
    pub outcome: TickOutcome,
    /// The selected blob in pixel coordinates, if any.
    pub candidate: Option<DetectionCandidate>,
    /// Gate confidence after this tick.
    pub confidence: u32,
}

impl TickReport {
    /// Position published this tick, if any.
    pub fn published(&self) -> Option<NormalizedPosition> {
        match self.outcome {
            TickOutcome::Accepted { smoothed, .. } => Some(smoothed),
            _ => None,
        }
    }
}

/// Owns all tracking state for one camera at a fixed resolution.
///
/// The tracker is the only writer of its [`PositionStore`]; hand out
/// [`PositionReader`]s to anything that needs the position.
pub struct Tracker {
    params: DetectionParams,
    config: TrackerConfig,
    resolution: (u32, u32),
    color: ColorSpec,
    morphology: MorphologyParams,
    extractor: ContourExtractor,
    background: BackgroundModel,
    quad: Option<TankQuad>,
    region: Option<Mask>,
    rectifier: PerspectiveRectifier,
    gate: ValidityGate,
    smoother: Smoother,
    store: PositionStore,
    fused: Mask,
    tick: u64,
}

impl Tracker {
    /// Build the tracker for frames of `resolution` (width, height).
    ///
    /// A quad that cannot be rectified is ignored for both rectification and
    /// region masking.
    pub fn new(
        params: DetectionParams,
        quad: Option<TankQuad>,
        resolution: (u32, u32),
        mut config: TrackerConfig,
    ) -> Self {
        let (width, height) = resolution;
        if config.warmup_frames < MIN_WARMUP_FRAMES {
            warn!(
                requested = config.warmup_frames,
                used = MIN_WARMUP_FRAMES,
                "background warm-up too short, raising it"
            );
            config.warmup_frames = MIN_WARMUP_FRAMES;
        }

        let rectifier = PerspectiveRectifier::new(quad.as_ref(), width, height);
        let region = quad
            .filter(|_| rectifier.is_projective())
            .map(|q| q.region_mask(width, height));

        info!(
            width,
            height,
            hue_low = ?params.hue_low_band,
            hue_high = ?params.hue_high_band,
            saturation = ?params.saturation,
            value = ?params.value,
            min_area = params.min_area,
            max_area = params.max_area,
            rectified_width = rectifier.width(),
            rectified_height = rectifier.height(),
            "tracker configured"
        );

        Self {
            color: params.color_spec(),
            morphology: params.morphology(),
            extractor: ContourExtractor::new(params.area_bounds()),
            background: BackgroundModel::new(config.motion),
            gate: ValidityGate::new(config.gate),
            smoother: Smoother::new(config.smoothing_window),
            store: PositionStore::default(),
            fused: Mask::zeros((height as usize, width as usize)),
            params,
            config,
            resolution,
            quad,
            region,
            rectifier,
            tick: 0,
        }
    }

    /// Run one frame through the pipeline and publish the result.
    ///
    /// Fails only when the frame does not match the configured resolution.
    pub fn process(&mut self, frame: &Frame) -> Result<TickReport, FrameAcquisitionError> {
        let (width, height) = self.resolution;
        if (frame.width(), frame.height()) != self.resolution {
            return Err(FrameAcquisitionError::ResolutionChanged {
                width,
                height,
                got_width: frame.width(),
                got_height: frame.height(),
            });
        }
        self.tick += 1;

        let masked;
        let frame = match &self.region {
            Some(region) => {
                masked = frame.masked(region);
                &masked
            }
            None => frame,
        };

        let motion = self.background.apply(frame);
        if self.background.frames_seen() <= self.config.warmup_frames {
            self.fused.fill(0);
            return Ok(self.report(TickOutcome::WarmingUp, None));
        }

        let color = self.color.mask(frame);
        self.fused = refine(&fuse(&color, &motion), &self.morphology);

        let Some(candidate) = self.extractor.extract(&self.fused) else {
            self.gate.miss();
            let report = self.report(TickOutcome::NoDetection, None);
            debug!(tick = report.tick, confidence = report.confidence, "no detection");
            return Ok(report);
        };

        let (cx, cy) = candidate.centroid();
        let position = self.rectifier.locate([cx as f64, cy as f64]);

        let outcome = match self.gate.observe(position) {
            GateVerdict::Accepted { jump } => {
                let smoothed = self.smoother.push(position);
                self.store.publish(smoothed);
                TickOutcome::Accepted {
                    position,
                    smoothed,
                    jump,
                }
            }
            GateVerdict::Rejected { jump } => TickOutcome::Rejected { position, jump },
        };

        let report = self.report(outcome, Some(candidate));
        debug!(
            tick = report.tick,
            area = candidate.area,
            x = position.x,
            y = position.y,
            confidence = report.confidence,
            accepted = report.published().is_some(),
            "detection"
        );
        Ok(report)
    }

    fn report(&self, outcome: TickOutcome, candidate: Option<DetectionCandidate>) -> TickReport {
        TickReport {
            tick: self.tick,
            outcome,
            candidate,
            confidence: self.gate.confidence(),
        }
    }

    /// A read-only handle on the published position.
    pub fn reader(&self) -> PositionReader {
        self.store.reader()
    }

    pub fn latest(&self) -> NormalizedPosition {
        self.store.latest()
    }

    /// The refined fused mask of the last tick (all zero while warming up).
    pub fn fused_mask(&self) -> &Mask {
        &self.fused
    }

    /// Whether the next frame will still be spent on background warm-up.
    pub fn is_warming_up(&self) -> bool {
        self.background.frames_seen() < self.config.warmup_frames
    }

    pub fn confidence(&self) -> u32 {
        self.gate.confidence()
    }

    pub fn last_accepted(&self) -> NormalizedPosition {
        self.gate.last_accepted()
    }

    pub fn quad(&self) -> Option<&TankQuad> {
        self.quad.as_ref()
    }

    pub fn rectifier(&self) -> &PerspectiveRectifier {
        &self.rectifier
    }

    pub fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    pub fn params(&self) -> &DetectionParams {
        &self.params
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::ChannelRange;

    const SIZE: u32 = 120;
    const BACKGROUND: [u8; 3] = [30, 30, 30];
    const RED: [u8; 3] = [200, 20, 20];

    fn params() -> DetectionParams {
        DetectionParams {
            hue_low_band: ChannelRange::new(0, 10),
            hue_high_band: ChannelRange::new(160, 180),
            saturation: ChannelRange::new(100, 255),
            value: ChannelRange::new(100, 255),
            blur_size: 7,
            erode_iterations: 1,
            dilate_iterations: 2,
            min_area: 100,
            max_area: 5000,
        }
    }

    fn tracker(quad: Option<TankQuad>) -> Tracker {
        Tracker::new(params(), quad, (SIZE, SIZE), TrackerConfig::default())
    }

    fn warm_up(tracker: &mut Tracker) {
        let frame = Frame::filled(SIZE, SIZE, BACKGROUND);
        for _ in 0..tracker.config().warmup_frames {
            let report = tracker.process(&frame).unwrap();
            assert_eq!(report.outcome, TickOutcome::WarmingUp);
        }
        assert!(!tracker.is_warming_up());
    }

    fn blob_at(cx: i64, cy: i64) -> Frame {
        let mut frame = Frame::filled(SIZE, SIZE, BACKGROUND);
        frame.fill_rect(cx - 8, cy - 8, 16, 16, RED);
        frame
    }

    #[test]
    fn test_warmup_is_raised_to_minimum() {
        let config = TrackerConfig {
            warmup_frames: 3,
            ..TrackerConfig::default()
        };
        let tracker = Tracker::new(params(), None, (SIZE, SIZE), config);
        assert_eq!(tracker.config().warmup_frames, MIN_WARMUP_FRAMES);
    }

    #[test]
    fn test_warmup_publishes_nothing_even_with_target() {
        let mut tracker = tracker(None);
        for i in 0..30 {
            let report = tracker.process(&blob_at(20 + i, 60)).unwrap();
            assert_eq!(report.outcome, TickOutcome::WarmingUp);
            assert!(report.published().is_none());
        }
        assert_eq!(tracker.latest(), NormalizedPosition::CENTER);
    }

    #[test]
    fn test_moving_blob_near_center_is_accepted() {
        let mut tracker = tracker(None);
        warm_up(&mut tracker);

        let report = tracker.process(&blob_at(60, 60)).unwrap();
        match report.outcome {
            TickOutcome::Accepted { position, smoothed, .. } => {
                assert!((position.x - 0.5).abs() < 0.01 && (position.y - 0.5).abs() < 0.01);
                assert_eq!(smoothed, position);
            }
            other => panic!("expected acceptance, got {other:?}"),
        }
        assert_eq!(report.confidence, 1);
        assert_eq!(tracker.latest(), report.published().unwrap());
        assert_eq!(report.candidate.unwrap().centroid(), (60, 60));
    }

    #[test]
    fn test_far_blob_without_confidence_is_rejected() {
        let mut tracker = tracker(None);
        warm_up(&mut tracker);

        let report = tracker.process(&blob_at(15, 15)).unwrap();
        assert!(matches!(report.outcome, TickOutcome::Rejected { jump, .. } if jump > 0.2));
        assert_eq!(report.confidence, 0);
        assert_eq!(tracker.latest(), NormalizedPosition::CENTER);
    }

    #[test]
    fn test_empty_scene_decays_confidence() {
        let mut tracker = tracker(None);
        warm_up(&mut tracker);

        tracker.process(&blob_at(60, 60)).unwrap();
        tracker.process(&blob_at(64, 60)).unwrap();
        assert_eq!(tracker.confidence(), 2);

        let report = tracker.process(&Frame::filled(SIZE, SIZE, BACKGROUND)).unwrap();
        assert_eq!(report.outcome, TickOutcome::NoDetection);
        assert_eq!(report.confidence, 1);
        assert!(tracker.fused_mask().iter().all(|&m| m == 0));
    }

    #[test]
    fn test_region_outside_quad_is_ignored() {
        let quad = TankQuad::new([40.0, 40.0], [119.0, 40.0], [119.0, 119.0], [40.0, 119.0]);
        let mut tracker = tracker(Some(quad));
        assert!(tracker.rectifier().is_projective());
        warm_up(&mut tracker);

        let report = tracker.process(&blob_at(15, 15)).unwrap();
        assert_eq!(report.outcome, TickOutcome::NoDetection);
    }

    #[test]
    fn test_degenerate_quad_does_not_mask_frame() {
        let quad = TankQuad::new([5.0, 5.0], [5.0, 5.0], [5.0, 5.0], [5.0, 5.0]);
        let mut tracker = tracker(Some(quad));
        assert!(!tracker.rectifier().is_projective());
        warm_up(&mut tracker);

        let report = tracker.process(&blob_at(60, 60)).unwrap();
        assert!(report.published().is_some());
    }

    #[test]
    fn test_resolution_mismatch_is_fatal() {
        let mut tracker = tracker(None);
        let err = tracker.process(&Frame::filled(10, 10, BACKGROUND)).unwrap_err();
        assert!(matches!(err, FrameAcquisitionError::ResolutionChanged { got_width: 10, .. }));
    }
}
