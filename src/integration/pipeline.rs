//! TrackingLoop for driving a frame source through the tracker.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{error, info};

use super::debug::DebugSink;
use super::source::FrameSource;
use crate::error::{FrameAcquisitionError, TrackError};
use crate::tracker::{
    DetectionParams, PositionReader, TankQuad, TickOutcome, TickReport, Tracker, TrackerConfig,
};

/// Cooperative stop request, honored between ticks.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    requested: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}

/// Per-outcome tick counts of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub warmup: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub missed: u64,
}

impl RunSummary {
    fn record(&mut self, outcome: &TickOutcome) {
        self.ticks += 1;
        match outcome {
            TickOutcome::WarmingUp => self.warmup += 1,
            TickOutcome::NoDetection => self.missed += 1,
            TickOutcome::Rejected { .. } => self.rejected += 1,
            TickOutcome::Accepted { .. } => self.accepted += 1,
        }
    }
}

/// Owns a frame source and the tracker and runs ticks strictly in sequence.
///
/// Frame acquisition is the only blocking call in a tick. Position queries go
/// through [`PositionReader`]s and never wait on the loop.
pub struct TrackingLoop<S: FrameSource> {
    source: S,
    tracker: Tracker,
    shutdown: ShutdownHandle,
    sink: Option<Box<dyn DebugSink + Send>>,
    summary: RunSummary,
}

impl<S: FrameSource> TrackingLoop<S> {
    /// Create a tracking loop sized to the source's resolution.
    pub fn new(
        source: S,
        params: DetectionParams,
        quad: Option<TankQuad>,
        config: TrackerConfig,
    ) -> Self {
        let tracker = Tracker::new(params, quad, source.resolution(), config);
        Self {
            source,
            tracker,
            shutdown: ShutdownHandle::new(),
            sink: None,
            summary: RunSummary::default(),
        }
    }

    /// Attach a debug sink that sees every processed frame.
    pub fn with_debug_sink(mut self, sink: impl DebugSink + Send + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Handle for requesting a stop from another thread.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// A read-only handle on the published position.
    pub fn reader(&self) -> PositionReader {
        self.tracker.reader()
    }

    /// Acquire and process a single frame.
    pub fn step(&mut self) -> Result<TickReport, TrackError> {
        let frame = self
            .source
            .next_frame()
            .map_err(|e| FrameAcquisitionError::Source(Box::new(e)))?
            .ok_or(FrameAcquisitionError::EndOfStream)?;

        let report = self.tracker.process(&frame)?;
        self.summary.record(&report.outcome);

        if let Some(sink) = self.sink.as_mut() {
            sink.on_tick(&frame, self.tracker.fused_mask(), &report);
        }
        Ok(report)
    }

    /// Run until shutdown is requested or the source fails.
    ///
    /// Returns the run summary on a requested shutdown. End of stream and
    /// capture errors are fatal and returned as errors.
    pub fn run(&mut self) -> Result<RunSummary, TrackError> {
        info!("tracking loop started");
        loop {
            if self.shutdown.is_requested() {
                info!(ticks = self.summary.ticks, "tracking loop stopped");
                return Ok(self.summary);
            }
            if let Err(err) = self.step() {
                error!(error = %err, ticks = self.summary.ticks, "tracking loop terminated");
                return Err(err);
            }
        }
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integration::{DetectionParamsBuilder, FrameIter};
    use crate::tracker::NormalizedPosition;
    use crate::vision::{Frame, Mask};
    use std::sync::Mutex;

    fn params() -> DetectionParams {
        DetectionParamsBuilder::new()
            .hue_low_band(0, 10)
            .hue_high_band(160, 180)
            .saturation(100, 255)
            .value(100, 255)
            .blur_size(7)
            .erode_iterations(1)
            .dilate_iterations(2)
            .area_bounds(100, 5000)
            .build()
            .unwrap()
    }

    fn background(n: usize) -> Vec<Frame> {
        vec![Frame::filled(64, 64, [30, 30, 30]); n]
    }

    #[derive(Debug, thiserror::Error)]
    #[error("sensor unplugged")]
    struct Unplugged;

    struct FailingSource {
        left: u32,
    }

    impl FrameSource for FailingSource {
        type Error = Unplugged;

        fn resolution(&self) -> (u32, u32) {
            (64, 64)
        }

        fn next_frame(&mut self) -> Result<Option<Frame>, Self::Error> {
            if self.left == 0 {
                return Err(Unplugged);
            }
            self.left -= 1;
            Ok(Some(Frame::filled(64, 64, [30, 30, 30])))
        }
    }

    #[test]
    fn test_end_of_stream_is_fatal() {
        let source = FrameIter::new((64, 64), background(5));
        let mut tracking = TrackingLoop::new(source, params(), None, TrackerConfig::default());
        let err = tracking.run().unwrap_err();
        assert!(matches!(err, TrackError::FrameAcquisition(FrameAcquisitionError::EndOfStream)));
        assert_eq!(tracking.summary().ticks, 5);
        assert_eq!(tracking.summary().warmup, 5);
    }

    #[test]
    fn test_source_error_is_fatal() {
        let mut tracking =
            TrackingLoop::new(FailingSource { left: 2 }, params(), None, TrackerConfig::default());
        let err = tracking.run().unwrap_err();
        match err {
            TrackError::FrameAcquisition(FrameAcquisitionError::Source(source)) => {
                assert_eq!(source.to_string(), "sensor unplugged");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(tracking.summary().ticks, 2);
    }

    #[test]
    fn test_shutdown_between_ticks() {
        let source = FrameIter::new((64, 64), background(100));
        let mut tracking = TrackingLoop::new(source, params(), None, TrackerConfig::default());
        let shutdown = tracking.shutdown_handle();

        tracking.step().unwrap();
        shutdown.request();
        let summary = tracking.run().unwrap();
        assert_eq!(summary.ticks, 1);
        assert_eq!(tracking.reader().latest(), NormalizedPosition::CENTER);
    }

    #[test]
    fn test_debug_sink_sees_every_tick() {
        let seen = std::sync::Arc::new(Mutex::new(Vec::new()));
        let sink_seen = std::sync::Arc::clone(&seen);
        let source = FrameIter::new((64, 64), background(3));
        let mut tracking = TrackingLoop::new(source, params(), None, TrackerConfig::default())
            .with_debug_sink(move |_: &Frame, mask: &Mask, report: &TickReport| {
                sink_seen.lock().unwrap().push((report.tick, mask.dim()));
            });

        let _ = tracking.run();
        assert_eq!(*seen.lock().unwrap(), vec![(1, (64, 64)), (2, (64, 64)), (3, (64, 64))]);
    }

    #[test]
    fn test_summary_counts_outcomes() {
        let mut summary = RunSummary::default();
        summary.record(&TickOutcome::WarmingUp);
        summary.record(&TickOutcome::NoDetection);
        summary.record(&TickOutcome::Rejected {
            position: NormalizedPosition::CENTER,
            jump: 0.3,
        });
        assert_eq!(
            summary,
            RunSummary {
                ticks: 3,
                warmup: 1,
                accepted: 0,
                rejected: 1,
                missed: 1,
            }
        );
    }
}
