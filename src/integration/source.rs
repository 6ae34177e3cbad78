//! Trait for frame acquisition backends.

use std::convert::Infallible;

use tracing::info;

use super::retry::RetryPolicy;
use crate::error::FrameAcquisitionError;
use crate::vision::Frame;

/// Trait for camera or video backends.
///
/// Implement this trait to feed frames from any capture device into the
/// tracking loop.
///
/// # Example
///
/// ```ignore
/// use colortrack_rs::{Frame, FrameSource};
///
/// struct MyCamera {
///     // Your device handle here
/// }
///
/// impl FrameSource for MyCamera {
///     type Error = std::io::Error;
///
///     fn resolution(&self) -> (u32, u32) {
///         (640, 480)
///     }
///
///     fn next_frame(&mut self) -> Result<Option<Frame>, Self::Error> {
///         // Block until the next frame is available
///         Ok(None)
///     }
/// }
/// ```
pub trait FrameSource {
    /// Error type for capture failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fixed (width, height) of every frame this source yields.
    fn resolution(&self) -> (u32, u32);

    /// Block until the next frame is available.
    ///
    /// # Returns
    /// `Ok(None)` once the stream has ended.
    fn next_frame(&mut self) -> Result<Option<Frame>, Self::Error>;
}

/// Adapts any iterator of frames into a `FrameSource`.
#[derive(Debug, Clone)]
pub struct FrameIter<I> {
    frames: I,
    resolution: (u32, u32),
}

impl<I: Iterator<Item = Frame>> FrameIter<I> {
    pub fn new(resolution: (u32, u32), frames: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            frames: frames.into_iter(),
            resolution,
        }
    }
}

impl<I: Iterator<Item = Frame>> FrameSource for FrameIter<I> {
    type Error = Infallible;

    fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, Self::Error> {
        Ok(self.frames.next())
    }
}

/// Open a frame source, retrying per `policy`.
pub fn open_with_retry<S, E, F>(policy: &RetryPolicy, mut open: F) -> Result<S, FrameAcquisitionError>
where
    S: FrameSource,
    E: std::error::Error + Send + Sync + 'static,
    F: FnMut() -> Result<S, E>,
{
    let source = policy
        .run("opening frame source", |_| open())
        .map_err(|exhausted| FrameAcquisitionError::Open {
            attempts: exhausted.attempts,
            source: Box::new(exhausted.last_error),
        })?;
    let (width, height) = source.resolution();
    info!(width, height, "frame source opened");
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_frame_iter_yields_then_ends() {
        let mut source = FrameIter::new((2, 2), vec![Frame::filled(2, 2, [1, 2, 3])]);
        assert_eq!(source.resolution(), (2, 2));
        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_open_with_retry_recovers() {
        let mut failures = 2;
        let source = open_with_retry(&RetryPolicy::new(3, Duration::ZERO), || {
            if failures > 0 {
                failures -= 1;
                Err(std::io::Error::other("device busy"))
            } else {
                Ok(FrameIter::new((4, 4), Vec::new()))
            }
        })
        .unwrap();
        assert_eq!(source.resolution(), (4, 4));
    }

    #[test]
    fn test_open_with_retry_gives_up() {
        let result = open_with_retry(&RetryPolicy::new(2, Duration::ZERO), || {
            Err::<FrameIter<std::vec::IntoIter<Frame>>, _>(std::io::Error::other("no camera"))
        });
        match result {
            Err(FrameAcquisitionError::Open { attempts, source }) => {
                assert_eq!(attempts, 2);
                assert_eq!(source.to_string(), "no camera");
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }
}
