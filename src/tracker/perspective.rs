//! Projective rectification of the tank quad.
//!
//! The quad is mapped onto an axis-aligned rectangle whose sides are the
//! longer of each pair of opposite quad edges. Positions are then expressed
//! as fractions of that rectangle. When the quad is missing or degenerate the
//! rectifier falls back to plain scaling by the frame size, keeping the same
//! `[0, 1]²` output contract.

use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use nalgebra::{Matrix3, SMatrix, SVector, Vector3};
use tracing::{info, warn};

use super::position::NormalizedPosition;
use super::quad::TankQuad;
use crate::error::GeometryError;
use crate::vision::Frame;

/// Quads enclosing less than this many square pixels are treated as degenerate.
const MIN_AREA: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Rectification {
    Projective(Matrix3<f64>),
    Identity,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveRectifier {
    rectification: Rectification,
    width: f64,
    height: f64,
}

impl PerspectiveRectifier {
    /// Rectifier for an optional quad, falling back to frame scaling when the
    /// quad is absent or cannot be rectified.
    pub fn new(quad: Option<&TankQuad>, frame_width: u32, frame_height: u32) -> Self {
        let Some(quad) = quad else {
            info!("no tank quad calibrated, normalizing by frame size");
            return Self::identity(frame_width, frame_height);
        };

        match Self::try_new(quad) {
            Ok(rectifier) => {
                info!(
                    width = rectifier.width,
                    height = rectifier.height,
                    "perspective rectification ready"
                );
                rectifier
            }
            Err(err) => {
                warn!(error = %err, ?quad, "degenerate tank quad, normalizing by frame size");
                Self::identity(frame_width, frame_height)
            }
        }
    }

    /// Strict construction: fails on zero-extent, zero-area or singular quads.
    pub fn try_new(quad: &TankQuad) -> Result<Self, GeometryError> {
        let [tl, tr, br, bl] = quad.corners;
        let width = distance(tr, tl).max(distance(br, bl));
        let height = distance(bl, tl).max(distance(br, tr));

        if width <= 0.0 {
            return Err(GeometryError::ZeroExtent { axis: "width" });
        }
        if height <= 0.0 {
            return Err(GeometryError::ZeroExtent { axis: "height" });
        }
        if quad.signed_area().abs() < MIN_AREA {
            return Err(GeometryError::ZeroArea);
        }

        let targets = [[0.0, 0.0], [width, 0.0], [width, height], [0.0, height]];
        let matrix = perspective_transform(&quad.corners, &targets).ok_or(GeometryError::Singular)?;

        Ok(Self {
            rectification: Rectification::Projective(matrix),
            width,
            height,
        })
    }

    /// Plain scaling by the frame dimensions.
    pub fn identity(frame_width: u32, frame_height: u32) -> Self {
        Self {
            rectification: Rectification::Identity,
            width: frame_width.max(1) as f64,
            height: frame_height.max(1) as f64,
        }
    }

    pub fn is_projective(&self) -> bool {
        matches!(self.rectification, Rectification::Projective(_))
    }

    /// Rectified width, or the frame width in the fallback case.
    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// The 3×3 transform, if true rectification is active.
    pub fn matrix(&self) -> Option<&Matrix3<f64>> {
        match &self.rectification {
            Rectification::Projective(m) => Some(m),
            Rectification::Identity => None,
        }
    }

    /// Map a pixel into rectified space.
    pub fn project(&self, point: [f64; 2]) -> [f64; 2] {
        match &self.rectification {
            Rectification::Identity => point,
            Rectification::Projective(m) => {
                let p = m * Vector3::new(point[0], point[1], 1.0);
                if p[2].abs() < 1e-15 {
                    return [f64::NAN, f64::NAN];
                }
                [p[0] / p[2], p[1] / p[2]]
            }
        }
    }

    /// Express a rectified-space point as fractions of the rectified size.
    pub fn normalize(&self, point: [f64; 2]) -> NormalizedPosition {
        NormalizedPosition::clamped((point[0] / self.width) as f32, (point[1] / self.height) as f32)
    }

    /// Resample `frame` into rectified space: the tank seen head-on, sized
    /// `width` x `height`. Pixels mapping outside the frame are black.
    ///
    /// `None` in the frame-scaling fallback, where there is nothing to correct.
    pub fn warp(&self, frame: &Frame) -> Option<Frame> {
        let Rectification::Projective(m) = &self.rectification else {
            return None;
        };
        let projection = Projection::from_matrix([
            m[(0, 0)] as f32,
            m[(0, 1)] as f32,
            m[(0, 2)] as f32,
            m[(1, 0)] as f32,
            m[(1, 1)] as f32,
            m[(1, 2)] as f32,
            m[(2, 0)] as f32,
            m[(2, 1)] as f32,
            m[(2, 2)] as f32,
        ])?;
        let mut out = RgbImage::new(
            self.width.round().max(1.0) as u32,
            self.height.round().max(1.0) as u32,
        );
        warp_into(
            &frame.to_rgb_image(),
            &projection,
            Interpolation::Nearest,
            Rgb([0, 0, 0]),
            &mut out,
        );
        Some(Frame::from_rgb_image(&out))
    }

    /// `project` then `normalize`.
    pub fn locate(&self, pixel: [f64; 2]) -> NormalizedPosition {
        self.normalize(self.project(pixel))
    }
}

fn distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    (a[0] - b[0]).hypot(a[1] - b[1])
}

/// Exact homography taking four source points onto four targets, with the
/// bottom-right entry fixed at 1. `None` if the system is singular.
fn perspective_transform(src: &[[f64; 2]; 4], dst: &[[f64; 2]; 4]) -> Option<Matrix3<f64>> {
    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for i in 0..4 {
        let [x, y] = src[i];
        let [u, v] = dst[i];

        a[(i, 0)] = x;
        a[(i, 1)] = y;
        a[(i, 2)] = 1.0;
        a[(i, 6)] = -x * u;
        a[(i, 7)] = -y * u;
        b[i] = u;

        a[(i + 4, 3)] = x;
        a[(i + 4, 4)] = y;
        a[(i + 4, 5)] = 1.0;
        a[(i + 4, 6)] = -x * v;
        a[(i + 4, 7)] = -y * v;
        b[i + 4] = v;
    }

    let h = a.lu().solve(&b)?;
    if h.iter().any(|v| !v.is_finite()) {
        return None;
    }

    Some(Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0))
}
