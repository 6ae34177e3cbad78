//! HSV color segmentation.

use serde::{Deserialize, Serialize};

use super::frame::{Frame, Mask};

/// A pixel in the 8-bit HSV convention used by most camera tooling:
/// hue in `0..180` (degrees halved), saturation and value in `0..=255`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl Hsv {
    pub fn new(h: u8, s: u8, v: u8) -> Self {
        Self { h, s, v }
    }

    /// Convert an RGB pixel.
    pub fn from_rgb([r, g, b]: [u8; 3]) -> Self {
        let (rf, gf, bf) = (r as f32, g as f32, b as f32);
        let max = rf.max(gf).max(bf);
        let min = rf.min(gf).min(bf);
        let delta = max - min;

        let s = if max > 0.0 { 255.0 * delta / max } else { 0.0 };

        let mut h = if delta == 0.0 {
            0.0
        } else if max == rf {
            60.0 * (gf - bf) / delta
        } else if max == gf {
            120.0 + 60.0 * (bf - rf) / delta
        } else {
            240.0 + 60.0 * (rf - gf) / delta
        };
        if h < 0.0 {
            h += 360.0;
        }

        Self {
            h: ((h / 2.0).round() as u16 % 180) as u8,
            s: s.round() as u8,
            v: max as u8,
        }
    }
}

/// Inclusive `[low, high]` interval on one 8-bit channel.
///
/// `low > high` is allowed and matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRange {
    pub low: u8,
    pub high: u8,
}

impl ChannelRange {
    pub const FULL: ChannelRange = ChannelRange { low: 0, high: 255 };

    pub fn new(low: u8, high: u8) -> Self {
        Self { low, high }
    }

    #[inline]
    pub fn contains(&self, value: u8) -> bool {
        self.low <= value && value <= self.high
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.low > self.high
    }
}

/// Color specification: two hue intervals (red straddles the hue origin)
/// sharing one saturation and one value interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorSpec {
    pub hue: [ChannelRange; 2],
    pub saturation: ChannelRange,
    pub value: ChannelRange,
}

impl ColorSpec {
    pub fn matches(&self, hsv: Hsv) -> bool {
        (self.hue[0].contains(hsv.h) || self.hue[1].contains(hsv.h))
            && self.saturation.contains(hsv.s)
            && self.value.contains(hsv.v)
    }

    /// Mask of the frame pixels matching this specification.
    pub fn mask(&self, frame: &Frame) -> Mask {
        let (w, h) = (frame.width() as usize, frame.height() as usize);
        Mask::from_shape_fn((h, w), |(y, x)| {
            if self.matches(Hsv::from_rgb(frame.pixel(x as u32, y as u32))) {
                255
            } else {
                0
            }
        })
    }
}
