//! Validated construction of [`DetectionParams`] from calibration input.

use serde::Deserialize;

use crate::error::ConfigError;
use crate::tracker::{DetectionParams, TankQuad};
use crate::vision::{ChannelRange, normalize_kernel_size};

/// Builder for `DetectionParams`. Every parameter must be set; nothing is
/// defaulted.
#[derive(Debug, Clone, Default)]
pub struct DetectionParamsBuilder {
    hue_low_band: Option<(i64, i64)>,
    hue_high_band: Option<(i64, i64)>,
    saturation: Option<(i64, i64)>,
    value: Option<(i64, i64)>,
    blur_size: Option<i64>,
    erode_iterations: Option<i64>,
    dilate_iterations: Option<i64>,
    min_area: Option<i64>,
    max_area: Option<i64>,
}

impl DetectionParamsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// First hue interval, inclusive, in the 0..180 hue scale.
    pub fn hue_low_band(mut self, low: i64, high: i64) -> Self {
        self.hue_low_band = Some((low, high));
        self
    }

    /// Second hue interval, for colors wrapping around the hue origin.
    pub fn hue_high_band(mut self, low: i64, high: i64) -> Self {
        self.hue_high_band = Some((low, high));
        self
    }

    pub fn saturation(mut self, low: i64, high: i64) -> Self {
        self.saturation = Some((low, high));
        self
    }

    pub fn value(mut self, low: i64, high: i64) -> Self {
        self.value = Some((low, high));
        self
    }

    /// Blur kernel size; even sizes are rounded up and anything below 1 becomes 1.
    pub fn blur_size(mut self, size: i64) -> Self {
        self.blur_size = Some(size);
        self
    }

    pub fn erode_iterations(mut self, n: i64) -> Self {
        self.erode_iterations = Some(n);
        self
    }

    pub fn dilate_iterations(mut self, n: i64) -> Self {
        self.dilate_iterations = Some(n);
        self
    }

    /// Exclusive bounds on the blob area in pixels.
    pub fn area_bounds(mut self, min: i64, max: i64) -> Self {
        self.min_area = Some(min);
        self.max_area = Some(max);
        self
    }

    /// Build the final `DetectionParams`.
    pub fn build(self) -> Result<DetectionParams, ConfigError> {
        let min_area = non_negative("min_area", required("min_area", self.min_area)?)?;
        let max_area = non_negative("max_area", required("max_area", self.max_area)?)?;
        if min_area >= max_area {
            return Err(ConfigError::Invalid {
                field: "max_area",
                reason: format!("must exceed min_area ({min_area}), got {max_area}"),
            });
        }

        Ok(DetectionParams {
            hue_low_band: channel_range("hue_low_band", required("hue_low_band", self.hue_low_band)?)?,
            hue_high_band: channel_range("hue_high_band", required("hue_high_band", self.hue_high_band)?)?,
            saturation: channel_range("saturation", required("saturation", self.saturation)?)?,
            value: channel_range("value", required("value", self.value)?)?,
            blur_size: normalize_kernel_size(required("blur_size", self.blur_size)?),
            erode_iterations: non_negative("erode_iterations", required("erode_iterations", self.erode_iterations)?)?,
            dilate_iterations: non_negative(
                "dilate_iterations",
                required("dilate_iterations", self.dilate_iterations)?,
            )?,
            min_area,
            max_area,
        })
    }
}

fn required<T>(field: &'static str, value: Option<T>) -> Result<T, ConfigError> {
    value.ok_or(ConfigError::Missing(field))
}

fn non_negative(field: &'static str, value: i64) -> Result<u32, ConfigError> {
    u32::try_from(value).map_err(|_| ConfigError::Invalid {
        field,
        reason: format!("expected a non-negative integer, got {value}"),
    })
}

fn channel_range(field: &'static str, (low, high): (i64, i64)) -> Result<ChannelRange, ConfigError> {
    let channel = |v: i64| {
        u8::try_from(v).map_err(|_| ConfigError::Invalid {
            field,
            reason: format!("{v} is outside 0..=255"),
        })
    };
    Ok(ChannelRange::new(channel(low)?, channel(high)?))
}

/// Detection parameters as a calibration provider stores them, one scalar
/// per key. Absent keys surface as [`ConfigError::Missing`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawDetectionParams {
    pub h_low1: Option<i64>,
    pub h_high1: Option<i64>,
    pub h_low2: Option<i64>,
    pub h_high2: Option<i64>,
    pub s_low: Option<i64>,
    pub s_high: Option<i64>,
    pub v_low: Option<i64>,
    pub v_high: Option<i64>,
    pub blur_size: Option<i64>,
    pub erode_iterations: Option<i64>,
    pub dilate_iterations: Option<i64>,
    pub min_contour_area: Option<i64>,
    pub max_contour_area: Option<i64>,
}

impl TryFrom<RawDetectionParams> for DetectionParams {
    type Error = ConfigError;

    fn try_from(raw: RawDetectionParams) -> Result<Self, Self::Error> {
        DetectionParamsBuilder::new()
            .hue_low_band(required("h_low1", raw.h_low1)?, required("h_high1", raw.h_high1)?)
            .hue_high_band(required("h_low2", raw.h_low2)?, required("h_high2", raw.h_high2)?)
            .saturation(required("s_low", raw.s_low)?, required("s_high", raw.s_high)?)
            .value(required("v_low", raw.v_low)?, required("v_high", raw.v_high)?)
            .blur_size(required("blur_size", raw.blur_size)?)
            .erode_iterations(required("erode_iterations", raw.erode_iterations)?)
            .dilate_iterations(required("dilate_iterations", raw.dilate_iterations)?)
            .area_bounds(
                required("min_contour_area", raw.min_contour_area)?,
                required("max_contour_area", raw.max_contour_area)?,
            )
            .build()
    }
}

/// Tank corners as stored by the calibration tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RawTankArea {
    pub top_left_x: i32,
    pub top_left_y: i32,
    pub top_right_x: i32,
    pub top_right_y: i32,
    pub bottom_right_x: i32,
    pub bottom_right_y: i32,
    pub bottom_left_x: i32,
    pub bottom_left_y: i32,
}

impl RawTankArea {
    /// `None` when calibration left corners at the origin.
    pub fn into_quad(self) -> Option<TankQuad> {
        TankQuad::from_calibration([
            (self.top_left_x, self.top_left_y),
            (self.top_right_x, self.top_right_y),
            (self.bottom_right_x, self.bottom_right_y),
            (self.bottom_left_x, self.bottom_left_y),
        ])
    }
}
