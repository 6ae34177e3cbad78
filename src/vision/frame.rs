//! RGB frames and binary masks.

use image::{Rgb, RgbImage};
use ndarray::{Array2, Array3, ShapeError, Zip};

/// Single-channel mask, `0` for background and `255` for set pixels.
///
/// Indexed `[[row, col]]`, i.e. `[[y, x]]`.
pub type Mask = Array2<u8>;

/// An RGB raster of shape `(height, width, 3)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pixels: Array3<u8>,
}

impl Frame {
    /// Wrap an `(height, width, 3)` array. Returns `None` for any other channel count.
    pub fn from_array(pixels: Array3<u8>) -> Option<Self> {
        if pixels.dim().2 == 3 {
            Some(Self { pixels })
        } else {
            None
        }
    }

    /// Build a frame from packed RGB8 bytes in row-major order.
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Result<Self, ShapeError> {
        let pixels = Array3::from_shape_vec((height as usize, width as usize, 3), data)?;
        Ok(Self { pixels })
    }

    /// A frame filled with one color.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels = Array3::from_shape_fn((height as usize, width as usize, 3), |(_, _, c)| rgb[c]);
        Self { pixels }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.pixels.dim().1 as u32
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.pixels.dim().0 as u32
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let (x, y) = (x as usize, y as usize);
        [
            self.pixels[[y, x, 0]],
            self.pixels[[y, x, 1]],
            self.pixels[[y, x, 2]],
        ]
    }

    /// Set one pixel; coordinates outside the frame are ignored.
    #[inline]
    pub fn put_pixel(&mut self, x: i64, y: i64, rgb: [u8; 3]) {
        if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        for (c, value) in rgb.into_iter().enumerate() {
            self.pixels[[y, x, c]] = value;
        }
    }

    /// Paint a solid rectangle, clipped to the frame.
    pub fn fill_rect(&mut self, x: i64, y: i64, width: u32, height: u32, rgb: [u8; 3]) {
        for yy in y..y + height as i64 {
            for xx in x..x + width as i64 {
                self.put_pixel(xx, yy, rgb);
            }
        }
    }

    /// Copy of the frame with every pixel outside `region` set to black.
    pub fn masked(&self, region: &Mask) -> Frame {
        let mut pixels = self.pixels.clone();
        for ((y, x, _), value) in pixels.indexed_iter_mut() {
            if region[[y, x]] == 0 {
                *value = 0;
            }
        }
        Frame { pixels }
    }

    /// Copy into an `image` buffer for the `image`/`imageproc` operations.
    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width(), self.height(), |x, y| Rgb(self.pixel(x, y)))
    }

    pub fn from_rgb_image(image: &RgbImage) -> Self {
        let (w, h) = image.dimensions();
        let pixels = Array3::from_shape_fn((h as usize, w as usize, 3), |(y, x, c)| {
            image.get_pixel(x as u32, y as u32)[c]
        });
        Self { pixels }
    }

    pub fn as_array(&self) -> &Array3<u8> {
        &self.pixels
    }

    pub fn into_array(self) -> Array3<u8> {
        self.pixels
    }
}

/// Logical AND of two masks: set only where both inputs are set.
pub fn fuse(color: &Mask, motion: &Mask) -> Mask {
    let mut out = Mask::zeros(color.raw_dim());
    Zip::from(&mut out)
        .and(color)
        .and(motion)
        .for_each(|o, &c, &m| *o = if c != 0 && m != 0 { 255 } else { 0 });
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgb_shape() {
        let frame = Frame::from_rgb(4, 2, vec![7; 4 * 2 * 3]).unwrap();
        assert_eq!(frame.width(), 4);
        assert_eq!(frame.height(), 2);
        assert!(Frame::from_rgb(4, 2, vec![0; 5]).is_err());
        assert!(Frame::from_array(Array3::zeros((2, 2, 4))).is_none());
    }

    #[test]
    fn test_fill_rect_clips() {
        let mut frame = Frame::filled(10, 10, [0, 0, 0]);
        frame.fill_rect(-2, 8, 4, 4, [255, 0, 0]);
        assert_eq!(frame.pixel(0, 9), [255, 0, 0]);
        assert_eq!(frame.pixel(1, 8), [255, 0, 0]);
        assert_eq!(frame.pixel(2, 9), [0, 0, 0]);
        assert_eq!(frame.pixel(0, 7), [0, 0, 0]);
    }

    #[test]
    fn test_rgb_image_conversion_keeps_layout() {
        let mut frame = Frame::filled(5, 3, [1, 2, 3]);
        frame.put_pixel(4, 1, [9, 8, 7]);
        let image = frame.to_rgb_image();
        assert_eq!(image.dimensions(), (5, 3));
        assert_eq!(image.get_pixel(4, 1), &Rgb([9, 8, 7]));
        assert_eq!(Frame::from_rgb_image(&image), frame);
    }

    #[test]
    fn test_masked_blacks_out_region() {
        let frame = Frame::filled(3, 1, [9, 9, 9]);
        let region = Mask::from_shape_vec((1, 3), vec![255, 0, 255]).unwrap();
        let masked = frame.masked(&region);
        assert_eq!(masked.pixel(0, 0), [9, 9, 9]);
        assert_eq!(masked.pixel(1, 0), [0, 0, 0]);
        assert_eq!(masked.pixel(2, 0), [9, 9, 9]);
    }

    #[test]
    fn test_fuse_is_and() {
        let color = Mask::from_shape_vec((1, 4), vec![255, 255, 0, 0]).unwrap();
        let motion = Mask::from_shape_vec((1, 4), vec![255, 0, 255, 0]).unwrap();
        let fused: Vec<u8> = fuse(&color, &motion).iter().copied().collect();
        assert_eq!(fused, vec![255, 0, 0, 0]);
    }
}
