//! Mask denoising: Gaussian blur followed by erosion and dilation.

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::filter::separable_filter_equal;
use imageproc::morphology::{Mask as StructuringElement, grayscale_dilate, grayscale_erode};

use super::frame::Mask;

/// Radius of the 5×5 square structuring element used by [`erode`] and [`dilate`].
const STRUCTURING_RADIUS: u8 = 2;

/// Clamp a configured blur kernel size to the nearest valid odd size (minimum 1).
pub fn normalize_kernel_size(size: i64) -> usize {
    if size < 1 {
        1
    } else if size % 2 == 0 {
        size as usize + 1
    } else {
        size as usize
    }
}

/// Parameters of the fixed blur → erode → dilate chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MorphologyParams {
    /// Odd blur kernel size, see [`normalize_kernel_size`].
    pub blur_size: usize,
    pub erode_iterations: u32,
    pub dilate_iterations: u32,
}

/// Run the denoising chain. Blurring first keeps single-pixel speckle from
/// surviving erosion and being grown back by dilation.
pub fn refine(mask: &Mask, params: &MorphologyParams) -> Mask {
    let blurred = gaussian_blur(mask, params.blur_size);
    let eroded = erode(&blurred, params.erode_iterations);
    dilate(&eroded, params.dilate_iterations)
}

/// Separable Gaussian blur with the sigma conventionally derived from the
/// kernel size. Border pixels are replicated.
pub fn gaussian_blur(mask: &Mask, ksize: usize) -> Mask {
    if ksize <= 1 || mask.is_empty() {
        return mask.clone();
    }
    let (h, w) = mask.dim();
    let image: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_fn(w as u32, h as u32, |x, y| Luma([mask[[y as usize, x as usize]] as f32]));
    let blurred = separable_filter_equal(&image, &gaussian_kernel(ksize));
    Mask::from_shape_fn((h, w), |(y, x)| {
        blurred.get_pixel(x as u32, y as u32)[0].round().clamp(0.0, 255.0) as u8
    })
}

/// Grayscale erosion (local minimum) with a 5×5 square, repeated `iterations` times.
/// Neighbours outside the mask are ignored.
pub fn erode(mask: &Mask, iterations: u32) -> Mask {
    rank_filter(mask, iterations, grayscale_erode)
}

/// Grayscale dilation (local maximum) with a 5×5 square, repeated `iterations` times.
pub fn dilate(mask: &Mask, iterations: u32) -> Mask {
    rank_filter(mask, iterations, grayscale_dilate)
}

fn rank_filter(
    mask: &Mask,
    iterations: u32,
    op: fn(&GrayImage, &StructuringElement) -> GrayImage,
) -> Mask {
    if iterations == 0 || mask.is_empty() {
        return mask.clone();
    }
    let element = StructuringElement::square(STRUCTURING_RADIUS);
    let mut image = to_gray(mask);
    for _ in 0..iterations {
        image = op(&image, &element);
    }
    from_gray(&image)
}

fn to_gray(mask: &Mask) -> GrayImage {
    let (h, w) = mask.dim();
    GrayImage::from_fn(w as u32, h as u32, |x, y| Luma([mask[[y as usize, x as usize]]]))
}

fn from_gray(image: &GrayImage) -> Mask {
    let (w, h) = image.dimensions();
    Mask::from_shape_fn((h as usize, w as usize), |(y, x)| image.get_pixel(x as u32, y as u32)[0])
}

fn gaussian_kernel(ksize: usize) -> Vec<f32> {
    let sigma = 0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let radius = (ksize / 2) as f32;
    let mut kernel: Vec<f32> = (0..ksize)
        .map(|i| {
            let d = i as f32 - radius;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= sum);
    kernel
}
