//! The calibrated tank quadrilateral.

use crate::vision::Mask;

/// Four pixel-space corners bounding the region of interest, ordered
/// top-left, top-right, bottom-right, bottom-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TankQuad {
    pub corners: [[f64; 2]; 4],
}

impl TankQuad {
    pub fn new(top_left: [f64; 2], top_right: [f64; 2], bottom_right: [f64; 2], bottom_left: [f64; 2]) -> Self {
        Self {
            corners: [top_left, top_right, bottom_right, bottom_left],
        }
    }

    /// Build a quad from calibration output, where a corner left at `(0, 0)`
    /// on any but the top-left position means calibration never happened.
    pub fn from_calibration(corners: [(i32, i32); 4]) -> Option<Self> {
        if corners[1..].contains(&(0, 0)) {
            return None;
        }
        let [tl, tr, br, bl] = corners.map(|(x, y)| [x as f64, y as f64]);
        Some(Self::new(tl, tr, br, bl))
    }

    /// The whole frame as a quad.
    pub fn full_frame(width: u32, height: u32) -> Self {
        let (w, h) = (width as f64, height as f64);
        Self::new([0.0, 0.0], [w, 0.0], [w, h], [0.0, h])
    }

    pub fn top_left(&self) -> [f64; 2] {
        self.corners[0]
    }

    pub fn top_right(&self) -> [f64; 2] {
        self.corners[1]
    }

    pub fn bottom_right(&self) -> [f64; 2] {
        self.corners[2]
    }

    pub fn bottom_left(&self) -> [f64; 2] {
        self.corners[3]
    }

    /// Shoelace area; positive for clockwise corners in image coordinates.
    pub fn signed_area(&self) -> f64 {
        self.edges()
            .map(|(a, b)| a[0] * b[1] - b[0] * a[1])
            .sum::<f64>()
            / 2.0
    }

    /// Whether the point lies inside the quad or on its boundary.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let mut inside = false;
        for (a, b) in self.edges() {
            if on_segment([x, y], a, b) {
                return true;
            }
            if (a[1] > y) != (b[1] > y) {
                let cross_x = a[0] + (y - a[1]) * (b[0] - a[0]) / (b[1] - a[1]);
                if x < cross_x {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Mask of the pixels covered by the quad, boundary included.
    pub fn region_mask(&self, width: u32, height: u32) -> Mask {
        Mask::from_shape_fn((height as usize, width as usize), |(y, x)| {
            if self.contains(x as f64, y as f64) { 255 } else { 0 }
        })
    }

    fn edges(&self) -> impl Iterator<Item = ([f64; 2], [f64; 2])> + '_ {
        (0..4).map(move |i| (self.corners[i], self.corners[(i + 1) % 4]))
    }
}

fn on_segment(p: [f64; 2], a: [f64; 2], b: [f64; 2]) -> bool {
    let cross = (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0]);
    cross.abs() < 1e-9
        && p[0] >= a[0].min(b[0])
        && p[0] <= a[0].max(b[0])
        && p[1] >= a[1].min(b[1])
        && p[1] <= a[1].max(b[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skewed() -> TankQuad {
        TankQuad::new([10.0, 10.0], [90.0, 20.0], [80.0, 90.0], [5.0, 70.0])
    }

    #[test]
    fn test_from_calibration_sentinel() {
        assert!(TankQuad::from_calibration([(0, 0), (100, 0), (100, 80), (0, 80)]).is_some());
        assert!(TankQuad::from_calibration([(5, 5), (0, 0), (100, 80), (0, 80)]).is_none());
        assert!(TankQuad::from_calibration([(0, 0); 4]).is_none());
    }

    #[test]
    fn test_signed_area() {
        assert_eq!(TankQuad::full_frame(10, 20).signed_area(), 200.0);
        let point = TankQuad::new([3.0, 3.0], [3.0, 3.0], [3.0, 3.0], [3.0, 3.0]);
        assert_eq!(point.signed_area(), 0.0);
    }

    #[test]
    fn test_contains() {
        let quad = skewed();
        assert!(quad.contains(50.0, 50.0));
        assert!(quad.contains(10.0, 10.0));
        assert!(quad.contains(50.0, 15.0));
        assert!(!quad.contains(50.0, 5.0));
        assert!(!quad.contains(95.0, 50.0));
    }

    #[test]
    fn test_region_mask_full_frame_covers_everything() {
        let mask = TankQuad::full_frame(8, 6).region_mask(8, 6);
        assert!(mask.iter().all(|&m| m == 255));
    }

    #[test]
    fn test_region_mask_excludes_outside() {
        let quad = TankQuad::new([2.0, 2.0], [5.0, 2.0], [5.0, 4.0], [2.0, 4.0]);
        let mask = quad.region_mask(8, 8);
        assert_eq!(mask.iter().filter(|&&m| m != 0).count(), 4 * 3);
        assert_eq!(mask[[3, 3]], 255);
        assert_eq!(mask[[1, 3]], 0);
    }
}
