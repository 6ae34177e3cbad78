//! Connected-component extraction and candidate selection.

use super::frame::Mask;
use super::rect::Rect;

/// One blob found in the fused mask during a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionCandidate {
    pub bbox: Rect,
    /// Pixel count of the component.
    pub area: u32,
}

impl DetectionCandidate {
    pub fn new(bbox: Rect, area: u32) -> Self {
        Self { bbox, area }
    }

    /// Bounding box center in pixel coordinates.
    pub fn centroid(&self) -> (u32, u32) {
        self.bbox.center()
    }
}

/// Exclusive `(min, max)` area window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AreaBounds {
    pub min: u32,
    pub max: u32,
}

impl AreaBounds {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn admits(&self, area: u32) -> bool {
        self.min < area && area < self.max
    }
}

/// All 8-connected components of non-zero pixels, in raster order of their
/// first pixel.
pub fn find_components(mask: &Mask) -> Vec<DetectionCandidate> {
    let (h, w) = mask.dim();
    let mut visited = ndarray::Array2::<bool>::from_elem((h, w), false);
    let mut stack = Vec::new();
    let mut components = Vec::new();

    for ((y, x), &value) in mask.indexed_iter() {
        if value == 0 || visited[[y, x]] {
            continue;
        }

        visited[[y, x]] = true;
        stack.push((y, x));
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (x, y, x, y);
        let mut area = 0u32;

        while let Some((cy, cx)) = stack.pop() {
            area += 1;
            min_x = min_x.min(cx);
            max_x = max_x.max(cx);
            min_y = min_y.min(cy);
            max_y = max_y.max(cy);

            for ny in cy.saturating_sub(1)..=(cy + 1).min(h - 1) {
                for nx in cx.saturating_sub(1)..=(cx + 1).min(w - 1) {
                    if mask[[ny, nx]] != 0 && !visited[[ny, nx]] {
                        visited[[ny, nx]] = true;
                        stack.push((ny, nx));
                    }
                }
            }
        }

        components.push(DetectionCandidate::new(
            Rect::from_corners(min_x as u32, min_y as u32, max_x as u32, max_y as u32),
            area,
        ));
    }

    components
}

/// Keep candidates strictly inside `bounds` and return the largest.
///
/// Ties keep the earliest candidate.
pub fn select_largest<I>(candidates: I, bounds: AreaBounds) -> Option<DetectionCandidate>
where
    I: IntoIterator<Item = DetectionCandidate>,
{
    candidates
        .into_iter()
        .filter(|c| bounds.admits(c.area))
        .fold(None, |best: Option<DetectionCandidate>, c| match best {
            Some(b) if b.area >= c.area => Some(b),
            _ => Some(c),
        })
}

/// Picks the single most plausible blob out of a refined mask.
#[derive(Debug, Clone, Copy)]
pub struct ContourExtractor {
    bounds: AreaBounds,
}

impl ContourExtractor {
    pub fn new(bounds: AreaBounds) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> AreaBounds {
        self.bounds
    }

    /// `None` means no detection this tick.
    pub fn extract(&self, mask: &Mask) -> Option<DetectionCandidate> {
        select_largest(find_components(mask), self.bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_area(area: u32) -> DetectionCandidate {
        DetectionCandidate::new(Rect::new(area, 0, 1, 1), area)
    }

    #[test]
    fn test_select_largest_within_bounds() {
        let candidates = [50, 500, 9000, 15000].map(with_area);
        let bounds = AreaBounds::new(300, 10000);

        let kept: Vec<u32> = candidates
            .iter()
            .filter(|c| bounds.admits(c.area))
            .map(|c| c.area)
            .collect();
        assert_eq!(kept, vec![500, 9000]);

        let best = select_largest(candidates, bounds).unwrap();
        assert_eq!(best.area, 9000);
    }

    #[test]
    fn test_bounds_are_exclusive() {
        let bounds = AreaBounds::new(300, 10000);
        assert!(!bounds.admits(300));
        assert!(!bounds.admits(10000));
        assert!(select_largest([with_area(300), with_area(10000)], bounds).is_none());
    }

    #[test]
    fn test_find_components_eight_connected() {
        let mut mask = Mask::zeros((10, 10));
        // Diagonal pair joins into one component.
        mask[[1, 1]] = 255;
        mask[[2, 2]] = 255;
        // Separate 3x2 block.
        for y in 5..7 {
            for x in 4..7 {
                mask[[y, x]] = 255;
            }
        }

        let comps = find_components(&mask);
        assert_eq!(comps.len(), 2);
        assert_eq!(comps[0].area, 2);
        assert_eq!(comps[0].bbox, Rect::new(1, 1, 2, 2));
        assert_eq!(comps[1].area, 6);
        assert_eq!(comps[1].bbox, Rect::new(4, 5, 3, 2));
        assert_eq!(comps[1].centroid(), (5, 6));
    }

    #[test]
    fn test_extract_empty_mask_is_no_detection() {
        let extractor = ContourExtractor::new(AreaBounds::new(0, 100));
        assert!(extractor.extract(&Mask::zeros((4, 4))).is_none());
    }

    #[test]
    fn test_extract_picks_largest_blob() {
        let mut mask = Mask::zeros((20, 20));
        for y in 0..3 {
            for x in 0..3 {
                mask[[y, x]] = 255;
            }
        }
        for y in 10..16 {
            for x in 10..15 {
                mask[[y, x]] = 255;
            }
        }
        let extractor = ContourExtractor::new(AreaBounds::new(4, 100));
        let best = extractor.extract(&mask).unwrap();
        assert_eq!(best.area, 30);
        assert_eq!(best.centroid(), (12, 13));
    }
}
