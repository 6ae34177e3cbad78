/// Axis-aligned pixel bounding box in TLWH form.
///
/// Width and height count pixels, so a single pixel at `(x, y)` is
/// `Rect { x, y, width: 1, height: 1 }`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    /// Top-left x coordinate
    pub x: u32,
    /// Top-left y coordinate
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    #[inline]
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a Rect spanning the inclusive pixel corners `(x1, y1)` and `(x2, y2)`.
    #[inline]
    pub fn from_corners(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self {
            x: x1.min(x2),
            y: y1.min(y2),
            width: x1.abs_diff(x2) + 1,
            height: y1.abs_diff(y2) + 1,
        }
    }

    /// Convert to TLBR format with an inclusive bottom-right pixel.
    #[inline]
    pub fn to_tlbr(&self) -> [u32; 4] {
        [
            self.x,
            self.y,
            (self.x + self.width).saturating_sub(1),
            (self.y + self.height).saturating_sub(1),
        ]
    }

    /// Center pixel, halving the extent with integer division.
    #[inline]
    pub fn center(&self) -> (u32, u32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }
}
