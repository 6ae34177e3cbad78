//! Optional debug side channel: per-tick callbacks and frame annotation.

use image::imageops::{self, FilterType};

use crate::tracker::{PerspectiveRectifier, TankQuad, TickOutcome, TickReport};
use crate::vision::{Frame, Mask};

const QUAD_COLOR: [u8; 3] = [255, 255, 0];
const ACCEPTED_COLOR: [u8; 3] = [0, 255, 0];
const REJECTED_COLOR: [u8; 3] = [255, 165, 0];
const CENTROID_COLOR: [u8; 3] = [255, 0, 0];

/// Rectified views taller than this are scaled down for display.
pub const RECTIFIED_VIEW_MAX_HEIGHT: u32 = 300;

/// Receives every processed frame for human inspection.
///
/// Not part of the tracking contract; implementations must not assume they
/// see every frame if the loop is stopped early.
pub trait DebugSink {
    fn on_tick(&mut self, frame: &Frame, mask: &Mask, report: &TickReport);
}

impl<F> DebugSink for F
where
    F: FnMut(&Frame, &Mask, &TickReport),
{
    fn on_tick(&mut self, frame: &Frame, mask: &Mask, report: &TickReport) {
        self(frame, mask, report)
    }
}

/// Copy of `frame` with the mask blended into the red channel at half strength.
pub fn overlay_mask(frame: &Frame, mask: &Mask) -> Frame {
    let mut out = frame.clone();
    for y in 0..frame.height() {
        for x in 0..frame.width() {
            let m = mask[[y as usize, x as usize]];
            if m != 0 {
                let [r, g, b] = frame.pixel(x, y);
                out.put_pixel(x as i64, y as i64, [r.saturating_add(m / 2), g, b]);
            }
        }
    }
    out
}

/// Copy of `frame` with the tank outline, the candidate box (green when
/// accepted, orange when rejected) and its center drawn on top.
pub fn annotate(frame: &Frame, quad: Option<&TankQuad>, report: &TickReport) -> Frame {
    let mut out = frame.clone();

    if let Some(quad) = quad {
        for i in 0..4 {
            let a = quad.corners[i];
            let b = quad.corners[(i + 1) % 4];
            draw_line(&mut out, point(a), point(b), QUAD_COLOR);
        }
    }

    if let Some(candidate) = report.candidate {
        let color = match report.outcome {
            TickOutcome::Rejected { .. } => REJECTED_COLOR,
            _ => ACCEPTED_COLOR,
        };
        let [x1, y1, x2, y2] = candidate.bbox.to_tlbr().map(i64::from);
        draw_line(&mut out, (x1, y1), (x2, y1), color);
        draw_line(&mut out, (x2, y1), (x2, y2), color);
        draw_line(&mut out, (x2, y2), (x1, y2), color);
        draw_line(&mut out, (x1, y2), (x1, y1), color);

        let (cx, cy) = candidate.centroid();
        fill_disc(&mut out, (cx as i64, cy as i64), 3, CENTROID_COLOR);
    }

    out
}

/// Head-on view of the tank for display next to the annotated frame,
/// scaled down to at most [`RECTIFIED_VIEW_MAX_HEIGHT`] rows.
///
/// `None` when no tank quad is being rectified.
pub fn rectified_view(frame: &Frame, rectifier: &PerspectiveRectifier) -> Option<Frame> {
    let view = rectifier.warp(frame)?;
    if view.height() <= RECTIFIED_VIEW_MAX_HEIGHT {
        return Some(view);
    }
    let scale = RECTIFIED_VIEW_MAX_HEIGHT as f64 / view.height() as f64;
    let width = ((view.width() as f64 * scale).round() as u32).max(1);
    let resized = imageops::resize(
        &view.to_rgb_image(),
        width,
        RECTIFIED_VIEW_MAX_HEIGHT,
        FilterType::Triangle,
    );
    Some(Frame::from_rgb_image(&resized))
}

fn point(p: [f64; 2]) -> (i64, i64) {
    (p[0].round() as i64, p[1].round() as i64)
}

/// Bresenham line, clipped to the frame.
fn draw_line(frame: &mut Frame, (x0, y0): (i64, i64), (x1, y1): (i64, i64), color: [u8; 3]) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let (mut x, mut y, mut err) = (x0, y0, dx + dy);
    loop {
        frame.put_pixel(x, y, color);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

fn fill_disc(frame: &mut Frame, (cx, cy): (i64, i64), radius: i64, color: [u8; 3]) {
    for y in cy - radius..=cy + radius {
        for x in cx - radius..=cx + radius {
            if (x - cx).pow(2) + (y - cy).pow(2) <= radius * radius {
                frame.put_pixel(x, y, color);
            }
        }
    }
}
