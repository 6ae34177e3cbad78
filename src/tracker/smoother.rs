//! Weighted moving average over recently accepted positions.

use std::collections::VecDeque;

use super::position::NormalizedPosition;

/// Keeps at most `window` accepted positions and averages them with weights
/// rising linearly from 0.5 (oldest) to 1.0 (newest).
#[derive(Debug, Clone)]
pub struct Smoother {
    history: VecDeque<NormalizedPosition>,
    window: usize,
}

impl Smoother {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            history: VecDeque::with_capacity(window),
            window,
        }
    }

    /// Record an accepted position and return the smoothed one.
    pub fn push(&mut self, position: NormalizedPosition) -> NormalizedPosition {
        self.history.push_back(position);
        if self.history.len() > self.window {
            self.history.pop_front();
        }
        self.smoothed().unwrap_or(position)
    }

    /// Weighted average of the current history, `None` while empty.
    pub fn smoothed(&self) -> Option<NormalizedPosition> {
        let n = self.history.len();
        if n == 0 {
            return None;
        }

        let (mut sx, mut sy, mut sw) = (0.0f64, 0.0f64, 0.0f64);
        for (i, p) in self.history.iter().enumerate() {
            let w = weight(i, n);
            sx += w * p.x as f64;
            sy += w * p.y as f64;
            sw += w;
        }
        Some(NormalizedPosition::new((sx / sw) as f32, (sy / sw) as f32))
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}

/// `i`-th of `n` evenly spaced weights from 0.5 to 1.0.
fn weight(i: usize, n: usize) -> f64 {
    if n < 2 {
        0.5
    } else {
        0.5 + 0.5 * i as f64 / (n - 1) as f64
    }
}
