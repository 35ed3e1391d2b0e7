//! Sliding-window mean over recent target samples.
//!
//! Each axis keeps its own bounded window. The window is not cleared when
//! the target is lost, so a reacquired target is averaged with the samples
//! recorded before the gap.

use std::collections::VecDeque;

use pantilt_models::{SmoothedPosition, TargetSample};

/// Bounded moving-average filter for the x and y coordinates.
#[derive(Debug, Clone)]
pub struct SmoothingFilter {
    capacity: usize,
    xs: VecDeque<f64>,
    ys: VecDeque<f64>,
}

impl SmoothingFilter {
    /// Create a filter averaging over the last `capacity` samples.
    ///
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            xs: VecDeque::with_capacity(capacity),
            ys: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a sample, evicting the oldest one once the window is full.
    pub fn push(&mut self, sample: TargetSample) {
        push_bounded(&mut self.xs, sample.x, self.capacity);
        push_bounded(&mut self.ys, sample.y, self.capacity);
    }

    /// Mean of the current window, or `None` before the first sample.
    pub fn value(&self) -> Option<SmoothedPosition> {
        if self.xs.is_empty() {
            return None;
        }
        Some(SmoothedPosition::new(mean(&self.xs), mean(&self.ys)))
    }

    /// Number of samples currently held.
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

fn push_bounded(window: &mut VecDeque<f64>, value: f64, capacity: usize) {
    if window.len() == capacity {
        window.pop_front();
    }
    window.push_back(value);
}

fn mean(values: &VecDeque<f64>) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
