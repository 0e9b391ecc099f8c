//! Bounded position history backing the strip chart.

use std::collections::VecDeque;

use crate::config::GraphParameters;

/// One recorded point of the trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistorySample {
    /// Simulated time when the sample was taken (s)
    pub time: f64,
    /// Bar position (mm)
    pub position: f64,
}

/// FIFO window of bar positions.
///
/// Once the window is full each new sample evicts the oldest one and the
/// chart scrolls left by one sample width.
#[derive(Debug, Clone)]
pub struct PositionHistory {
    samples: VecDeque<HistorySample>,
    capacity: usize,
    /// Pixels per sample
    x_scale: f64,
    /// Horizontal scroll of the chart in pixels
    scroll_offset: f64,
}

impl PositionHistory {
    /// Create an empty history holding at most `capacity` samples.
    pub fn new(capacity: usize, x_scale: f64) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            x_scale,
            scroll_offset: 0.0,
        }
    }

    /// Create a history sized to fill the plot width.
    pub fn for_graph(graph: &GraphParameters) -> Self {
        Self::new(graph.history_capacity(), graph.x_scale)
    }

    /// Append a sample, evicting the oldest when the window overflows.
    ///
    /// The time is stored with the position, so the trace stays correct
    /// when the time step is edited mid-run.
    pub fn push(&mut self, time: f64, position: f64) {
        self.samples.push_back(HistorySample { time, position });
        if self.samples.len() > self.capacity {
            self.samples.pop_front();
            self.scroll_offset += self.x_scale;
        }
    }

    /// Drop all samples and rewind the scroll offset.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.scroll_offset = 0.0;
    }

    /// Positions from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|sample| sample.position)
    }

    /// Timed samples from oldest to newest.
    pub fn samples(&self) -> impl Iterator<Item = HistorySample> + '_ {
        self.samples.iter().copied()
    }

    /// Most recent position.
    pub fn latest(&self) -> Option<f64> {
        self.samples.back().map(|sample| sample.position)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn x_scale(&self) -> f64 {
        self.x_scale
    }

    /// Total scroll in pixels since the last clear.
    pub fn scroll_offset(&self) -> f64 {
        self.scroll_offset
    }

    /// Number of samples evicted since the last clear.
    pub fn evicted(&self) -> usize {
        if self.x_scale <= 0.0 {
            return 0;
        }
        (self.scroll_offset / self.x_scale).round() as usize
    }
}

impl Default for PositionHistory {
    fn default() -> Self {
        Self::for_graph(&GraphParameters::default())
    }
}
