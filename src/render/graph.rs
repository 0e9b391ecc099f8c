//! CPU rasterizer for the position graph.
//!
//! Produces tightly packed RGBA8 buffers that can be handed straight to
//! [`crate::export::export_frame`]. Graph coordinates have their origin at
//! the lower-left corner of the plot area with y pointing up; the plot is
//! surrounded by a fixed margin.

use crate::config::GraphParameters;
use crate::physics::calibration::CalibrationCurve;
use crate::physics::history::PositionHistory;

const BACKGROUND: [u8; 4] = [220, 220, 220, 255];
const AXIS: [u8; 4] = [0, 0, 0, 255];
const TRACE: [u8; 4] = [255, 0, 0, 255];
const EQUILIBRIUM: [u8; 4] = [0, 112, 255, 255];

/// Half-length of a tick mark in pixels
const TICK_HALF_LENGTH: i64 = 3;

/// Margin around the plot area in pixels
pub const DEFAULT_MARGIN: u32 = 30;

/// RGBA pixel buffer with y pointing down.
#[derive(Debug, Clone)]
struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    fn new(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixels = color
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    fn put(&mut self, x: i64, y: i64, color: [u8; 4]) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels[offset..offset + 4].copy_from_slice(&color);
    }
}

/// Renders the strip chart and calibration curve.
#[derive(Debug, Clone)]
pub struct GraphRenderer {
    graph: GraphParameters,
    margin: u32,
}

impl GraphRenderer {
    pub fn new(graph: &GraphParameters) -> Self {
        Self {
            graph: graph.clone(),
            margin: DEFAULT_MARGIN,
        }
    }

    pub fn with_margin(mut self, margin: u32) -> Self {
        self.margin = margin;
        self
    }

    /// Output image size in pixels.
    pub fn size(&self) -> (u32, u32) {
        (
            self.graph.width + 2 * self.margin,
            self.graph.height + 2 * self.margin,
        )
    }

    /// Image pixel for a point in graph coordinates.
    pub fn to_pixel(&self, graph_x: f64, graph_y: f64) -> (i64, i64) {
        let (_, height) = self.size();
        let x = self.margin as f64 + graph_x;
        let y = (height - self.margin) as f64 - graph_y;
        (x.round() as i64, y.round() as i64)
    }

    /// Render the position trace, scrolled by the history's offset.
    ///
    /// When an equilibrium position is given a dotted line is drawn at it.
    pub fn render_trace(&self, history: &PositionHistory, equilibrium: Option<f64>) -> Vec<u8> {
        let mut canvas = self.blank();
        self.draw_axes(&mut canvas, history.scroll_offset());

        if let Some(equilibrium) = equilibrium {
            self.draw_level(&mut canvas, equilibrium * self.graph.y_scale);
        }

        for (index, position) in history.iter().enumerate() {
            let graph_x = index as f64 * history.x_scale();
            self.plot(&mut canvas, graph_x, position * self.graph.y_scale, TRACE);
        }

        canvas.pixels
    }

    /// Render final and equilibrium positions against spring constant.
    ///
    /// The x axis spans zero to the largest spring constant in the curve.
    pub fn render_calibration(&self, curve: &CalibrationCurve) -> Vec<u8> {
        let mut canvas = self.blank();
        self.draw_axes(&mut canvas, 0.0);

        let max_constant = curve
            .samples()
            .iter()
            .map(|sample| sample.spring_constant)
            .fold(0.0, f64::max);
        if max_constant <= 0.0 {
            return canvas.pixels;
        }

        let x_per_unit = self.graph.width as f64 / max_constant;
        for sample in curve.samples() {
            let graph_x = sample.spring_constant * x_per_unit;
            if let Some(equilibrium) = sample.equilibrium_position {
                self.plot(&mut canvas, graph_x, equilibrium * self.graph.y_scale, EQUILIBRIUM);
            }
            self.plot(
                &mut canvas,
                graph_x,
                sample.final_position * self.graph.y_scale,
                TRACE,
            );
        }

        canvas.pixels
    }

    fn blank(&self) -> Canvas {
        let (width, height) = self.size();
        Canvas::new(width, height, BACKGROUND)
    }

    fn draw_axes(&self, canvas: &mut Canvas, scroll_offset: f64) {
        let width = self.graph.width as i64;
        let height = self.graph.height as i64;
        let (origin_x, origin_y) = self.to_pixel(0.0, 0.0);

        for x in 0..=width {
            canvas.put(origin_x + x, origin_y, AXIS);
        }
        for y in 0..=height {
            canvas.put(origin_x, origin_y - y, AXIS);
        }

        let spacing = self.graph.tick_spacing.max(1) as f64;
        let shift = scroll_offset.rem_euclid(spacing);
        let mut tick_x = spacing - shift;
        while tick_x <= width as f64 {
            let (x, y) = self.to_pixel(tick_x, 0.0);
            for dy in -TICK_HALF_LENGTH..=TICK_HALF_LENGTH {
                canvas.put(x, y + dy, AXIS);
            }
            tick_x += spacing;
        }

        let mut tick_y = spacing;
        while tick_y < height as f64 {
            let (x, y) = self.to_pixel(0.0, tick_y);
            for dx in -TICK_HALF_LENGTH..=TICK_HALF_LENGTH {
                canvas.put(x + dx, y, AXIS);
            }
            tick_y += spacing;
        }
    }

    fn draw_level(&self, canvas: &mut Canvas, graph_y: f64) {
        if !(0.0..=self.graph.height as f64).contains(&graph_y) {
            return;
        }
        for graph_x in (0..=self.graph.width).step_by(4) {
            let (x, y) = self.to_pixel(graph_x as f64, graph_y);
            canvas.put(x, y, EQUILIBRIUM);
            canvas.put(x + 1, y, EQUILIBRIUM);
        }
    }

    /// Draw a 2x2 point, skipping anything outside the plot area.
    fn plot(&self, canvas: &mut Canvas, graph_x: f64, graph_y: f64, color: [u8; 4]) {
        if !graph_x.is_finite() || !graph_y.is_finite() {
            return;
        }
        if graph_x < 0.0
            || graph_y < 0.0
            || graph_x > self.graph.width as f64
            || graph_y > self.graph.height as f64
        {
            return;
        }
        let (x, y) = self.to_pixel(graph_x, graph_y);
        canvas.put(x, y, color);
        canvas.put(x + 1, y, color);
        canvas.put(x, y - 1, color);
        canvas.put(x + 1, y - 1, color);
    }
}
