//! Per-frame context: everything one frame of processing touches, in one place.
//!
//! The driver owns a [`Session`] and calls [`Session::step`] with whatever the detector found,
//! then [`Session::render`] with the camera frame. Tests do the same with synthetic hands and a
//! fake solver.

use crate::canvas::Canvas;
use crate::config::{Config, PanelConfig};
use crate::draw::{draw_text_scaled, GLYPH_ADVANCE};
use crate::error::Error;
use crate::gesture::{classify, Gesture, GestureThresholds};
use crate::landmark::Keypoint;
use crate::solver::Solver;
use crate::types::FrameBuffer;

const PANEL_BACKGROUND: u32 = 0x00FF_FFFF;
const PANEL_TEXT: u32 = 0x0000_0000;

pub struct Session<S: Solver> {
    canvas: Canvas,
    thresholds: GestureThresholds,
    solver: S,
}

impl<S: Solver> Session<S> {
    /// A session for frames of `width` x `height`.
    pub fn new(width: usize, height: usize, config: &Config, solver: S) -> Self {
        Self {
            canvas: Canvas::with_brush(width, height, config.brush),
            thresholds: config.gesture,
            solver,
        }
    }

    /// Classify this frame's hand (if any) and feed the result to the canvas.
    pub fn step(&mut self, hand: Option<&[Keypoint]>) -> Gesture {
        let gesture = classify(hand, &self.thresholds);
        self.canvas.apply(gesture, &mut self.solver);
        gesture
    }

    /// Same as the thumb-up gesture.
    pub fn reset(&mut self) {
        self.canvas.reset();
    }

    /// Solve right now, regardless of the current pose.
    pub fn solve_now(&mut self) {
        self.canvas.solve(&mut self.solver);
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Camera + canvas, with the answer panel attached on the right.
    pub fn render(&self, camera: &FrameBuffer, panel: &PanelConfig) -> Result<FrameBuffer, Error> {
        let combined = self.canvas.combined_frame(camera)?;
        let lines = self.canvas.result_lines(wrap_width(panel));
        Ok(attach_panel(&combined, &lines, panel))
    }
}

/// How many characters fit on one panel line.
pub fn wrap_width(panel: &PanelConfig) -> usize {
    let usable = panel.width as i32 - 2 * panel.margin;
    let per_char = GLYPH_ADVANCE * panel.text_scale.max(1);
    (usable / per_char).max(1) as usize
}

/// `frame` with a white panel of `panel.width` appended on the right, `lines` written into it.
pub fn attach_panel(frame: &FrameBuffer, lines: &[String], panel: &PanelConfig) -> FrameBuffer {
    let width = frame.width + panel.width;
    let mut out = FrameBuffer::filled(width, frame.height, PANEL_BACKGROUND);
    for (dst, src) in out
        .pixels
        .chunks_exact_mut(width)
        .zip(frame.pixels.chunks_exact(frame.width.max(1)))
    {
        dst[..frame.width].copy_from_slice(src);
    }

    let x = frame.width as i32 + panel.margin;
    for (i, line) in lines.iter().enumerate() {
        let y = panel.top + i as i32 * panel.line_height;
        draw_text_scaled(&mut out, x, y, line, PANEL_TEXT, panel.text_scale);
    }
    out
}
