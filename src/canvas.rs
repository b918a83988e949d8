//! The persistent drawing surface and the gesture-driven state machine around it.
//!
//! | gesture   | effect                                                             |
//! |-----------|--------------------------------------------------------------------|
//! | `IndexUp` | start a stroke, or extend the current one with a connected segment |
//! | `TwoUp`   | pan the view by the movement of the hand since the previous frame  |
//! | `ThumbUp` | wipe surface, answer, pan offset and any unfinished stroke         |
//! | `PinkyUp` | seal the stroke and hand the surface to the solver (once per pose) |
//! | `None`    | seal the stroke                                                    |
//!
//! Any gesture other than `IndexUp` and `TwoUp` seals the stroke in progress.

use serde::{Deserialize, Serialize};

use crate::draw::line_points;
use crate::error::Error;
use crate::gesture::{Gesture, GestureKind};
use crate::landmark::Keypoint;
use crate::solver::Solver;
use crate::types::{is_ink, FrameBuffer, PixelPos, Stamp, INK, RGB_MASK};

/// Pen used for strokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Brush {
    /// 0xRRGGBB
    pub color: u32,
    /// Pen radius in pixels; 0 draws 1-pixel lines
    pub radius: i32,
}

impl Default for Brush {
    fn default() -> Self {
        Self { color: 0x00FF_00FF, radius: 4 }
    }
}

/// Translation applied to the surface when it is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewOffset {
    pub dx: i32,
    pub dy: i32,
}

/// One continuous pen-down action, in surface coordinates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stroke {
    points: Vec<PixelPos>,
}

impl Stroke {
    pub fn points(&self) -> &[PixelPos] {
        &self.points
    }

    fn last(&self) -> Option<PixelPos> {
        self.points.last().copied()
    }
}

pub struct Canvas {
    surface: FrameBuffer,
    brush: Brush,
    stamp: Stamp,
    offset: ViewOffset,
    stroke: Option<Stroke>,
    strokes: Vec<Stroke>,
    nav_anchor: Option<PixelPos>,
    result: String,
    previous: GestureKind,
}

impl Canvas {
    /// A blank canvas matching the camera frame size.
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_brush(width, height, Brush::default())
    }

    pub fn with_brush(width: usize, height: usize, brush: Brush) -> Self {
        Self {
            surface: FrameBuffer::blank(width, height),
            stamp: Stamp::disc(brush.radius),
            brush,
            offset: ViewOffset::default(),
            stroke: None,
            strokes: Vec::new(),
            nav_anchor: None,
            result: String::new(),
            previous: GestureKind::None,
        }
    }

    /// Run one frame's gesture through the state machine.
    ///
    /// Solver failures end up in the result text; nothing here fails.
    pub fn apply<S: Solver + ?Sized>(&mut self, gesture: Gesture, solver: &mut S) {
        let kind = gesture.kind();
        if kind != self.previous {
            log::debug!("gesture {} -> {}", self.previous, kind);
        }
        if kind != GestureKind::TwoUp {
            self.end_navigation();
        }

        match gesture {
            Gesture::IndexUp { tip } => self.draw(tip),
            Gesture::TwoUp { center } => self.navigate(center),
            Gesture::ThumbUp => self.reset(),
            Gesture::PinkyUp if self.previous != GestureKind::PinkyUp => self.solve(solver),
            Gesture::PinkyUp | Gesture::None => self.seal_stroke(),
        }
        self.previous = kind;
    }

    /// Pen down at a fingertip given in screen coordinates.
    pub fn draw(&mut self, tip: Keypoint) {
        let screen = tip.to_pixel();
        let pos = PixelPos::new(screen.x - self.offset.dx, screen.y - self.offset.dy);

        let Some(last) = self.stroke.as_ref().and_then(Stroke::last) else {
            self.stroke = Some(Stroke { points: vec![pos] });
            dab(&mut self.surface, &self.stamp, pos.x, pos.y, self.brush.color);
            return;
        };
        if last == pos {
            return;
        }
        if let Some(stroke) = self.stroke.as_mut() {
            stroke.points.push(pos);
        }
        let (surface, stamp, color) = (&mut self.surface, &self.stamp, self.brush.color);
        line_points(last.x, last.y, pos.x, pos.y, |x, y| dab(surface, stamp, x, y, color));
    }

    /// Pan by the movement of `center` since the last navigation frame.
    /// The first frame of a pan only records the reference point.
    pub fn navigate(&mut self, center: Keypoint) {
        let here = center.to_pixel();
        if let Some(anchor) = self.nav_anchor {
            self.offset.dx += here.x - anchor.x;
            self.offset.dy += here.y - anchor.y;
        }
        self.nav_anchor = Some(here);
    }

    /// Forget the pan reference point so the next pan starts with zero delta.
    pub fn end_navigation(&mut self) {
        self.nav_anchor = None;
    }

    /// Finish the stroke in progress, if any.
    pub fn seal_stroke(&mut self) {
        if let Some(stroke) = self.stroke.take() {
            log::trace!("stroke sealed with {} points", stroke.points.len());
            self.strokes.push(stroke);
        }
    }

    /// Back to a blank canvas with no answer and no pan. Idempotent.
    pub fn reset(&mut self) {
        let dirty = !self.strokes.is_empty()
            || self.stroke.is_some()
            || !self.result.is_empty()
            || self.offset != ViewOffset::default();
        if dirty {
            log::info!("Canvas cleared");
        }
        self.surface.pixels.fill(0);
        self.stroke = None;
        self.strokes.clear();
        self.offset = ViewOffset::default();
        self.nav_anchor = None;
        self.result.clear();
    }

    /// Seal the stroke, then block on the solver and keep whatever it says.
    /// The surface itself is never touched.
    pub fn solve<S: Solver + ?Sized>(&mut self, solver: &mut S) {
        self.seal_stroke();
        let answer = if self.is_blank() {
            Err(Error::EmptyCanvas)
        } else {
            solver.solve(&self.surface)
        };
        self.result = match answer {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Solve failed: {e}");
                format!("Error: {e}")
            }
        };
    }

    /// Camera frame with the (panned) canvas painted over it. Ink is opaque; everything else
    /// shows the camera untouched.
    pub fn combined_frame(&self, camera: &FrameBuffer) -> Result<FrameBuffer, Error> {
        let (w, h) = (self.surface.width, self.surface.height);
        if camera.width != w || camera.height != h || camera.pixels.len() != w * h {
            return Err(Error::FrameSize {
                want_w: w,
                want_h: h,
                got_w: camera.width,
                got_h: camera.height,
            });
        }

        let mut out = camera.clone();
        for y in 0..h as i32 {
            let sy = y - self.offset.dy;
            if sy < 0 || sy >= h as i32 {
                continue;
            }
            for x in 0..w as i32 {
                if let Some(px) = self.surface.get(x - self.offset.dx, sy) {
                    if is_ink(px) {
                        out.pixels[y as usize * w + x as usize] = px & RGB_MASK;
                    }
                }
            }
        }
        Ok(out)
    }

    pub fn result_text(&self) -> &str {
        &self.result
    }

    /// The answer word-wrapped to at most `max_width` characters per line.
    pub fn result_lines(&self, max_width: usize) -> Vec<String> {
        wrap_text(&self.result, max_width)
    }

    /// Raw surface; ink pixels carry [`INK`] in the top byte.
    pub fn surface(&self) -> &FrameBuffer {
        &self.surface
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn stroke_in_progress(&self) -> Option<&Stroke> {
        self.stroke.as_ref()
    }

    pub fn offset(&self) -> ViewOffset {
        self.offset
    }

    pub fn is_blank(&self) -> bool {
        !self.surface.pixels.iter().any(|&px| is_ink(px))
    }
}

/// Stamp the brush disc centred on (cx, cy).
fn dab(surface: &mut FrameBuffer, stamp: &Stamp, cx: i32, cy: i32, color: u32) {
    for &(dx, dy) in &stamp.offsets {
        if let Some(idx) = surface.index(cx + dx, cy + dy) {
            surface.pixels[idx] = INK | (color & RGB_MASK);
        }
    }
}

/// Greedy word wrap: a word joins the current line if it still fits, otherwise it starts a new
/// one. Words are never split; one longer than `max_width` gets a line to itself.
pub fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let len = word.chars().count();
        if current.is_empty() {
            current.push_str(word);
            current_len = len;
        } else if current_len + 1 + len <= max_width {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + len;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = len;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    const W: usize = 100;
    const H: usize = 80;

    fn thin() -> Canvas {
        Canvas::with_brush(W, H, Brush { color: 0x00AB_CDEF, radius: 0 })
    }

    fn index(x: f32, y: f32) -> Gesture {
        Gesture::IndexUp { tip: Keypoint::new(x, y) }
    }

    fn two(x: f32, y: f32) -> Gesture {
        Gesture::TwoUp { center: Keypoint::new(x, y) }
    }

    fn inked(canvas: &Canvas, x: i32, y: i32) -> bool {
        canvas.surface().get(x, y).is_some_and(is_ink)
    }

    fn answer(text: &'static str) -> impl FnMut(&FrameBuffer) -> Result<String, Error> {
        move |_| Ok(text.to_string())
    }

    fn unused() -> impl FnMut(&FrameBuffer) -> Result<String, Error> {
        |_| panic!("solver must not be called")
    }

    #[test]
    fn consecutive_index_frames_draw_a_connected_path() {
        let mut c = thin();
        let mut s = unused();
        for (x, y) in [(10.0, 10.0), (40.0, 10.0), (40.0, 40.0)] {
            c.apply(index(x, y), &mut s);
        }
        for x in 10..=40 {
            assert!(inked(&c, x, 10), "gap at ({x}, 10)");
        }
        for y in 10..=40 {
            assert!(inked(&c, 40, y), "gap at (40, {y})");
        }
        assert!(!inked(&c, 25, 25));

        c.apply(Gesture::None, &mut s);
        assert_eq!(c.strokes().len(), 1);
        assert_eq!(
            c.strokes()[0].points(),
            &[PixelPos::new(10, 10), PixelPos::new(40, 10), PixelPos::new(40, 40)]
        );
    }

    #[test]
    fn none_between_index_frames_starts_a_new_stroke() {
        let mut c = thin();
        let mut s = unused();
        c.apply(index(10.0, 10.0), &mut s);
        c.apply(Gesture::None, &mut s);
        c.apply(index(50.0, 10.0), &mut s);
        c.apply(Gesture::None, &mut s);

        assert_eq!(c.strokes().len(), 2);
        assert!(inked(&c, 10, 10));
        assert!(inked(&c, 50, 10));
        for x in 11..50 {
            assert!(!inked(&c, x, 10), "unexpected ink at ({x}, 10)");
        }
    }

    #[test]
    fn brush_radius_thickens_lines() {
        let mut c = Canvas::with_brush(W, H, Brush { color: 0x00FF_0000, radius: 3 });
        let mut s = unused();
        c.apply(index(20.0, 20.0), &mut s);
        c.apply(index(60.0, 20.0), &mut s);
        assert!(inked(&c, 40, 17));
        assert!(inked(&c, 40, 23));
        assert!(!inked(&c, 40, 24));
        assert_eq!(c.surface().get(40, 20), Some(INK | 0x00FF_0000));
    }

    #[test]
    fn holding_still_does_not_duplicate_points() {
        let mut c = thin();
        let mut s = unused();
        c.apply(index(5.0, 5.0), &mut s);
        c.apply(index(5.2, 4.9), &mut s);
        assert_eq!(c.stroke_in_progress().map(|s| s.points().len()), Some(1));
    }

    #[test]
    fn pan_uses_frame_to_frame_delta() {
        let mut c = thin();
        let mut s = unused();
        c.apply(two(50.0, 50.0), &mut s);
        assert_eq!(c.offset(), ViewOffset::default());
        c.apply(two(55.0, 47.0), &mut s);
        c.apply(two(60.0, 47.0), &mut s);
        assert_eq!(c.offset(), ViewOffset { dx: 10, dy: -3 });

        // a break re-anchors: the jump from (60,47) to (0,0) is not applied
        c.apply(Gesture::None, &mut s);
        c.apply(two(0.0, 0.0), &mut s);
        assert_eq!(c.offset(), ViewOffset { dx: 10, dy: -3 });
    }

    #[test]
    fn pan_keeps_the_stroke_open() {
        let mut c = thin();
        let mut s = unused();
        c.apply(index(10.0, 10.0), &mut s);
        c.apply(two(30.0, 30.0), &mut s);
        assert!(c.stroke_in_progress().is_some());
        assert!(c.strokes().is_empty());
    }

    #[test]
    fn ink_lands_under_the_finger_while_panned() {
        let mut c = thin();
        let mut s = unused();
        c.apply(two(10.0, 10.0), &mut s);
        c.apply(two(15.0, 10.0), &mut s);
        c.apply(index(20.0, 20.0), &mut s);
        assert!(inked(&c, 15, 20));

        let camera = FrameBuffer::filled(W, H, 0x0011_2233);
        let out = c.combined_frame(&camera).unwrap();
        assert_eq!(out.get(20, 20), Some(0x00AB_CDEF));
        assert_eq!(out.get(15, 20), Some(0x0011_2233));
    }

    #[test]
    fn composite_is_opaque_ink_over_untouched_camera() {
        let mut c = thin();
        let mut s = unused();
        c.apply(index(3.0, 4.0), &mut s);
        let camera = FrameBuffer {
            width: W,
            height: H,
            pixels: (0..(W * H) as u32).collect(),
        };
        let out = c.combined_frame(&camera).unwrap();
        for (i, (&got, &cam)) in out.pixels.iter().zip(&camera.pixels).enumerate() {
            if i == 4 * W + 3 {
                assert_eq!(got, 0x00AB_CDEF);
            } else {
                assert_eq!(got, cam);
            }
        }
    }

    #[test]
    fn composite_rejects_mismatched_frames() {
        let c = thin();
        let err = c.combined_frame(&FrameBuffer::blank(W + 1, H)).unwrap_err();
        assert!(matches!(err, Error::FrameSize { got_w: 101, .. }));
    }

    #[test]
    fn thumb_reset_is_idempotent() {
        let mut c = thin();
        let mut s = answer("7");
        c.apply(index(10.0, 10.0), &mut s);
        c.apply(index(20.0, 20.0), &mut s);
        c.apply(Gesture::PinkyUp, &mut s);
        c.apply(two(0.0, 0.0), &mut s);
        c.apply(two(5.0, 5.0), &mut s);
        c.apply(index(30.0, 30.0), &mut s);
        assert_eq!(c.result_text(), "7");

        c.apply(Gesture::ThumbUp, &mut s);
        let once = (
            c.surface().clone(),
            c.strokes().to_vec(),
            c.offset(),
            c.result_text().to_string(),
        );
        c.apply(Gesture::ThumbUp, &mut s);
        let twice = (
            c.surface().clone(),
            c.strokes().to_vec(),
            c.offset(),
            c.result_text().to_string(),
        );

        assert_eq!(once, twice);
        assert_eq!(once.0, FrameBuffer::blank(W, H));
        assert!(once.1.is_empty());
        assert_eq!(once.2, ViewOffset::default());
        assert!(once.3.is_empty());
        assert!(c.stroke_in_progress().is_none());
        assert!(c.is_blank());
    }

    #[test]
    fn solve_success_sets_result_and_seals() {
        let mut c = thin();
        let seen = Cell::new(false);
        let mut s = |fb: &FrameBuffer| -> Result<String, Error> {
            assert!(fb.pixels.iter().any(|&p| is_ink(p)));
            seen.set(true);
            Ok("1 + 1 = 2".into())
        };
        c.apply(index(10.0, 10.0), &mut s);
        c.apply(Gesture::PinkyUp, &mut s);
        assert!(seen.get());
        assert_eq!(c.result_text(), "1 + 1 = 2");
        assert!(c.stroke_in_progress().is_none());
        assert_eq!(c.strokes().len(), 1);
    }

    #[test]
    fn solve_failure_reports_error_and_keeps_strokes() {
        let mut c = thin();
        let mut s = |_: &FrameBuffer| -> Result<String, Error> {
            Err(Error::Solver("network down".into()))
        };
        c.apply(index(10.0, 10.0), &mut s);
        c.apply(index(30.0, 10.0), &mut s);
        let before = c.surface().clone();

        c.apply(Gesture::PinkyUp, &mut s);
        assert!(c.result_text().starts_with("Error"));
        assert!(c.result_text().contains("network down"));
        assert_eq!(c.surface(), &before);

        // next frames carry on as usual
        c.apply(index(10.0, 50.0), &mut s);
        assert!(inked(&c, 10, 50));
    }

    #[test]
    fn solving_an_empty_canvas_is_an_error_without_calling_out() {
        let mut c = thin();
        let mut s = unused();
        c.apply(Gesture::PinkyUp, &mut s);
        assert!(c.result_text().starts_with("Error"));
        assert!(c.is_blank());
    }

    #[test]
    fn holding_pinky_solves_once_per_pose() {
        let mut c = thin();
        let calls = Cell::new(0);
        let mut s = |_: &FrameBuffer| -> Result<String, Error> {
            calls.set(calls.get() + 1);
            Ok(format!("answer {}", calls.get()))
        };
        c.apply(index(10.0, 10.0), &mut s);
        for _ in 0..3 {
            c.apply(Gesture::PinkyUp, &mut s);
        }
        assert_eq!(calls.get(), 1);
        c.apply(Gesture::None, &mut s);
        c.apply(Gesture::PinkyUp, &mut s);
        assert_eq!(calls.get(), 2);
        assert_eq!(c.result_text(), "answer 2");
    }

    #[test]
    fn result_persists_until_next_solve_or_reset() {
        let mut c = thin();
        let mut s = answer("x = 3");
        c.apply(index(10.0, 10.0), &mut s);
        c.apply(Gesture::PinkyUp, &mut s);
        c.apply(Gesture::None, &mut s);
        c.apply(index(20.0, 20.0), &mut s);
        c.apply(two(1.0, 1.0), &mut s);
        assert_eq!(c.result_text(), "x = 3");
        assert_eq!(c.result_lines(3), vec!["x =", "3"]);
    }

    #[test]
    fn wrap_fills_lines_greedily() {
        assert_eq!(
            wrap_text("ALPHA BETA GAMMA DELTA", 10),
            vec!["ALPHA BETA", "GAMMA", "DELTA"]
        );
        assert_eq!(
            wrap_text("ALPHA BETA GAMMA DELTA", 9),
            vec!["ALPHA", "BETA", "GAMMA", "DELTA"]
        );
        assert_eq!(wrap_text("the answer is 42", 25), vec!["the answer is 42"]);
    }

    #[test]
    fn wrapped_lines_fit_the_width() {
        let text = "the integral of two x from zero to three is nine";
        for width in 8..=20 {
            let lines = wrap_text(text, width);
            assert!(lines.iter().all(|l| l.len() <= width), "{width}: {lines:?}");
            assert_eq!(lines.join(" "), text);
        }
    }

    #[test]
    fn wrap_never_splits_words() {
        assert_eq!(
            wrap_text("a incomprehensibilities b", 5),
            vec!["a", "incomprehensibilities", "b"]
        );
        assert!(wrap_text("", 10).is_empty());
        assert!(wrap_text("   \n ", 10).is_empty());
        assert_eq!(wrap_text("x   y\nz", 3), vec!["x y", "z"]);
    }
}
