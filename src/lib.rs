//! # air-calc
//!
//! Draw in front of a webcam with one finger, then ask a vision model to solve what you wrote.
//!
//! Each frame:
//!
//! ```text
//! camera ──▶ detector ──▶ gesture::classify ──▶ Canvas::apply ──▶ combined frame + answer panel
//!                                                     │
//!                                                     └── PinkyUp ──▶ Solver (blocking)
//! ```
//!
//! - [`gesture`]: stateless finger-pose classification
//! - [`canvas`]: drawing surface, pan offset, answer text
//! - [`session`]: the per-frame context tying them together
//! - [`solver`]: the image-in, text-out boundary and its Gemini backend
//! - [`detector`]: hand landmarks from an external helper process
//! - [`camera`], [`draw`]: camera capture and the minifb window

pub mod camera;
pub mod canvas;
pub mod cli;
pub mod config;
pub mod detector;
pub mod draw;
pub mod error;
pub mod gesture;
pub mod landmark;
pub mod session;
pub mod solver;
pub mod types;

pub use canvas::{wrap_text, Brush, Canvas, Stroke, ViewOffset};
pub use config::Config;
pub use error::Error;
pub use gesture::{classify, Gesture, GestureKind, GestureThresholds};
pub use landmark::{Keypoint, LandmarkIdx, LANDMARK_COUNT};
pub use session::Session;
pub use solver::{GeminiSolver, Solver};
pub use types::FrameBuffer;

/// Initializes logging to *stderr*: `info` by default, `debug` with `verbose`.
/// `RUST_LOG` still wins. Does nothing if a logger is already installed.
pub fn init_logger(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter(None, log::LevelFilter::Warn)
        .filter(Some(env!("CARGO_CRATE_NAME")), level)
        .parse_default_env()
        .try_init()
        .ok();
}
