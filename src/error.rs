// One error type for the whole crate.
// Every variant states *where* things went wrong.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Window init error: {0}")]
    WindowInit(String),

    #[error("Window update error: {0}")]
    WindowUpdate(String),

    #[error("Camera init error: {0}")]
    CameraInit(String),

    #[error("Camera frame error: {0}")]
    CameraFrame(String),

    #[error("Hand detector error: {0}")]
    Detector(String),

    #[error("Solver error: {0}")]
    Solver(String),

    #[error("nothing drawn to solve")]
    EmptyCanvas,

    #[error("frame is {got_w}x{got_h}, canvas is {want_w}x{want_h}")]
    FrameSize {
        want_w: usize,
        want_h: usize,
        got_w: usize,
        got_h: usize,
    },

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
