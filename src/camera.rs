// Opens a camera and converts frames into a buffer suitable for the window.
// Visual expectation: when main.rs calls `next_frame()`, you get a
// Vec<u32> where each pixel is 0x00RRGGBB, ready for the canvas and the screen.

use crate::config::CameraConfig;
use crate::error::Error;
use crate::types::{pack_rgb, FrameBuffer};

// Bring in nokhwa types for camera control.
use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    utils::{
        CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
    },
};

// A small wrapper around nokhwa::Camera so our main loop stays clean.
pub struct CameraCapture {
    cam: Camera,
    width: u32,
    height: u32,
    mirror: bool,
}

impl CameraCapture {
    /// Open the configured device at (roughly) the configured resolution.
    /// On success, nothing is shown on screen yet; we just hold an open stream.
    pub fn new(config: &CameraConfig) -> Result<Self, Error> {
        let idx = CameraIndex::Index(config.index);

        let fmt = CameraFormat::new(
            Resolution::new(config.width, config.height),
            FrameFormat::YUYV, // uncompressed; cheap to convert to RGB
            30,                // target FPS
        );

        // Ask for RGB frames, taking whatever the device offers closest to our request.
        let req = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(fmt));

        let mut cam = Camera::new(idx, req)
            .map_err(|e| Error::CameraInit(format!("Create camera: {e}")))?;

        cam.open_stream()
            .map_err(|e| Error::CameraInit(format!("Open stream: {e}")))?;

        // The actual stream might choose a slightly different resolution.
        let actual = cam.resolution();
        log::info!(
            "Camera {} streaming at {}x{}",
            config.index,
            actual.width(),
            actual.height()
        );

        Ok(Self {
            cam,
            width: actual.width(),
            height: actual.height(),
            mirror: config.mirror,
        })
    }

    /// Grab one frame (blocking until one is ready) as 0x00RRGGBB pixels, mirrored if asked.
    pub fn next_frame(&mut self) -> Result<FrameBuffer, Error> {
        let frame = self
            .cam
            .frame()
            .map_err(|e| Error::CameraFrame(format!("Fetch frame: {e}")))?;

        // Decode to an ImageBuffer<Rgb<u8>, Vec<u8>> (handles various raw formats safely).
        let rgb_img = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| Error::CameraFrame(format!("Decode RGB: {e}")))?;

        let (w, h) = rgb_img.dimensions();
        let pixels = rgb_img
            .pixels()
            .map(|p| pack_rgb(p[0], p[1], p[2]))
            .collect();

        let mut out = FrameBuffer {
            width: w as usize,
            height: h as usize,
            pixels,
        };
        if self.mirror {
            out.mirror_horizontal();
        }
        Ok(out)
    }

    /// Report the actual resolution the camera is delivering.
    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
