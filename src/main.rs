// What you SEE:
// • Live (mirrored) camera on the left, a white answer panel on the right.
// • Index finger up: draw. Index + middle up: drag the drawing around.
// • Thumb up: wipe everything. Pinky up: send the drawing to the solver;
//   the video pauses until the answer appears in the panel.
// • C clears, S solves, Q / ESC quits.

use std::time::{Duration, Instant};

use air_calc::camera::CameraCapture;
use air_calc::cli::Cli;
use air_calc::config::Config;
use air_calc::detector::{LandmarkSource, SubprocessDetector};
use air_calc::draw::{draw_crosshair, draw_text_5x7, Drawer};
use air_calc::{Error, GeminiSolver, Gesture, Session};

fn main() -> Result<(), Error> {
    let cli = Cli::parse_args();
    air_calc::init_logger(cli.verbose);

    let mut config = Config::load_or_default(cli.config.as_deref())?;
    if let Some(index) = cli.camera {
        config.camera.index = index;
    }
    config.validate()?;

    /* --- Camera + detector + window setup ---
       Visual: window opens with live camera feed and an empty panel. */
    let mut cam = CameraCapture::new(&config.camera)?;
    let (w, h) = cam.resolution();
    let (w, h) = (w as usize, h as usize);
    let mut detector = SubprocessDetector::spawn(&config.detector)?;
    let mut drawer = Drawer::new("Air Calculator", w + config.panel.width, h)?;

    /* --- The per-frame context: canvas + gesture thresholds + solver --- */
    let solver = GeminiSolver::new(config.solver.clone());
    let mut session = Session::new(w, h, &config, solver);

    /* --- HUD / FPS --- */
    let mut last_fps_time = Instant::now();
    let mut frames_this_second: u32 = 0;
    let mut hud_fps_text = String::from("FPS: 0.0");

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() && !drawer.quit_pressed() {
        let now = Instant::now();

        /* 1) Grab a fresh live frame and find the hand in it. */
        let live = cam.next_frame()?;
        let hand = detector.detect(&live)?;

        /* 2) Gesture -> canvas. A pinky-up may block here while the solver works. */
        let gesture = session.step(hand.as_deref());

        /* 3) Keyboard twins of the reset / solve gestures */
        if drawer.clear_pressed() {
            session.reset();
        }
        if drawer.solve_pressed() {
            session.solve_now();
        }

        /* 4) Compose camera + canvas + panel, then the HUD on top of the video part. */
        let mut screen = session.render(&live, &config.panel)?;
        if let Gesture::IndexUp { tip } = gesture {
            let p = tip.to_pixel();
            draw_crosshair(&mut screen, p.x, p.y, 12, 0x00_FF_CC_33); // visual: yellow + at the pen
        }
        let hud = format!("{} | {}", gesture.kind(), hud_fps_text);
        draw_text_5x7(&mut screen, 8, 8, &hud, 0x00_FF_FF_FF);

        /* 5) Present to the window (this is when the on-screen image updates). */
        drawer.present(&screen)?;

        /* 6) FPS counter, once per second */
        frames_this_second += 1;
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            let secs = now.duration_since(last_fps_time).as_secs_f32();
            let fps = frames_this_second as f32 / secs;
            log::debug!("FPS: {:.1}", fps);
            hud_fps_text = format!("FPS: {:.1}", fps);
            frames_this_second = 0;
            last_fps_time = now;
        }
    }

    log::info!("Bye");
    Ok(())
}
