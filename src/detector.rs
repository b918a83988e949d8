//! Hand landmark detection via an external helper process.
//!
//! The detector itself (e.g. MediaPipe Hands) runs out of process. The helper is started once,
//! prints `READY` on stdout, then loops:
//!
//! 1. read a header of three little-endian `u32`s: width, height, channels (always 3),
//! 2. read `width * height * 3` bytes of RGB pixels,
//! 3. print one JSON line:
//!    `{"hands":[{"handedness":"Right","score":0.97,"landmarks":[{"x":0.5,"y":0.4,"z":0.0}, ...]}]}`
//!    with coordinates normalised to `0..1`, or `{"hands":[],"error":"..."}`.

use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdout, Command, Stdio};

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::landmark::Keypoint;
use crate::types::FrameBuffer;

/// Source of per-frame hand keypoints. `Ok(None)` means no hand this frame.
pub trait LandmarkSource {
    fn detect(&mut self, frame: &FrameBuffer) -> Result<Option<Vec<Keypoint>>, Error>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Interpreter or executable to run
    pub program: PathBuf,
    /// Arguments, typically the helper script path
    pub args: Vec<String>,
    /// Hands scored below this are ignored
    pub min_score: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from(".venv/bin/python"),
            args: vec!["hand_detect.py".to_string()],
            min_score: 0.5,
        }
    }
}

#[derive(Deserialize, Debug)]
struct LandmarkJson {
    x: f32,
    y: f32,
}

#[derive(Deserialize, Debug)]
struct HandJson {
    #[serde(default)]
    handedness: String,
    score: f32,
    landmarks: Vec<LandmarkJson>,
}

#[derive(Deserialize, Debug)]
struct DetectionResult {
    hands: Vec<HandJson>,
    #[serde(default)]
    error: Option<String>,
}

/// Turn one reply line into pixel keypoints for the most confident hand above `min_score`.
///
/// Landmark count is passed through untouched; incomplete hands are the classifier's call.
pub fn parse_detection(
    line: &str,
    width: usize,
    height: usize,
    min_score: f32,
) -> Result<Option<Vec<Keypoint>>, Error> {
    let result: DetectionResult = serde_json::from_str(line.trim())
        .map_err(|e| Error::Detector(format!("bad reply {:?}: {e}", truncate(line, 120))))?;

    if let Some(error) = result.error {
        log::warn!("Detector reported: {error}");
        return Ok(None);
    }

    let best = result
        .hands
        .into_iter()
        .filter(|h| h.score >= min_score)
        .max_by(|a, b| a.score.total_cmp(&b.score));

    Ok(best.map(|hand| {
        log::trace!("{} hand, score {:.2}", hand.handedness, hand.score);
        hand.landmarks
            .iter()
            .map(|lm| Keypoint::new(lm.x * width as f32, lm.y * height as f32))
            .collect()
    }))
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

/// Runs the helper process and talks to it over stdin/stdout.
pub struct SubprocessDetector {
    process: Child,
    stdout: BufReader<ChildStdout>,
    min_score: f32,
}

impl SubprocessDetector {
    /// Start the helper and wait for its `READY` line.
    pub fn spawn(config: &DetectorConfig) -> Result<Self, Error> {
        log::info!("Starting hand detector: {} {:?}", config.program.display(), config.args);
        let mut process = Command::new(&config.program)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                Error::Detector(format!("failed to start {}: {e}", config.program.display()))
            })?;

        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| Error::Detector("no stdout pipe".into()))?;
        let mut stdout = BufReader::new(stdout);

        let mut ready = String::new();
        stdout.read_line(&mut ready)?;
        if ready.trim() != "READY" {
            let _ = process.kill();
            return Err(Error::Detector(format!(
                "helper did not signal ready, got {:?}",
                ready.trim()
            )));
        }
        log::info!("Hand detector ready");

        Ok(Self {
            process,
            stdout,
            min_score: config.min_score,
        })
    }
}

impl LandmarkSource for SubprocessDetector {
    fn detect(&mut self, frame: &FrameBuffer) -> Result<Option<Vec<Keypoint>>, Error> {
        if frame.pixels.is_empty() {
            return Ok(None);
        }

        let stdin = self
            .process
            .stdin
            .as_mut()
            .ok_or_else(|| Error::Detector("no stdin pipe".into()))?;
        stdin.write_all(&(frame.width as u32).to_le_bytes())?;
        stdin.write_all(&(frame.height as u32).to_le_bytes())?;
        stdin.write_all(&3u32.to_le_bytes())?;
        stdin.write_all(&frame.to_rgb_bytes())?;
        stdin.flush()?;

        let mut line = String::new();
        if self.stdout.read_line(&mut line)? == 0 {
            return Err(Error::Detector("helper exited".into()));
        }
        parse_detection(&line, frame.width, frame.height, self.min_score)
    }
}

impl Drop for SubprocessDetector {
    fn drop(&mut self) {
        let _ = self.process.kill();
        let _ = self.process.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_best_hand_to_pixels() {
        let line = r#"{"hands":[
            {"handedness":"Left","score":0.6,"landmarks":[{"x":0.1,"y":0.1,"z":0.0}]},
            {"handedness":"Right","score":0.9,"landmarks":[{"x":0.5,"y":0.25,"z":0.1},{"x":1.0,"y":1.0,"z":0.0}]}
        ]}"#
        .replace('\n', "");
        let hand = parse_detection(&line, 640, 480, 0.5).unwrap().unwrap();
        assert_eq!(hand, vec![Keypoint::new(320.0, 120.0), Keypoint::new(640.0, 480.0)]);
    }

    #[test]
    fn low_scores_and_empty_replies_mean_no_hand() {
        let line = r#"{"hands":[{"handedness":"Left","score":0.2,"landmarks":[]}]}"#;
        assert_eq!(parse_detection(line, 10, 10, 0.5).unwrap(), None);
        assert_eq!(parse_detection(r#"{"hands":[]}"#, 10, 10, 0.5).unwrap(), None);
        assert_eq!(
            parse_detection(r#"{"hands":[],"error":"bad frame"}"#, 10, 10, 0.5).unwrap(),
            None
        );
    }

    #[test]
    fn garbage_is_a_detector_error() {
        assert!(matches!(
            parse_detection("Traceback (most recent", 10, 10, 0.5),
            Err(Error::Detector(_))
        ));
    }

    #[test]
    fn missing_program_fails_to_spawn() {
        let config = DetectorConfig {
            program: PathBuf::from("/nonexistent/air-calc-detector"),
            ..Default::default()
        };
        assert!(matches!(SubprocessDetector::spawn(&config), Err(Error::Detector(_))));
    }
}
