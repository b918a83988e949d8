//! The "solve this" boundary: canvas pixels in, answer text out.
//!
//! [`Solver`] is a plain synchronous call so the frame loop (and tests) decide what runs behind it.
//! [`GeminiSolver`] is the production backend talking to Google's `generateContent` endpoint.

use std::io::Cursor;
use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::{ImageBuffer, ImageFormat, Rgb};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::types::{is_ink, unpack_rgb, FrameBuffer};

/// Anything that can turn a drawing into an answer. May block for as long as it needs.
pub trait Solver {
    fn solve(&mut self, canvas: &FrameBuffer) -> Result<String, Error>;
}

impl<F> Solver for F
where
    F: FnMut(&FrameBuffer) -> Result<String, Error>,
{
    fn solve(&mut self, canvas: &FrameBuffer) -> Result<String, Error> {
        self(canvas)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Gemini model name, e.g. "gemini-1.5-flash"
    pub model: String,
    /// Base URL; the model and `:generateContent` are appended
    pub endpoint: String,
    /// Literal API key; leave empty to read `api_key_env` instead
    pub api_key: Option<String>,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Instruction sent alongside the image
    pub prompt: String,
    /// Whole-request timeout; the frame loop is stalled for at most this long
    pub timeout_secs: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
            api_key: None,
            api_key_env: "GEMINI_API_KEY".to_string(),
            prompt: "The image shows a math problem written by hand (light strokes on a white \
                     background). Solve it and reply with the expression and its result only, \
                     in plain text."
                .to_string(),
            timeout_secs: 30,
        }
    }
}

impl SolverConfig {
    /// The configured key, falling back to the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }
}

/// Blocking Gemini client.
pub struct GeminiSolver {
    agent: ureq::Agent,
    config: SolverConfig,
    api_key: Option<String>,
}

impl GeminiSolver {
    pub fn new(config: SolverConfig) -> Self {
        let api_key = config.resolve_api_key();
        if api_key.is_none() {
            log::warn!(
                "No Gemini API key (set solver.api_key or ${}); solving will report an error",
                config.api_key_env
            );
        }
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();
        Self { agent, config, api_key }
    }

    fn url(&self, key: &str) -> String {
        format!(
            "{}/{}:generateContent?key={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model,
            key
        )
    }
}

impl Solver for GeminiSolver {
    fn solve(&mut self, canvas: &FrameBuffer) -> Result<String, Error> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Solver("no API key configured".into()))?;

        let png = encode_png(canvas)?;
        let body = request_body(&self.config.prompt, &png);

        log::info!(
            "Sending {}x{} canvas ({} bytes PNG) to {}",
            canvas.width,
            canvas.height,
            png.len(),
            self.config.model
        );
        let response = self
            .agent
            .post(&self.url(key))
            .set("Content-Type", "application/json")
            .send_json(body)
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => Error::Solver(format!("API returned HTTP {code}")),
                other => Error::Solver(format!("request failed: {other}")),
            })?;

        let text = response
            .into_string()
            .map_err(|e| Error::Solver(format!("failed to read response: {e}")))?;
        let answer = parse_response(&text)?;
        log::info!("Solver answered: {answer}");
        Ok(answer)
    }
}

/// Render the canvas as dark ink on white and encode it as PNG.
pub fn encode_png(canvas: &FrameBuffer) -> Result<Vec<u8>, Error> {
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> =
        ImageBuffer::from_fn(canvas.width as u32, canvas.height as u32, |x, y| {
            let px = canvas.pixels[y as usize * canvas.width + x as usize];
            if is_ink(px) {
                let (r, g, b) = unpack_rgb(px);
                Rgb([r, g, b])
            } else {
                Rgb([255, 255, 255])
            }
        });
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| Error::Solver(format!("failed to encode canvas: {e}")))?;
    Ok(bytes)
}

fn request_body(prompt: &str, png: &[u8]) -> serde_json::Value {
    serde_json::json!({
        "contents": [{
            "parts": [
                { "text": prompt },
                { "inline_data": { "mime_type": "image/png", "data": BASE64.encode(png) } }
            ]
        }]
    })
}

#[derive(Deserialize, Debug)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Deserialize, Debug)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Deserialize, Debug)]
struct GeminiContent {
    parts: Option<Vec<GeminiPart>>,
}

#[derive(Deserialize, Debug)]
struct GeminiPart {
    text: Option<String>,
}

/// Pull the answer text out of a `generateContent` reply.
pub fn parse_response(body: &str) -> Result<String, Error> {
    let response: GeminiResponse = serde_json::from_str(body).map_err(|e| {
        Error::Solver(format!("malformed response: {e}"))
    })?;

    let text = response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.text)
        .collect::<Vec<_>>()
        .join(" ");

    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        return Err(Error::Solver("empty answer".into()));
    }
    Ok(text)
}
