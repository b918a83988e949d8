//! Command-Line Interface

use clap::Parser;
use std::path::PathBuf;

/// Draw math in the air with one finger and let Gemini solve it.
///
/// Gestures: index up = draw, index+middle up = move canvas, thumb up = clear,
/// pinky up = solve. Keys: C = clear, S = solve, Q/Esc = quit.
#[derive(Parser, Debug)]
#[command(name = "air-calc")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path (defaults to ./air-calc.toml if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Camera index, overriding the config file
    #[arg(long)]
    pub camera: Option<u32>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
