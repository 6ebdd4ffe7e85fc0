//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use mmwave_core::LimitKind;
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "mmwave", version, about = "mmWave presence tracker")]
pub struct Cli {
    /// Path to config TOML
    #[arg(long, value_name = "FILE", default_value = "etc/mmwave.toml")]
    pub config: PathBuf,

    /// Print events and errors as JSON lines
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the tracker over a recorded frames CSV
    Replay {
        /// Frames CSV (header: t_ms,slot,x,y,speed,resolution)
        #[arg(long, value_name = "FILE")]
        frames: PathBuf,
        /// Adjust a limit before the first frame, e.g. max_distance=3.5 (repeatable)
        #[arg(long = "limit", value_name = "KEY=VALUE", value_parser = parse_limit)]
        limits: Vec<(LimitKind, f32)>,
    },
    /// Run the tracker against the simulated radar
    Simulate {
        /// Number of simulated people (0..=3)
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=3))]
        people: u8,
        /// Seed for position jitter and dropouts
        #[arg(long, default_value_t = 1)]
        seed: u64,
        /// Frame period in ms
        #[arg(long, value_name = "MS", default_value_t = 100, value_parser = clap::value_parser!(u64).range(1..))]
        period_ms: u64,
        /// Probability that a slot drops out of a frame
        #[arg(long, default_value_t = 0.0)]
        dropout: f32,
        /// Simulated run length in ms; 0 runs until Ctrl-C
        #[arg(long, value_name = "MS", default_value_t = 10_000)]
        duration_ms: u64,
        /// Pace frames at wall-clock speed instead of as fast as possible
        #[arg(long, action = ArgAction::SetTrue)]
        realtime: bool,
        /// Adjust a limit before the first frame (repeatable)
        #[arg(long = "limit", value_name = "KEY=VALUE", value_parser = parse_limit)]
        limits: Vec<(LimitKind, f32)>,
    },
    /// Validate the config, build the tracker and log the effective settings
    CheckConfig,
}

/// `max_distance=3.5` style limit override.
pub fn parse_limit(s: &str) -> Result<(LimitKind, f32), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    let kind = key.trim().parse::<LimitKind>().map_err(|e| e.to_string())?;
    let value = value
        .trim()
        .parse::<f32>()
        .map_err(|e| format!("invalid value for {key}: {e}"))?;
    if !value.is_finite() {
        return Err(format!("{key} must be a finite number"));
    }
    Ok((kind, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_overrides_parse() {
        assert_eq!(
            parse_limit("max_distance=3.5").unwrap(),
            (LimitKind::MaxDistance, 3.5)
        );
        assert_eq!(
            parse_limit(" min_tilt_angle = -20 ").unwrap(),
            (LimitKind::MinTiltAngle, -20.0)
        );
        assert!(parse_limit("max_distance").is_err());
        assert!(parse_limit("speed=1").unwrap_err().contains("unknown limit"));
        assert!(parse_limit("max_tilt_angle=NaN").is_err());
    }
}
