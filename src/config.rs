//! Command-line surface and the immutable runtime configuration.
//!
//! ```text
//! footswitch-remap [KEY_CODE] [INPUT_PATH]
//! ```
//!
//! Both arguments are optional. `KEY_CODE` is the key to emit in place of the
//! foot switch's own key (see `linux/input-event-codes.h`); `INPUT_PATH` is the
//! evdev node of the foot switch.

use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use evdev::Key;

/// Default device path of the RDing FS1-P foot switch.
pub const DEFAULT_DEVICE_PATH: &str = "/dev/input/by-id/usb-RDing_FootSwitch1F1.-event-kbd";

/// Largest accepted output key code.
pub const MAX_KEY_CODE: i64 = 255;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Debug, Parser)]
#[command(
    name = "footswitch-remap",
    version,
    about = "Grab a USB foot switch and re-emit its key as another key"
)]
pub struct Cli {
    /// Key code to output (0-255, decimal or 0x-prefixed hex). Defaults to KEY_ESC.
    #[arg(
        value_name = "KEY_CODE",
        value_parser = parse_key_code,
        allow_negative_numbers = true
    )]
    pub key_code: Option<u16>,

    /// evdev node of the foot switch.
    #[arg(value_name = "INPUT_PATH")]
    pub input_path: Option<PathBuf>,

    /// Anything past INPUT_PATH; rejected in `Config::from_cli`.
    #[arg(hide = true)]
    pub extra: Vec<String>,
}

/// Parses the output key argument.
///
/// Accepts decimal and `0x`-prefixed hexadecimal integers in `0..=255`.
pub fn parse_key_code(arg: &str) -> Result<u16, String> {
    let trimmed = arg.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(hex, 16),
        None => digits.parse::<i64>(),
    }
    .ok()
    .filter(|_| !digits.starts_with(['+', '-']))
    .ok_or_else(|| format!("argument 1 is not an integer: {arg}"))?;

    let value = if negative { -magnitude } else { magnitude };
    if value < 0 {
        return Err(format!("KEY_CODE is too small: {value}"));
    }
    if value > MAX_KEY_CODE {
        return Err(format!("KEY_CODE is too large: {value}"));
    }
    // In range, so the narrowing cannot truncate.
    Ok(value as u16)
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Values fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Key reported by the foot switch. The FS1-P sends `KEY_B`.
    pub input_key: u16,
    /// Key emitted in its place.
    pub output_key: u16,
    /// evdev node to grab.
    pub device_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_key: Key::KEY_B.code(),
            output_key: Key::KEY_ESC.code(),
            device_path: PathBuf::from(DEFAULT_DEVICE_PATH),
        }
    }
}

impl Config {
    /// Resolves the parsed arguments against the defaults.
    ///
    /// Returns a clap error (printed with usage text) when more than two
    /// positional arguments were given.
    pub fn from_cli(cli: Cli) -> Result<Self, clap::Error> {
        if !cli.extra.is_empty() {
            return Err(Cli::command().error(ErrorKind::TooManyValues, "too many arguments"));
        }

        let defaults = Self::default();
        Ok(Self {
            input_key: defaults.input_key,
            output_key: cli.key_code.unwrap_or(defaults.output_key),
            device_path: cli.input_path.unwrap_or(defaults.device_path),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
