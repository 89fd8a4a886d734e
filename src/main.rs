//! footswitch-remap -- grab a USB foot switch and re-emit its key via uinput.
//!
//! Entry point, process lifecycle, and exit status.
//!
//! Setup failures abort before any loop starts. Once both devices exist the
//! engine owns them and always runs the full cleanup sequence, whether the
//! loop ended on an I/O error or on SIGINT/SIGTERM.

mod config;
mod engine;
mod event;
mod platform;
mod shutdown;

use std::error::Error;
use std::process::ExitCode;

use clap::Parser;

use config::{Cli, Config};
use event::describe_key;
use platform::EventSource;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match Config::from_cli(Cli::parse()) {
        Ok(config) => config,
        Err(e) => e.exit(),
    };
    log::debug!("config: {config:?}");

    match run(&config) {
        Ok(outcome) if outcome.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Sets up both devices and hands them to the engine.
///
/// Returns `Err` only for setup failures; loop and cleanup failures are
/// reported through the `Outcome`.
fn run(config: &Config) -> Result<engine::Outcome, Box<dyn Error>> {
    let shutdown = shutdown::install()?;

    let source = platform::open_source_device(&config.device_path)?;
    println!("Reading from {}", source.name());

    let sink = platform::create_virtual_device(config.output_key)?;
    println!(
        "Receiving keyboard presses and outputting key code {}",
        describe_key(config.output_key)
    );

    Ok(engine::run(source, sink, config, shutdown))
}
