//! Translation loop: read → rewrite → emit, then the fixed cleanup sequence.
//!
//! The loop is a pass-through. Every record read is written, in order, with
//! one exception: a key event whose code is the configured input key has its
//! code replaced by the output key. Scan (`EV_MSC`) and sync (`EV_SYN`)
//! records are forwarded untouched, so the event groups downstream consumers
//! rely on stay intact:
//!
//! ```text
//! press/release:  EV_MSC MSC_SCAN  →  EV_KEY <key> 1|0  →  EV_SYN SYN_REPORT
//! autorepeat:                          EV_KEY <key> 2    →  EV_SYN SYN_REPORT
//! ```
//!
//! The loop ends on the first read or write failure, or when shutdown has
//! been requested. Cleanup then always attempts every step, in order:
//! destroy virtual device, release grab, close virtual device, close source.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::Config;
use crate::event::{type_name, EventRecord};
use crate::platform::{EventSink, EventSource, PlatformError};

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

/// Why the loop stopped.
#[derive(Debug)]
pub enum LoopExit {
    /// Shutdown was requested (SIGINT/SIGTERM).
    Cancelled,
    /// A read, short read or write failed.
    Failed(PlatformError),
}

/// Result of each cleanup step.
#[derive(Debug)]
pub struct CleanupReport {
    pub destroy: Result<(), PlatformError>,
    pub release: Result<(), PlatformError>,
    pub close_sink: Result<(), PlatformError>,
    pub close_source: Result<(), PlatformError>,
}

impl CleanupReport {
    /// Destroy and close failures are fatal. A failed grab release is only
    /// reported.
    pub fn has_fatal_failure(&self) -> bool {
        self.destroy.is_err() || self.close_sink.is_err() || self.close_source.is_err()
    }
}

#[derive(Debug)]
pub struct Outcome {
    pub exit: LoopExit,
    pub cleanup: CleanupReport,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self.exit, LoopExit::Cancelled) && !self.cleanup.has_fatal_failure()
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Rewrites the code of key events for `config.input_key`; returns every
/// other record unchanged.
pub fn translate(record: EventRecord, config: &Config) -> EventRecord {
    if record.is_key_event() && record.code == config.input_key {
        EventRecord {
            code: config.output_key,
            ..record
        }
    } else {
        record
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Runs the loop until it fails or `shutdown` is set, then cleans up.
///
/// Takes ownership of both devices; they are closed before this returns.
pub fn run<S, K>(mut source: S, mut sink: K, config: &Config, shutdown: &AtomicBool) -> Outcome
where
    S: EventSource,
    K: EventSink,
{
    let exit = forward_events(&mut source, &mut sink, config, shutdown);
    match &exit {
        LoopExit::Cancelled => log::info!("engine: shutdown requested"),
        LoopExit::Failed(e) => log::error!("{e}"),
    }

    let cleanup = cleanup(source, sink);
    Outcome { exit, cleanup }
}

fn forward_events<S, K>(
    source: &mut S,
    sink: &mut K,
    config: &Config,
    shutdown: &AtomicBool,
) -> LoopExit
where
    S: EventSource,
    K: EventSink,
{
    loop {
        if shutdown.load(Ordering::SeqCst) {
            return LoopExit::Cancelled;
        }

        let record = match source.read_event() {
            Ok(record) => record,
            Err(e) => return exit_for(e, shutdown),
        };
        trace_event(&record, config);

        if let Err(e) = sink.emit(&translate(record, config)) {
            return exit_for(e, shutdown);
        }
    }
}

/// A syscall interrupted by the shutdown signal is a cancellation, not a
/// failure.
fn exit_for(error: PlatformError, shutdown: &AtomicBool) -> LoopExit {
    if error.is_interrupted() && shutdown.load(Ordering::SeqCst) {
        LoopExit::Cancelled
    } else {
        LoopExit::Failed(error)
    }
}

/// Per-event trace. Silent in release builds.
fn trace_event(record: &EventRecord, config: &Config) {
    if !cfg!(debug_assertions) {
        return;
    }
    log::debug!(
        "event type: {} ({}), code: {}, value: {}",
        record.kind,
        type_name(record.kind),
        record.code,
        record.value
    );
    if record.code == config.input_key {
        if let Some(state) = record.key_value() {
            log::debug!("{}", state.label());
        }
    }
}

// ---------------------------------------------------------------------------
// Cleanup
// ---------------------------------------------------------------------------

/// Attempts all four teardown steps in order, regardless of earlier failures.
/// Each failure is logged as it happens.
fn cleanup<S, K>(mut source: S, mut sink: K) -> CleanupReport
where
    S: EventSource,
    K: EventSink,
{
    let destroy = sink.destroy();
    if let Err(e) = &destroy {
        log::error!("{e}");
    }

    println!("Releasing exclusive access");
    let release = source.release();
    if let Err(e) = &release {
        log::warn!("{e}");
    }

    let close_sink = sink.close();
    if let Err(e) = &close_sink {
        log::error!("{e}");
    }

    let close_source = source.close();
    if let Err(e) = &close_source {
        log::error!("{e}");
    }

    CleanupReport {
        destroy,
        release,
        close_sink,
        close_source,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
