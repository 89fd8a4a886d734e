//! Platform abstraction layer.
//!
//! Defines the `EventSource` (Device Handle) and `EventSink` (Virtual Output
//! Device) traits the translation loop is written against, and the error
//! taxonomy both report through. The Linux implementations live in `linux`.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::event::EventRecord;

mod linux;
#[cfg(test)]
pub mod mock;

pub use linux::{create_virtual_device, open_source_device};

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// A grabbed source device yielding one Event Record per read.
///
/// Lifecycle: open → grabbed → (reading)* → released → closed.
pub trait EventSource {
    /// Display name reported by the device. Diagnostics only.
    fn name(&self) -> &str;

    /// Blocks until exactly one full record has been read.
    fn read_event(&mut self) -> Result<EventRecord, PlatformError>;

    /// Gives up the exclusive grab.
    fn release(&mut self) -> Result<(), PlatformError>;

    /// Closes the handle. Consumes the source.
    fn close(self) -> Result<(), PlatformError>;
}

/// A registered virtual device that accepts Event Records.
pub trait EventSink {
    /// Writes exactly one record.
    fn emit(&mut self, record: &EventRecord) -> Result<(), PlatformError>;

    /// Deregisters the device from the input subsystem.
    fn destroy(&mut self) -> Result<(), PlatformError>;

    /// Closes the management handle. Consumes the sink.
    fn close(self) -> Result<(), PlatformError>;
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// The virtual device setup step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStep {
    Open,
    EventBit,
    KeyBit,
    Descriptor,
    Register,
}

impl fmt::Display for SetupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Open => "opening the uinput interface",
            Self::EventBit => "declaring key events",
            Self::KeyBit => "declaring the output key",
            Self::Descriptor => "writing the device descriptor",
            Self::Register => "registering the device",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("unable to open device \"{}\": {source}", .path.display())]
    DeviceOpen { path: PathBuf, source: io::Error },

    #[error("couldn't read name of device \"{}\": {source}", .path.display())]
    DeviceQuery { path: PathBuf, source: io::Error },

    #[error("unable to get exclusive access to \"{}\": {source}", .path.display())]
    DeviceGrab { path: PathBuf, source: io::Error },

    #[error("virtual device \"{}\": failed while {step}: {source}", .path.display())]
    VirtualDeviceSetup {
        path: PathBuf,
        step: SetupStep,
        source: io::Error,
    },

    #[error("unable to read from \"{name}\": {source}")]
    Read { name: String, source: io::Error },

    #[error("not enough data read from \"{name}\": {got} of {expected} bytes")]
    ShortRead {
        name: String,
        got: usize,
        expected: usize,
    },

    #[error("unable to write to \"{}\": {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("unable to release exclusive access to \"{}\": {source}", .path.display())]
    Release { path: PathBuf, source: io::Error },

    #[error("unable to destroy device \"{}\": {source}", .path.display())]
    Destroy { path: PathBuf, source: io::Error },

    #[error("unable to close device \"{}\": {source}", .path.display())]
    Close { path: PathBuf, source: io::Error },
}

impl PlatformError {
    /// True when the failure came from a syscall interrupted by a signal.
    pub fn is_interrupted(&self) -> bool {
        match self {
            Self::Read { source, .. } | Self::Write { source, .. } => {
                source.kind() == io::ErrorKind::Interrupted
            }
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_error_names_path_and_cause() {
        let err = PlatformError::DeviceOpen {
            path: PathBuf::from("/dev/input/event9"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        let msg = err.to_string();
        assert!(msg.contains("/dev/input/event9"), "{msg}");
        assert!(msg.contains("not found"), "{msg}");
    }

    #[test]
    fn short_read_reports_byte_counts() {
        let err = PlatformError::ShortRead {
            name: "FootSwitch".into(),
            got: 3,
            expected: 24,
        };
        assert_eq!(
            err.to_string(),
            "not enough data read from \"FootSwitch\": 3 of 24 bytes"
        );
    }

    #[test]
    fn setup_error_names_failing_step() {
        let err = PlatformError::VirtualDeviceSetup {
            path: PathBuf::from("/dev/uinput"),
            step: SetupStep::KeyBit,
            source: io::Error::from(io::ErrorKind::InvalidInput),
        };
        assert!(err.to_string().contains("declaring the output key"));
    }

    #[test]
    fn interrupted_read_is_detected() {
        let err = PlatformError::Read {
            name: "FootSwitch".into(),
            source: io::Error::from(io::ErrorKind::Interrupted),
        };
        assert!(err.is_interrupted());

        let err = PlatformError::Read {
            name: "FootSwitch".into(),
            source: io::Error::from(io::ErrorKind::BrokenPipe),
        };
        assert!(!err.is_interrupted());
    }
}
