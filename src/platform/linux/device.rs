//! Source device handle over an evdev node (/dev/input/event*).
//!
//! `EvdevDevice` implements `EventSource`. Opening checks that the path is a
//! character device and reads its advertised name; `grab()` takes exclusive
//! ownership of the event stream so neither the compositor nor any other
//! reader sees the foot switch while the remapper runs.
//!
//! Required permissions: read access to the node, normally root or membership
//! in the `input` group.

use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::os::unix::fs::FileTypeExt;
use std::os::unix::io::{AsRawFd, IntoRawFd};
use std::path::{Path, PathBuf};

use super::ioctl::{eviocgname, eviocgrab};
use crate::event::{EventRecord, RECORD_SIZE};
use crate::platform::{EventSource, PlatformError};

/// Size of the buffer handed to `EVIOCGNAME`; longer names are truncated.
pub const MAX_NAME_LEN: usize = 256;

/// Name used when the device reports an empty one.
const UNKNOWN_NAME: &str = "Unknown";

// ---------------------------------------------------------------------------
// Public struct
// ---------------------------------------------------------------------------

/// An open evdev node.
#[derive(Debug)]
pub struct EvdevDevice {
    file: File,
    path: PathBuf,
    name: String,
}

impl EvdevDevice {
    /// Opens `path` read-only and queries the device name.
    pub fn open(path: &Path) -> Result<Self, PlatformError> {
        let open_err = |source: io::Error| PlatformError::DeviceOpen {
            path: path.to_path_buf(),
            source,
        };

        let file = OpenOptions::new().read(true).open(path).map_err(open_err)?;
        let file_type = file.metadata().map_err(open_err)?.file_type();
        if !file_type.is_char_device() {
            return Err(open_err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "not a character device",
            )));
        }

        let name = query_name(&file).map_err(|source| PlatformError::DeviceQuery {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("device: opened {} ({name})", path.display());

        Ok(Self {
            file,
            path: path.to_path_buf(),
            name,
        })
    }

    /// Takes the exclusive grab (`EVIOCGRAB 1`).
    pub fn grab(&mut self) -> Result<(), PlatformError> {
        set_grab(&self.file, true).map_err(|source| PlatformError::DeviceGrab {
            path: self.path.clone(),
            source,
        })?;
        log::debug!("device: exclusive grab held on {}", self.path.display());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// EventSource trait impl
// ---------------------------------------------------------------------------

impl EventSource for EvdevDevice {
    fn name(&self) -> &str {
        &self.name
    }

    /// Issues a single `read(2)` for one record. Anything short of a full
    /// record is reported as `ShortRead`, including end-of-file.
    fn read_event(&mut self) -> Result<EventRecord, PlatformError> {
        let mut buf = [0u8; RECORD_SIZE];
        let got = self
            .file
            .read(&mut buf)
            .map_err(|source| PlatformError::Read {
                name: self.name.clone(),
                source,
            })?;

        EventRecord::decode(&buf[..got]).map_err(|_| PlatformError::ShortRead {
            name: self.name.clone(),
            got,
            expected: RECORD_SIZE,
        })
    }

    fn release(&mut self) -> Result<(), PlatformError> {
        set_grab(&self.file, false).map_err(|source| PlatformError::Release {
            path: self.path.clone(),
            source,
        })
    }

    /// Hands the descriptor to `close(2)` so a failure is reported instead of
    /// being swallowed by `Drop`.
    fn close(self) -> Result<(), PlatformError> {
        let fd = self.file.into_raw_fd();
        nix::unistd::close(fd).map_err(|errno| PlatformError::Close {
            path: self.path,
            source: io::Error::from(errno),
        })
    }
}

// ---------------------------------------------------------------------------
// ioctl helpers
// ---------------------------------------------------------------------------

fn query_name(file: &File) -> io::Result<String> {
    let mut buf = [0u8; MAX_NAME_LEN];
    // SAFETY: the fd is open for the duration of the call and the request
    // length is taken from `buf`.
    unsafe { eviocgname(file.as_raw_fd(), &mut buf) }.map_err(io::Error::from)?;
    Ok(name_from_buffer(&buf))
}

/// Decodes a NUL-terminated name, falling back to "Unknown" when empty.
fn name_from_buffer(buf: &[u8]) -> String {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    let name = String::from_utf8_lossy(&buf[..end]).trim().to_owned();
    if name.is_empty() {
        UNKNOWN_NAME.to_owned()
    } else {
        name
    }
}

fn set_grab(file: &File, grab: bool) -> io::Result<()> {
    // SAFETY: EVIOCGRAB takes its argument by value; the fd stays open.
    unsafe { eviocgrab(file.as_raw_fd(), u8::from(grab).into()) }
        .map(drop)
        .map_err(io::Error::from)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
