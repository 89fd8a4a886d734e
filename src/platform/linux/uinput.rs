//! Virtual output device via the uinput interface (/dev/uinput).
//!
//! `UinputDevice` implements `EventSink`. Setup follows the legacy uinput
//! protocol: declare `EV_KEY`, declare the single output key, write a
//! `uinput_user_dev` descriptor, then `UI_DEV_CREATE`. Any failing step
//! returns before registration, so no half-registered device is left behind.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::io::{AsRawFd, IntoRawFd};
use std::path::{Path, PathBuf};

use super::ioctl::{ui_dev_create, ui_dev_destroy, ui_set_evbit, ui_set_keybit};
use crate::event::{EventRecord, EV_KEY, RECORD_SIZE};
use crate::platform::{EventSink, PlatformError, SetupStep};

/// `UINPUT_MAX_NAME_SIZE`, including the trailing NUL.
pub const MAX_NAME_SIZE: usize = 80;
/// `ABS_CNT`: length of each absolute-axis table in the descriptor.
const ABS_CNT: usize = 64;
/// `BUS_USB` from `linux/input.h`.
pub const BUS_USB: u16 = 0x03;

/// Encoded size of `struct uinput_user_dev`.
pub const USER_DEV_SIZE: usize = MAX_NAME_SIZE + 4 * 2 + 4 + 4 * ABS_CNT * 4;

// ---------------------------------------------------------------------------
// Descriptor
// ---------------------------------------------------------------------------

/// Identity submitted to the kernel for the virtual device.
///
/// No real hardware is emulated, so the ids are placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub name: String,
    pub bustype: u16,
    pub vendor: u16,
    pub product: u16,
    pub version: u16,
}

impl DeviceDescriptor {
    pub fn placeholder(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            bustype: BUS_USB,
            vendor: 0x1,
            product: 0x1,
            version: 1,
        }
    }

    /// Encodes `struct uinput_user_dev`: name, `input_id`, `ff_effects_max`,
    /// then the four zeroed abs tables.
    pub fn encode(&self) -> [u8; USER_DEV_SIZE] {
        let mut out = [0u8; USER_DEV_SIZE];

        // Leave room for the NUL terminator.
        let name = self.name.as_bytes();
        let len = name.len().min(MAX_NAME_SIZE - 1);
        out[..len].copy_from_slice(&name[..len]);

        let mut at = MAX_NAME_SIZE;
        for field in [self.bustype, self.vendor, self.product, self.version] {
            out[at..at + 2].copy_from_slice(&field.to_ne_bytes());
            at += 2;
        }
        // ff_effects_max and the abs tables stay zero.
        out
    }
}

// ---------------------------------------------------------------------------
// Public struct
// ---------------------------------------------------------------------------

/// A registered uinput device able to emit one key code.
#[derive(Debug)]
pub struct UinputDevice {
    file: File,
    path: PathBuf,
}

impl UinputDevice {
    /// Opens `path`, declares `output_key`, submits `descriptor` and
    /// registers the device.
    pub fn create(
        path: &Path,
        descriptor: &DeviceDescriptor,
        output_key: u16,
    ) -> Result<Self, PlatformError> {
        let setup_err = |step: SetupStep| {
            move |source: io::Error| PlatformError::VirtualDeviceSetup {
                path: path.to_path_buf(),
                step,
                source,
            }
        };

        let file = OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(setup_err(SetupStep::Open))?;
        let fd = file.as_raw_fd();

        // SAFETY: the UI_SET_* requests take their argument by value and the
        // fd is owned by `file` for the whole block.
        unsafe { ui_set_evbit(fd, EV_KEY.into()) }
            .map_err(io::Error::from)
            .map_err(setup_err(SetupStep::EventBit))?;
        unsafe { ui_set_keybit(fd, output_key.into()) }
            .map_err(io::Error::from)
            .map_err(setup_err(SetupStep::KeyBit))?;

        let encoded = descriptor.encode();
        match (&file).write(&encoded) {
            Ok(n) if n == USER_DEV_SIZE => {}
            Ok(n) => {
                return Err(setup_err(SetupStep::Descriptor)(io::Error::new(
                    io::ErrorKind::WriteZero,
                    format!("short write: {n} of {USER_DEV_SIZE} bytes"),
                )))
            }
            Err(e) => return Err(setup_err(SetupStep::Descriptor)(e)),
        }

        // SAFETY: UI_DEV_CREATE takes no argument.
        unsafe { ui_dev_create(fd) }
            .map_err(io::Error::from)
            .map_err(setup_err(SetupStep::Register))?;

        log::info!(
            "uinput: registered \"{}\" emitting key {output_key}",
            descriptor.name
        );
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    fn write_err(&self, source: io::Error) -> PlatformError {
        PlatformError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

// ---------------------------------------------------------------------------
// EventSink trait impl
// ---------------------------------------------------------------------------

impl EventSink for UinputDevice {
    /// One `write(2)` per record; a partial write is an error, never retried.
    fn emit(&mut self, record: &EventRecord) -> Result<(), PlatformError> {
        let bytes = record.encode();
        match (&self.file).write(&bytes) {
            Ok(n) if n == RECORD_SIZE => Ok(()),
            Ok(n) => Err(self.write_err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short write: {n} of {RECORD_SIZE} bytes"),
            ))),
            Err(e) => Err(self.write_err(e)),
        }
    }

    fn destroy(&mut self) -> Result<(), PlatformError> {
        // SAFETY: UI_DEV_DESTROY takes no argument.
        unsafe { ui_dev_destroy(self.file.as_raw_fd()) }
            .map(drop)
            .map_err(|errno| PlatformError::Destroy {
                path: self.path.clone(),
                source: io::Error::from(errno),
            })
    }

    fn close(self) -> Result<(), PlatformError> {
        let fd = self.file.into_raw_fd();
        nix::unistd::close(fd).map_err(|errno| PlatformError::Close {
            path: self.path,
            source: io::Error::from(errno),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
