//! Linux platform backend.
//!
//! Source: an evdev node (/dev/input/event*), grabbed via `EVIOCGRAB`.
//! Sink: a uinput device (/dev/uinput) that can emit exactly one key.

mod device;
mod ioctl;
mod uinput;

use std::path::Path;

use device::EvdevDevice;
use uinput::{DeviceDescriptor, UinputDevice};

use crate::platform::PlatformError;

/// The uinput management interface.
pub const UINPUT_PATH: &str = "/dev/uinput";

/// Name the virtual device is registered under.
const VIRTUAL_DEVICE_NAME: &str = "footswitch-remap";

// ---------------------------------------------------------------------------
// Factory: source device
// ---------------------------------------------------------------------------

/// Opens the foot switch at `path`, reads its name and takes the exclusive grab.
pub fn open_source_device(path: &Path) -> Result<EvdevDevice, PlatformError> {
    let mut device = EvdevDevice::open(path)?;
    device.grab()?;
    Ok(device)
}

// ---------------------------------------------------------------------------
// Factory: virtual device
// ---------------------------------------------------------------------------

/// Registers a uinput device that can emit `output_key`.
pub fn create_virtual_device(output_key: u16) -> Result<UinputDevice, PlatformError> {
    UinputDevice::create(
        Path::new(UINPUT_PATH),
        &DeviceDescriptor::placeholder(VIRTUAL_DEVICE_NAME),
        output_key,
    )
}
