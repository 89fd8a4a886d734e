//! SIGINT/SIGTERM handling.
//!
//! The handlers are installed without `SA_RESTART`, so a signal arriving while
//! the loop is blocked in `read(2)` makes the read fail with `EINTR`. The loop
//! then sees the flag and leaves through the same exit path as an I/O error,
//! which means cleanup still runs in full.

use std::os::raw::c_int;
use std::sync::atomic::{AtomicBool, Ordering};

use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};

static REQUESTED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_signal(_: c_int) {
    // Only async-signal-safe work here.
    REQUESTED.store(true, Ordering::SeqCst);
}

/// Installs the handlers and returns the flag they set.
pub fn install() -> nix::Result<&'static AtomicBool> {
    let action = SigAction::new(
        SigHandler::Handler(on_signal),
        SaFlags::empty(),
        SigSet::empty(),
    );
    for signal in [Signal::SIGINT, Signal::SIGTERM] {
        // SAFETY: the handler only stores to an atomic.
        unsafe { sigaction(signal, &action) }?;
    }
    Ok(&REQUESTED)
}
