//! evdev and uinput ioctl requests.
//!
//! Request numbers follow `linux/input.h` and `linux/uinput.h`.

use nix::{ioctl_none, ioctl_read_buf, ioctl_write_int};

// EVIOCGNAME(len): _IOC(_IOC_READ, 'E', 0x06, len)
ioctl_read_buf!(eviocgname, b'E', 0x06, u8);
// EVIOCGRAB: _IOW('E', 0x90, int)
ioctl_write_int!(eviocgrab, b'E', 0x90);

// UI_SET_EVBIT: _IOW('U', 100, int)
ioctl_write_int!(ui_set_evbit, b'U', 100);
// UI_SET_KEYBIT: _IOW('U', 101, int)
ioctl_write_int!(ui_set_keybit, b'U', 101);
// UI_DEV_CREATE: _IO('U', 1)
ioctl_none!(ui_dev_create, b'U', 1);
// UI_DEV_DESTROY: _IO('U', 2)
ioctl_none!(ui_dev_destroy, b'U', 2);
