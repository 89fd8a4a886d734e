//! Event Record codec.
//!
//! One record is the kernel's `struct input_event`, read from an evdev node and
//! written to uinput unchanged apart from the key code. The layout is encoded
//! explicitly instead of transmuting a `#[repr(C)]` struct:
//!
//! ```text
//! offset            width   field
//! 0                 2*long  timestamp (timeval, opaque)
//! TIMESTAMP_SIZE    2       type
//! TIMESTAMP_SIZE+2  2       code
//! TIMESTAMP_SIZE+4  4       value
//! ```
//!
//! All fields are native endian. On 64-bit Linux a record is 24 bytes.

use std::fmt;
use std::mem::size_of;
use std::os::raw::c_long;

use evdev::{EventType, Key};
use thiserror::Error;

/// Size of the `timeval` prefix: two C `long`s.
pub const TIMESTAMP_SIZE: usize = 2 * size_of::<c_long>();

/// Exact size of one encoded record. Anything else is a protocol violation.
pub const RECORD_SIZE: usize = TIMESTAMP_SIZE + size_of::<u16>() * 2 + size_of::<i32>();

/// Synchronization events (`EV_SYN`); terminate every event group.
pub const EV_SYN: u16 = EventType::SYNCHRONIZATION.0;
/// Key events (`EV_KEY`).
pub const EV_KEY: u16 = EventType::KEY.0;
/// Miscellaneous events (`EV_MSC`); the foot switch sends `MSC_SCAN` here.
pub const EV_MSC: u16 = EventType::MISC.0;

const TYPE_OFFSET: usize = TIMESTAMP_SIZE;
const CODE_OFFSET: usize = TYPE_OFFSET + 2;
const VALUE_OFFSET: usize = CODE_OFFSET + 2;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// The buffer does not hold exactly one record.
    #[error("expected {expected} bytes for an input event, got {got}")]
    Size { got: usize, expected: usize },
}

// ---------------------------------------------------------------------------
// Timestamp
// ---------------------------------------------------------------------------

/// Raw `timeval` bytes. Never interpreted, only passed through.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Timestamp([u8; TIMESTAMP_SIZE]);

impl Timestamp {
    pub fn from_bytes(bytes: [u8; TIMESTAMP_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; TIMESTAMP_SIZE] {
        &self.0
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp(")?;
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        write!(f, ")")
    }
}

// ---------------------------------------------------------------------------
// Key value
// ---------------------------------------------------------------------------

/// The `value` of an `EV_KEY` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyValue {
    Released,
    Pressed,
    Autorepeat,
}

impl KeyValue {
    /// Returns `None` for values the kernel does not define for keys.
    pub fn from_raw(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Released),
            1 => Some(Self::Pressed),
            2 => Some(Self::Autorepeat),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Released => "Released",
            Self::Pressed => "Pressed",
            Self::Autorepeat => "Autorepeat",
        }
    }
}

// ---------------------------------------------------------------------------
// Event record
// ---------------------------------------------------------------------------

/// One input event as exchanged with both the source device and uinput.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventRecord {
    pub timestamp: Timestamp,
    /// Event category (`EV_KEY`, `EV_MSC`, `EV_SYN`, ...).
    pub kind: u16,
    pub code: u16,
    pub value: i32,
}

impl EventRecord {
    /// Builds a record with a zeroed timestamp.
    pub fn new(kind: u16, code: u16, value: i32) -> Self {
        Self {
            timestamp: Timestamp::default(),
            kind,
            code,
            value,
        }
    }

    /// Decodes exactly one record. A buffer of any other length is rejected;
    /// short data is never padded.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() != RECORD_SIZE {
            return Err(CodecError::Size {
                got: bytes.len(),
                expected: RECORD_SIZE,
            });
        }

        let mut timestamp = [0u8; TIMESTAMP_SIZE];
        timestamp.copy_from_slice(&bytes[..TIMESTAMP_SIZE]);

        Ok(Self {
            timestamp: Timestamp::from_bytes(timestamp),
            kind: u16::from_ne_bytes([bytes[TYPE_OFFSET], bytes[TYPE_OFFSET + 1]]),
            code: u16::from_ne_bytes([bytes[CODE_OFFSET], bytes[CODE_OFFSET + 1]]),
            value: i32::from_ne_bytes([
                bytes[VALUE_OFFSET],
                bytes[VALUE_OFFSET + 1],
                bytes[VALUE_OFFSET + 2],
                bytes[VALUE_OFFSET + 3],
            ]),
        })
    }

    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut out = [0u8; RECORD_SIZE];
        out[..TIMESTAMP_SIZE].copy_from_slice(self.timestamp.as_bytes());
        out[TYPE_OFFSET..CODE_OFFSET].copy_from_slice(&self.kind.to_ne_bytes());
        out[CODE_OFFSET..VALUE_OFFSET].copy_from_slice(&self.code.to_ne_bytes());
        out[VALUE_OFFSET..].copy_from_slice(&self.value.to_ne_bytes());
        out
    }

    pub fn is_key_event(&self) -> bool {
        self.kind == EV_KEY
    }

    /// The key state, if this is a key event with a defined value.
    pub fn key_value(&self) -> Option<KeyValue> {
        if self.is_key_event() {
            KeyValue::from_raw(self.value)
        } else {
            None
        }
    }
}

/// Short name of an event type for traces.
pub fn type_name(kind: u16) -> &'static str {
    match kind {
        EV_SYN => "EV_SYN",
        EV_KEY => "EV_KEY",
        EV_MSC => "EV_MSC",
        _ => "other",
    }
}

/// Formats a key code with its symbolic name, e.g. `1 (KEY_ESC)`.
pub fn describe_key(code: u16) -> String {
    format!("{code} ({:?})", Key::new(code))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn stamped(kind: u16, code: u16, value: i32) -> EventRecord {
        let mut bytes = [0u8; TIMESTAMP_SIZE];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = 0xA0 + i as u8;
        }
        EventRecord {
            timestamp: Timestamp::from_bytes(bytes),
            ..EventRecord::new(kind, code, value)
        }
    }

    #[test]
    fn record_size_matches_kernel_input_event() {
        #[cfg(target_pointer_width = "64")]
        assert_eq!(RECORD_SIZE, 24);
        #[cfg(target_pointer_width = "32")]
        assert_eq!(RECORD_SIZE, 16);
    }

    #[test]
    fn event_type_constants_match_input_event_codes() {
        assert_eq!(EV_SYN, 0x00);
        assert_eq!(EV_KEY, 0x01);
        assert_eq!(EV_MSC, 0x04);
    }

    #[test]
    fn encode_places_fields_at_fixed_offsets() {
        let record = stamped(EV_MSC, 4, 458757);
        let bytes = record.encode();

        assert_eq!(&bytes[..TIMESTAMP_SIZE], record.timestamp.as_bytes());
        assert_eq!(&bytes[TYPE_OFFSET..CODE_OFFSET], &EV_MSC.to_ne_bytes());
        assert_eq!(&bytes[CODE_OFFSET..VALUE_OFFSET], &4u16.to_ne_bytes());
        assert_eq!(&bytes[VALUE_OFFSET..], &458757i32.to_ne_bytes());
    }

    #[test]
    fn decode_preserves_timestamp_bytes() {
        let record = stamped(EV_KEY, 48, 2);
        let decoded = EventRecord::decode(&record.encode()).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn decode_rejects_short_buffer() {
        let err = EventRecord::decode(&[0u8; 3]).unwrap_err();
        assert_eq!(
            err,
            CodecError::Size {
                got: 3,
                expected: RECORD_SIZE
            }
        );
    }

    #[test]
    fn decode_rejects_empty_and_oversized_buffers() {
        assert!(EventRecord::decode(&[]).is_err());
        assert!(EventRecord::decode(&[0u8; RECORD_SIZE + 1]).is_err());
    }

    #[test]
    fn negative_values_survive_encoding() {
        let record = EventRecord::new(EV_MSC, 4, -7);
        assert_eq!(EventRecord::decode(&record.encode()).unwrap().value, -7);
    }

    #[test]
    fn key_value_only_for_key_events() {
        assert_eq!(
            EventRecord::new(EV_KEY, 48, 1).key_value(),
            Some(KeyValue::Pressed)
        );
        assert_eq!(
            EventRecord::new(EV_KEY, 48, 2).key_value(),
            Some(KeyValue::Autorepeat)
        );
        assert_eq!(EventRecord::new(EV_SYN, 0, 1).key_value(), None);
        assert_eq!(EventRecord::new(EV_KEY, 48, 7).key_value(), None);
    }

    #[test]
    fn key_value_labels() {
        assert_eq!(KeyValue::Released.label(), "Released");
        assert_eq!(KeyValue::Pressed.label(), "Pressed");
        assert_eq!(KeyValue::Autorepeat.label(), "Autorepeat");
    }

    #[test]
    fn type_names_for_foot_switch_events() {
        assert_eq!(type_name(EV_SYN), "EV_SYN");
        assert_eq!(type_name(EV_KEY), "EV_KEY");
        assert_eq!(type_name(EV_MSC), "EV_MSC");
        assert_eq!(type_name(0x11), "other");
    }

    #[test]
    fn describe_key_includes_symbolic_name() {
        assert_eq!(describe_key(1), "1 (KEY_ESC)");
        assert_eq!(describe_key(48), "48 (KEY_B)");
    }
}
