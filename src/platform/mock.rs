//! Mock source and sink for unit testing the translation loop.
//!
//! Both halves append to a shared `Journal`, so tests can assert on the exact
//! order of reads, emits and cleanup calls without any real device.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{EventSink, EventSource, PlatformError};
use crate::event::{EventRecord, RECORD_SIZE};

/// One observed platform call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Read,
    Emit(EventRecord),
    Destroy,
    Release,
    CloseSink,
    CloseSource,
}

pub type Journal = Rc<RefCell<Vec<Op>>>;

pub fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

/// Emitted records, in order.
pub fn emitted(journal: &Journal) -> Vec<EventRecord> {
    journal
        .borrow()
        .iter()
        .filter_map(|op| match op {
            Op::Emit(record) => Some(*record),
            _ => None,
        })
        .collect()
}

/// Cleanup calls, in order.
pub fn cleanup_ops(journal: &Journal) -> Vec<Op> {
    journal
        .borrow()
        .iter()
        .filter(|op| !matches!(op, Op::Read | Op::Emit(_)))
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// What the next `read_event` call does.
pub enum Step {
    Event(EventRecord),
    /// A read that returned only this many bytes.
    Short(usize),
    /// A read that failed outright.
    Fail(io::ErrorKind),
    /// Sets the flag, then fails with `EINTR` like a signal-interrupted read.
    Interrupt(Arc<AtomicBool>),
}

/// Replays a script of reads. Once the script runs out every read behaves
/// like a disconnected device (zero bytes).
pub struct ScriptedSource {
    journal: Journal,
    script: VecDeque<Step>,
    pub fail_release: bool,
    pub fail_close: bool,
}

impl ScriptedSource {
    pub const NAME: &'static str = "Mock FootSwitch";

    pub fn new(journal: &Journal, script: Vec<Step>) -> Self {
        Self {
            journal: Rc::clone(journal),
            script: script.into(),
            fail_release: false,
            fail_close: false,
        }
    }

    pub fn events(journal: &Journal, events: &[EventRecord]) -> Self {
        Self::new(journal, events.iter().copied().map(Step::Event).collect())
    }
}

impl EventSource for ScriptedSource {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn read_event(&mut self) -> Result<EventRecord, PlatformError> {
        self.journal.borrow_mut().push(Op::Read);
        let short = |got: usize| PlatformError::ShortRead {
            name: Self::NAME.into(),
            got,
            expected: RECORD_SIZE,
        };
        match self.script.pop_front() {
            Some(Step::Event(record)) => Ok(record),
            Some(Step::Short(got)) => Err(short(got)),
            Some(Step::Fail(kind)) => Err(PlatformError::Read {
                name: Self::NAME.into(),
                source: io::Error::from(kind),
            }),
            Some(Step::Interrupt(flag)) => {
                flag.store(true, Ordering::SeqCst);
                Err(PlatformError::Read {
                    name: Self::NAME.into(),
                    source: io::Error::from(io::ErrorKind::Interrupted),
                })
            }
            None => Err(short(0)),
        }
    }

    fn release(&mut self) -> Result<(), PlatformError> {
        self.journal.borrow_mut().push(Op::Release);
        if self.fail_release {
            return Err(PlatformError::Release {
                path: PathBuf::from("/dev/input/mock"),
                source: io::Error::from(io::ErrorKind::InvalidInput),
            });
        }
        Ok(())
    }

    fn close(self) -> Result<(), PlatformError> {
        self.journal.borrow_mut().push(Op::CloseSource);
        if self.fail_close {
            return Err(PlatformError::Close {
                path: PathBuf::from("/dev/input/mock"),
                source: io::Error::from(io::ErrorKind::Other),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sink
// ---------------------------------------------------------------------------

/// Records every call; can be told to fail on the n-th emit or during cleanup.
pub struct RecordingSink {
    journal: Journal,
    emits: usize,
    pub fail_emit_at: Option<usize>,
    pub fail_destroy: bool,
    pub fail_close: bool,
}

impl RecordingSink {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: Rc::clone(journal),
            emits: 0,
            fail_emit_at: None,
            fail_destroy: false,
            fail_close: false,
        }
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, record: &EventRecord) -> Result<(), PlatformError> {
        let index = self.emits;
        self.emits += 1;
        if self.fail_emit_at == Some(index) {
            return Err(PlatformError::Write {
                path: PathBuf::from("/dev/uinput"),
                source: io::Error::from(io::ErrorKind::BrokenPipe),
            });
        }
        self.journal.borrow_mut().push(Op::Emit(*record));
        Ok(())
    }

    fn destroy(&mut self) -> Result<(), PlatformError> {
        self.journal.borrow_mut().push(Op::Destroy);
        if self.fail_destroy {
            return Err(PlatformError::Destroy {
                path: PathBuf::from("/dev/uinput"),
                source: io::Error::from(io::ErrorKind::Other),
            });
        }
        Ok(())
    }

    fn close(self) -> Result<(), PlatformError> {
        self.journal.borrow_mut().push(Op::CloseSink);
        if self.fail_close {
            return Err(PlatformError::Close {
                path: PathBuf::from("/dev/uinput"),
                source: io::Error::from(io::ErrorKind::Other),
            });
        }
        Ok(())
    }
}
