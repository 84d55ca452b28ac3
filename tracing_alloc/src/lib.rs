//! A global allocator that records what the current thread allocates while a trace is running.
//!
//! ```ignore
//! #[global_allocator]
//! static ALLOCATOR: TracingAllocator = TracingAllocator::new();
//!
//! let (_, trace) = ALLOCATOR.trace(|| do_work());
//! assert!(trace.is_empty());
//! ```

use std::alloc::{
    GlobalAlloc,
    Layout,
    System,
};
use std::cell::Cell;

use parking_lot::{
    const_fair_mutex,
    FairMutex,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Event {
    Alloc { addr: usize, size: usize },
    Freed { addr: usize, size: usize },
}

impl Event {
    pub fn delta(&self) -> isize {
        match self {
            Self::Alloc { size, .. } => *size as isize,
            Self::Freed { size, .. } => -(*size as isize),
        }
    }
}

thread_local! {
    // only the thread running `trace` records, so parallel tests don't leak into each other
    static RECORDING: Cell<bool> = const { Cell::new(false) };
}

fn set_recording(on: bool) -> bool {
    RECORDING.try_with(|r| r.replace(on)).unwrap_or(false)
}

/// The allocations recorded while running a closure.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    events: Vec<Event>,
}

impl Trace {
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn allocations(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, Event::Alloc { .. }))
            .count()
    }

    pub fn frees(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, Event::Freed { .. }))
            .count()
    }

    /// Bytes allocated minus bytes freed, `0` when everything allocated was freed again.
    pub fn net_bytes(&self) -> isize {
        self.events.iter().map(Event::delta).sum()
    }
}

pub struct TracingAllocator {
    log: FairMutex<Vec<Event>>,
    session: FairMutex<()>,
}

impl TracingAllocator {
    pub const fn new() -> Self {
        Self {
            log: const_fair_mutex(Vec::new()),
            session: const_fair_mutex(()),
        }
    }

    /// Runs `f`, recording every allocation and free it makes on this thread.
    pub fn trace<R>(&self, f: impl FnOnce() -> R) -> (R, Trace) {
        struct Stop;
        impl Drop for Stop {
            fn drop(&mut self) {
                set_recording(false);
            }
        }

        // one trace at a time, each starting from an empty log
        let _session = self.session.lock();
        let mut log = self.log.lock();
        log.clear();
        log.reserve(256);
        drop(log);

        let result = {
            let _stop = Stop;
            set_recording(true);
            f()
        };

        let events = std::mem::take(&mut *self.log.lock());
        (result, Trace { events })
    }

    fn record(&self, event: Event) {
        // recording is switched off while pushing, the push itself may allocate
        if set_recording(false) {
            self.log.lock().push(event);
            set_recording(true);
        }
    }
}

impl Default for TracingAllocator {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl GlobalAlloc for TracingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc(layout);
        self.record(Event::Alloc {
            addr: ptr as usize,
            size: layout.size(),
        });
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        self.record(Event::Freed {
            addr: ptr as usize,
            size: layout.size(),
        });
        System.dealloc(ptr, layout)
    }
}
