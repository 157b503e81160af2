//! Counting and recording doubles for the host capabilities.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use trellis_core::{
    EventTarget, HandlerError, NativeListener, Profiler, RenderScheduler, ReplayStash,
    ViewInstance,
};

#[derive(Default)]
struct ProfilerCounts {
    starts: Cell<usize>,
    ends: Cell<usize>,
}

#[derive(Clone, Default)]
pub struct CountingProfiler {
    counts: Rc<ProfilerCounts>,
}

impl CountingProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starts(&self) -> usize {
        self.counts.starts.get()
    }

    pub fn ends(&self) -> usize {
        self.counts.ends.get()
    }
}

impl Profiler for CountingProfiler {
    fn handler_start(&self, _event: &str, _node_index: usize) {
        self.counts.starts.set(self.counts.starts.get() + 1);
    }

    fn handler_end(&self, _event: &str, _node_index: usize) {
        self.counts.ends.set(self.counts.ends.get() + 1);
    }
}

/// Replay-stash double recording the event name of every native registration.
#[derive(Clone, Default)]
pub struct RecordingStash {
    events: Rc<RefCell<Vec<String>>>,
}

impl RecordingStash {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stashed(&self) -> Vec<String> {
        self.events.borrow().clone()
    }
}

impl ReplayStash for RecordingStash {
    fn stash(&self, _target: &EventTarget, event: &str, _listener: &NativeListener) {
        self.events.borrow_mut().push(event.to_string());
    }
}

#[derive(Clone, Default)]
pub struct CountingScheduler {
    count: Rc<Cell<usize>>,
}

impl CountingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheduled(&self) -> usize {
        self.count.get()
    }
}

impl RenderScheduler for CountingScheduler {
    fn schedule_render(&self) {
        self.count.set(self.count.get() + 1);
    }
}

/// Collects handler errors as display strings.
#[derive(Clone, Default)]
pub struct ErrorLog {
    messages: Rc<RefCell<Vec<String>>>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs this log as the view's error handler.
    pub fn install(&self, view: &ViewInstance) {
        let messages = self.messages.clone();
        view.set_error_handler(move |error: HandlerError| {
            messages.borrow_mut().push(error.to_string());
        });
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.messages.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.borrow().is_empty()
    }
}
