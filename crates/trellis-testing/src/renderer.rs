//! Recording renderer: remembers every `listen` call so tests can fire
//! synthetic events and count disposals.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use trellis_core::{DisposeFn, EventPayload, EventTarget, NativeListener, NodeId, Renderer};

/// Where a recorded listener was attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetLabel {
    Node(NodeId),
    Global,
}

pub struct ListenRecord {
    pub target: TargetLabel,
    pub event: String,
    pub capture: bool,
    listener: NativeListener,
    removed: Cell<bool>,
}

impl ListenRecord {
    pub fn is_removed(&self) -> bool {
        self.removed.get()
    }
}

#[derive(Default)]
struct RendererLog {
    listens: RefCell<Vec<Rc<ListenRecord>>>,
    disposed: Cell<usize>,
}

#[derive(Clone, Default)]
pub struct RecordingRenderer {
    inner: Rc<RendererLog>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total `listen` calls seen, including removed ones.
    pub fn listen_count(&self) -> usize {
        self.inner.listens.borrow().len()
    }

    /// How many dispose actions have run.
    pub fn dispose_count(&self) -> usize {
        self.inner.disposed.get()
    }

    pub fn active_count(&self) -> usize {
        self.listen_count() - self.dispose_count()
    }

    pub fn records(&self) -> Vec<Rc<ListenRecord>> {
        self.inner.listens.borrow().clone()
    }

    /// Fires a synthetic event at every live listener for `(target, event)`.
    /// Returns the aggregate allow-default result.
    pub fn fire(&self, target: TargetLabel, event: &str, payload: &EventPayload) -> bool {
        let live: Vec<Rc<ListenRecord>> = self
            .inner
            .listens
            .borrow()
            .iter()
            .filter(|record| {
                record.target == target && record.event == event && !record.removed.get()
            })
            .cloned()
            .collect();
        let mut allow_default = true;
        for record in live {
            allow_default = (record.listener)(payload) && allow_default;
        }
        allow_default
    }

    pub fn fire_node(&self, node: NodeId, event: &str, payload: &EventPayload) -> bool {
        self.fire(TargetLabel::Node(node), event, payload)
    }

    pub fn fire_global(&self, event: &str, payload: &EventPayload) -> bool {
        self.fire(TargetLabel::Global, event, payload)
    }
}

impl Renderer for RecordingRenderer {
    fn listen(
        &self,
        target: &EventTarget,
        event: &str,
        listener: NativeListener,
        capture: bool,
    ) -> DisposeFn {
        let label = match target {
            EventTarget::Node(node) => TargetLabel::Node(node.id()),
            EventTarget::Global(_) => TargetLabel::Global,
        };
        let record = Rc::new(ListenRecord {
            target: label,
            event: event.to_string(),
            capture,
            listener,
            removed: Cell::new(false),
        });
        self.inner.listens.borrow_mut().push(record.clone());
        let log = Rc::downgrade(&self.inner);
        Box::new(move || {
            record.removed.set(true);
            if let Some(log) = log.upgrade() {
                log.disposed.set(log.disposed.get() + 1);
            }
        })
    }
}
