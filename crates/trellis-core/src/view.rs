//! Live view instances: the per-instantiation half of the data model.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::cleanup::{CleanupSlot, LedgerEntry};
use crate::descriptor::TemplateShape;
use crate::dispatch::DispatchListener;
use crate::env::HostEnv;
use crate::error::{BindError, HandlerError};
use crate::renderer::NodeHandle;
use crate::unit::BehaviorUnit;

/// What triggered a dirty notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirtySource {
    /// A native or output event fired through the dispatch wrapper.
    Listener,
    /// An explicit host request.
    Manual,
}

/// One entry of a view's ordered slot array.
#[derive(Clone)]
pub enum ViewSlot {
    Unit(Rc<dyn BehaviorUnit>),
    Node(Rc<NodeHandle>),
    View(Rc<ViewInstance>),
    Context(Rc<dyn Any>),
}

/// One instantiation of a template. Holds the slot array, the per-instance
/// cleanup list, and the back-reference used for dirty propagation.
pub struct ViewInstance {
    template: Rc<TemplateShape>,
    env: Rc<HostEnv>,
    slots: RefCell<Vec<ViewSlot>>,
    cleanup: RefCell<Vec<CleanupSlot>>,
    parent: RefCell<Option<Weak<ViewInstance>>>,
    dirty: Cell<bool>,
    dirty_source: Cell<Option<DirtySource>>,
    destroyed: Cell<bool>,
    error_handler: RefCell<Option<Rc<dyn Fn(HandlerError)>>>,
}

impl ViewInstance {
    pub fn new(template: Rc<TemplateShape>, env: Rc<HostEnv>) -> Rc<Self> {
        Rc::new(Self {
            template,
            env,
            slots: RefCell::new(Vec::new()),
            cleanup: RefCell::new(Vec::new()),
            parent: RefCell::new(None),
            dirty: Cell::new(false),
            dirty_source: Cell::new(None),
            destroyed: Cell::new(false),
            error_handler: RefCell::new(None),
        })
    }

    /// New view embedded below `parent`, sharing its host environment.
    pub fn new_child(parent: &Rc<ViewInstance>, template: Rc<TemplateShape>) -> Rc<Self> {
        let view = Self::new(template, parent.env.clone());
        view.set_parent(parent);
        view
    }

    pub fn set_parent(&self, parent: &Rc<ViewInstance>) {
        *self.parent.borrow_mut() = Some(Rc::downgrade(parent));
    }

    pub fn parent(&self) -> Option<Rc<ViewInstance>> {
        self.parent.borrow().as_ref().and_then(Weak::upgrade)
    }

    pub fn template(&self) -> &Rc<TemplateShape> {
        &self.template
    }

    pub fn env(&self) -> &Rc<HostEnv> {
        &self.env
    }

    pub fn push_slot(&self, slot: ViewSlot) -> usize {
        let mut slots = self.slots.borrow_mut();
        slots.push(slot);
        slots.len() - 1
    }

    pub fn slot(&self, index: usize) -> Option<ViewSlot> {
        self.slots.borrow().get(index).cloned()
    }

    pub fn unit(&self, index: usize) -> Result<Rc<dyn BehaviorUnit>, BindError> {
        match self.slot(index) {
            Some(ViewSlot::Unit(unit)) => Ok(unit),
            _ => Err(BindError::MissingSlot {
                slot: index,
                expected: "behavior unit",
            }),
        }
    }

    pub fn node_handle(&self, index: usize) -> Result<Rc<NodeHandle>, BindError> {
        match self.slot(index) {
            Some(ViewSlot::Node(node)) => Ok(node),
            _ => Err(BindError::MissingSlot {
                slot: index,
                expected: "node handle",
            }),
        }
    }

    pub fn embedded_view(&self, index: usize) -> Result<Rc<ViewInstance>, BindError> {
        match self.slot(index) {
            Some(ViewSlot::View(view)) => Ok(view),
            _ => Err(BindError::MissingSlot {
                slot: index,
                expected: "view",
            }),
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    pub fn dirty_source(&self) -> Option<DirtySource> {
        self.dirty_source.get()
    }

    pub fn clear_dirty(&self) {
        self.dirty.set(false);
        self.dirty_source.set(None);
    }

    /// Flags this view and every ancestor as needing re-render and pokes the
    /// host scheduler when any of them transitioned from clean. Scheduling
    /// the re-render itself is the host's concern.
    pub fn mark_dirty(&self, source: DirtySource) {
        let mut transitioned = !self.dirty.replace(true);
        self.dirty_source.set(Some(source));
        let mut current = self.parent();
        while let Some(view) = current {
            transitioned |= !view.dirty.replace(true);
            view.dirty_source.set(Some(source));
            current = view.parent();
        }
        if transitioned {
            self.env.scheduler().schedule_render();
        }
    }

    pub fn set_error_handler(&self, handler: impl Fn(HandlerError) + 'static) {
        *self.error_handler.borrow_mut() = Some(Rc::new(handler));
    }

    /// Routes a handler error to this view's error handler, falling back to
    /// the parent chain and finally to the host environment.
    pub fn handle_error(&self, error: HandlerError) {
        let own = self.error_handler.borrow().clone();
        if let Some(handler) = own {
            handler(error);
            return;
        }
        if let Some(parent) = self.parent() {
            parent.handle_error(error);
            return;
        }
        (self.env.fallback_error_handler())(error);
    }

    pub(crate) fn push_cleanup(&self, slot: CleanupSlot) -> usize {
        let mut cleanup = self.cleanup.borrow_mut();
        cleanup.push(slot);
        cleanup.len() - 1
    }

    pub fn cleanup_len(&self) -> usize {
        self.cleanup.borrow().len()
    }

    /// Finds the wrapped listener already registered for `(node, event)` on
    /// this instance, if one exists and is eligible for coalescing.
    pub fn find_coalesced(
        &self,
        node_index: usize,
        event: &str,
    ) -> Option<Rc<DispatchListener>> {
        self.cleanup.borrow().iter().find_map(|slot| match slot {
            CleanupSlot::Listener(listener)
                if listener.coalescible()
                    && listener.node_index() == node_index
                    && listener.event() == event =>
            {
                Some(listener.clone())
            }
            _ => None,
        })
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    /// Tears the view down: walks the template ledger and consumes the
    /// per-instance cleanup list, running each disposer and unsubscribe
    /// exactly once. Idempotent; the second call is a no-op.
    pub fn destroy(&self) -> Result<(), BindError> {
        if self.destroyed.replace(true) {
            return Ok(());
        }
        let validate = self.env.validate();
        let entries = self.template.ledger().entries();
        let mut slots = self.cleanup.take();
        for (index, entry) in entries.iter().enumerate() {
            match entry {
                LedgerEntry::NativeListener {
                    listener_index,
                    dispose_index,
                    ..
                } => {
                    if validate && !matches!(slots.get(*listener_index), Some(CleanupSlot::Listener(_))) {
                        return Err(BindError::LedgerMismatch { index });
                    }
                    match slots.get_mut(*dispose_index) {
                        Some(CleanupSlot::Dispose(dispose)) => {
                            if let Some(dispose) = dispose.take() {
                                dispose();
                            }
                        }
                        _ if validate => return Err(BindError::LedgerMismatch { index }),
                        _ => {}
                    }
                }
                LedgerEntry::Subscription {
                    listener_index,
                    subscription_index,
                    ..
                } => {
                    if validate && !matches!(slots.get(*listener_index), Some(CleanupSlot::Listener(_))) {
                        return Err(BindError::LedgerMismatch { index });
                    }
                    match slots.get_mut(*subscription_index) {
                        Some(CleanupSlot::Subscription(subscription)) => {
                            if let Some(subscription) = subscription.take() {
                                subscription.unsubscribe();
                            }
                        }
                        _ if validate => return Err(BindError::LedgerMismatch { index }),
                        _ => {}
                    }
                }
            }
        }
        Ok(())
    }
}
