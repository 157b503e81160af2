//! The dispatch wrapper placed around every logical handler.
//!
//! One [`DispatchListener`] backs one `(node, event)` registration. Invoking
//! it marks the owning view dirty, executes the primary handler and every
//! coalesced handler in registration order with error isolation, and
//! aggregates the prevent-default signal across the whole chain.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::descriptor::NodeDescriptor;
use crate::error::HandlerError;
use crate::observer;
use crate::outputs::OutputListener;
use crate::renderer::NativeListener;
use crate::view::{DirtySource, ViewInstance};
use crate::EventPayload;

/// A logical event handler. Return `Ok(false)` to request prevent-default
/// semantics; any other success leaves default handling alone. Errors are
/// routed to the owning view's error handler and never abort the chain.
pub type EventHandler = Rc<dyn Fn(&EventPayload) -> Result<bool, HandlerError>>;

/// Adapts a plain closure into an [`EventHandler`] that never requests
/// prevent-default and never fails.
pub fn handler(f: impl Fn(&EventPayload) + 'static) -> EventHandler {
    Rc::new(move |payload| {
        f(payload);
        Ok(true)
    })
}

pub struct DispatchListener {
    descriptor: Rc<NodeDescriptor>,
    view: Weak<ViewInstance>,
    event: Rc<str>,
    primary: EventHandler,
    // Coalesced handlers in registration order. Owned here, never threaded
    // through the handler values themselves. Mutated only while binding.
    chain: RefCell<Vec<EventHandler>>,
    coalescible: bool,
}

impl DispatchListener {
    pub(crate) fn wrap(
        descriptor: Rc<NodeDescriptor>,
        view: &Rc<ViewInstance>,
        event: &str,
        primary: EventHandler,
        coalescible: bool,
    ) -> Rc<Self> {
        Rc::new(Self {
            descriptor,
            view: Rc::downgrade(view),
            event: Rc::from(event),
            primary,
            chain: RefCell::new(Vec::new()),
            coalescible,
        })
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    pub(crate) fn node_index(&self) -> usize {
        self.descriptor.index()
    }

    /// Whether later bindings on the same `(node, event)` pair may chain onto
    /// this registration. Resolver-targeted listeners never coalesce.
    pub(crate) fn coalescible(&self) -> bool {
        self.coalescible
    }

    /// The original, un-wrapped primary handler, for tooling that must invoke
    /// it directly without the dirty-marking and isolation machinery.
    pub fn unwrapped(&self) -> EventHandler {
        self.primary.clone()
    }

    pub(crate) fn chain_handler(&self, handler: EventHandler) {
        self.chain.borrow_mut().push(handler);
    }

    pub fn chain_len(&self) -> usize {
        self.chain.borrow().len()
    }

    /// Dispatches one event: marks the dirty target view (the component's own
    /// view on host nodes, otherwise the owning view), then runs the whole
    /// chain. Returns `false` when any handler requested prevent-default.
    pub fn invoke(&self, payload: &EventPayload) -> bool {
        let Some(view) = self.view.upgrade() else {
            return true;
        };
        if view.is_destroyed() {
            return true;
        }
        match self
            .descriptor
            .host_view_slot()
            .and_then(|slot| view.embedded_view(slot).ok())
        {
            Some(component) => component.mark_dirty(DirtySource::Listener),
            None => view.mark_dirty(DirtySource::Listener),
        }

        let mut allow_default = self.execute(&view, &self.primary, payload);
        let chained: Vec<EventHandler> = self.chain.borrow().clone();
        for handler in &chained {
            // Execute unconditionally; a prior prevent-default or failure
            // must not stop the rest of the chain.
            allow_default = self.execute(&view, handler, payload) && allow_default;
        }
        allow_default
    }

    /// Runs one handler with read tracking suspended and instrumentation
    /// signals around the call. A failing handler contributes "no
    /// prevent-default requested" to the aggregate.
    fn execute(
        &self,
        view: &Rc<ViewInstance>,
        handler: &EventHandler,
        payload: &EventPayload,
    ) -> bool {
        let profiler = view.env().profiler().clone();
        profiler.handler_start(&self.event, self.descriptor.index());
        let result = observer::untracked(|| handler(payload));
        profiler.handler_end(&self.event, self.descriptor.index());
        match result {
            Ok(allow_default) => allow_default,
            Err(error) => {
                view.handle_error(error);
                true
            }
        }
    }

    /// Adapter handed to the renderer.
    pub fn native_listener(self: &Rc<Self>) -> NativeListener {
        let listener = Rc::clone(self);
        Rc::new(move |payload| listener.invoke(payload))
    }

    /// Adapter handed to output subscriptions; outputs carry no
    /// prevent-default channel, so the aggregate result is dropped.
    pub(crate) fn output_listener(self: &Rc<Self>) -> OutputListener {
        let listener = Rc::clone(self);
        Rc::new(move |payload| {
            listener.invoke(payload);
        })
    }
}

