//! Subscribable outputs and the resolver that wires handlers to them.
//!
//! Anything a behavior unit exposes as an output implements [`Subscribable`].
//! [`Emitter`] is the concrete adapter shipped with the engine; hosts add one
//! adapter per reactive-emitter type their units use.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::cleanup::CleanupSlot;
use crate::descriptor::{NodeDescriptor, SlotRange};
use crate::dispatch::DispatchListener;
use crate::error::BindError;
use crate::view::ViewInstance;
use crate::EventPayload;

pub type OutputListener = Rc<dyn Fn(&EventPayload)>;

/// Handle returned by [`Subscribable::subscribe`]; undoes the subscription
/// exactly once.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

pub trait Subscribable {
    fn subscribe(&self, listener: OutputListener) -> Subscription;
}

#[derive(Default)]
struct EmitterInner {
    next_id: Cell<usize>,
    listeners: RefCell<Vec<(usize, OutputListener)>>,
}

/// Multicast emitter backing a behavior-unit output.
#[derive(Clone, Default)]
pub struct Emitter {
    inner: Rc<EmitterInner>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, payload: &EventPayload) {
        // Snapshot first so a listener may unsubscribe during delivery.
        let listeners: Vec<OutputListener> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(payload);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }
}

impl Subscribable for Emitter {
    fn subscribe(&self, listener: OutputListener) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner.listeners.borrow_mut().push((id, listener));
        let inner = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner
                    .listeners
                    .borrow_mut()
                    .retain(|(entry_id, _)| *entry_id != id);
            }
        })
    }
}

/// Subscribes `wrapped` to every declared output match for `event` on the
/// node: direct outputs first, then host-delegated ones. Returns how many
/// subscriptions were made.
pub(crate) fn fan_out(
    view: &Rc<ViewInstance>,
    descriptor: &NodeDescriptor,
    event: &str,
    wrapped: &Rc<DispatchListener>,
) -> Result<usize, BindError> {
    let mut count = 0;
    for target in descriptor
        .outputs_for(event)
        .iter()
        .chain(descriptor.host_outputs_for(event))
    {
        if subscribe_declared(view, descriptor.index(), event, target.slot, &target.property, wrapped)? {
            count += 1;
        }
    }
    Ok(count)
}

/// Targeted lookup for the imperative bind-by-unit-type path: host-delegated
/// registrations within the unit's slot range, then the unit's own output
/// under the event name. Returns whether anything matched.
pub(crate) fn bind_unit_outputs(
    view: &Rc<ViewInstance>,
    descriptor: &NodeDescriptor,
    range: SlotRange,
    event: &str,
    wrapped: &Rc<DispatchListener>,
) -> Result<bool, BindError> {
    let mut matched = false;
    for target in descriptor.host_outputs_for(event) {
        if range.contains(target.slot)
            && subscribe_declared(view, descriptor.index(), event, target.slot, &target.property, wrapped)?
        {
            matched = true;
        }
    }

    let unit = match view.unit(range.start) {
        Ok(unit) => unit,
        Err(error) => {
            if view.env().validate() {
                return Err(error);
            }
            return Ok(matched);
        }
    };
    if let Some(output) = unit.output(event) {
        let subscription = output.subscribe(wrapped.output_listener());
        record_subscription(view, event, descriptor.index(), wrapped, subscription);
        matched = true;
    }
    Ok(matched)
}

/// Resolves one declared `(slot, property)` output target and subscribes to
/// it. Under validation, a missing unit slot or a non-subscribable property
/// fails loudly at bind time; production mode skips the match instead.
fn subscribe_declared(
    view: &Rc<ViewInstance>,
    node_index: usize,
    event: &str,
    slot: usize,
    property: &str,
    wrapped: &Rc<DispatchListener>,
) -> Result<bool, BindError> {
    let validate = view.env().validate();
    let unit = match view.unit(slot) {
        Ok(unit) => unit,
        Err(error) => {
            if validate {
                return Err(error);
            }
            return Ok(false);
        }
    };
    let Some(output) = unit.output(property) else {
        if validate {
            return Err(BindError::NotSubscribable {
                property: property.to_string(),
                slot,
            });
        }
        return Ok(false);
    };
    let subscription = output.subscribe(wrapped.output_listener());
    record_subscription(view, event, node_index, wrapped, subscription);
    Ok(true)
}

fn record_subscription(
    view: &Rc<ViewInstance>,
    event: &str,
    node_index: usize,
    wrapped: &Rc<DispatchListener>,
    subscription: Subscription,
) {
    let listener_index = view.push_cleanup(CleanupSlot::Listener(wrapped.clone()));
    let subscription_index = view.push_cleanup(CleanupSlot::Subscription(Some(subscription)));
    if view.template().first_pass() {
        view.template().ledger().record_subscription(
            event,
            node_index,
            listener_index,
            subscription_index,
        );
    }
}

