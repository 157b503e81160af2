//! Renderer capability consumed by the binding engine.
//!
//! The engine never talks to a platform directly: it receives an opaque
//! [`Renderer`] that can attach a native listener to a target and hand back
//! the exact action that removes it again.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::{EventPayload, NodeId};

/// Opaque handle to a platform node, handed out by the host renderer and
/// stored in a view's slot array.
pub struct NodeHandle {
    id: NodeId,
}

impl NodeHandle {
    pub fn new(id: NodeId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }
}

impl fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeHandle").field("id", &self.id).finish()
    }
}

/// Dispatch target of a native listener: the node itself, or a global object
/// produced by a [`TargetResolver`].
#[derive(Clone)]
pub enum EventTarget {
    Node(Rc<NodeHandle>),
    Global(Rc<dyn Any>),
}

/// A fully wrapped listener as handed to the renderer. Returns `false` when
/// default handling should be prevented.
pub type NativeListener = Rc<dyn Fn(&EventPayload) -> bool>;

/// Action that removes a previously attached native listener. Runs at most
/// once, at view destruction.
pub type DisposeFn = Box<dyn FnOnce()>;

/// Maps the physical node (when one exists) to an alternate dispatch target,
/// e.g. a document- or window-level object.
pub type TargetResolver = Rc<dyn Fn(Option<&Rc<NodeHandle>>) -> EventTarget>;

pub trait Renderer {
    /// Attaches `listener` for `event` on `target` and returns the dispose
    /// action that detaches it. `capture` is a hint; renderers without a
    /// capture phase may ignore it.
    fn listen(
        &self,
        target: &EventTarget,
        event: &str,
        listener: NativeListener,
        capture: bool,
    ) -> DisposeFn;
}

/// Resolver that always dispatches to the given global object, ignoring the
/// physical node.
pub fn global_target(target: Rc<dyn Any>) -> TargetResolver {
    Rc::new(move |_node| EventTarget::Global(target.clone()))
}
