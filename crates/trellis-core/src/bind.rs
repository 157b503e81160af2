//! The binding entry point templates call during a view's creation pass.
//!
//! `CreatePass` tracks the current view and node; template code either holds
//! one directly or reaches the installed pass through the ambient accessors,
//! the same way generated code resolves its surroundings from per-render
//! state rather than threading them through every call.

use std::cell::RefCell;
use std::rc::Rc;
use std::thread_local;

use crate::cleanup::{CleanupSlot, LedgerTarget};
use crate::descriptor::NodeDescriptor;
use crate::dispatch::{DispatchListener, EventHandler};
use crate::error::BindError;
use crate::outputs;
use crate::renderer::{EventTarget, TargetResolver};
use crate::unit::BehaviorUnit;
use crate::view::ViewInstance;

/// Options for one event binding.
#[derive(Clone, Default)]
pub struct ListenOptions {
    /// Capture-phase hint forwarded to the renderer.
    pub capture: bool,
    /// Alternate dispatch target. Bindings with a resolver never coalesce.
    pub target: Option<TargetResolver>,
}

impl ListenOptions {
    pub fn captured() -> Self {
        Self {
            capture: true,
            ..Self::default()
        }
    }

    pub fn resolved(target: TargetResolver) -> Self {
        Self {
            capture: false,
            target: Some(target),
        }
    }
}

/// Creation-pass cursor over one view: the current node every binding
/// operation applies to.
pub struct CreatePass {
    view: Rc<ViewInstance>,
    node: Rc<NodeDescriptor>,
}

impl CreatePass {
    pub fn new(view: &Rc<ViewInstance>, node_index: usize) -> Result<Self, BindError> {
        let node = view
            .template()
            .node(node_index)
            .ok_or(BindError::MissingSlot {
                slot: node_index,
                expected: "node descriptor",
            })?;
        Ok(Self {
            view: view.clone(),
            node,
        })
    }

    pub fn view(&self) -> &Rc<ViewInstance> {
        &self.view
    }

    pub fn node(&self) -> &Rc<NodeDescriptor> {
        &self.node
    }

    /// Moves the cursor to another node of the same view.
    pub fn advance_to(&mut self, node_index: usize) -> Result<&mut Self, BindError> {
        self.node = self
            .view
            .template()
            .node(node_index)
            .ok_or(BindError::MissingSlot {
                slot: node_index,
                expected: "node descriptor",
            })?;
        Ok(self)
    }

    /// Binds `event` on the current node. Called once per static binding
    /// occurrence during the creation pass; returns `self` so generated code
    /// can chain bindings.
    pub fn listen(&mut self, event: &str, handler: EventHandler) -> Result<&mut Self, BindError> {
        self.listen_with(event, handler, ListenOptions::default())
    }

    pub fn listen_with(
        &mut self,
        event: &str,
        handler: EventHandler,
        options: ListenOptions,
    ) -> Result<&mut Self, BindError> {
        if event.is_empty() {
            return Err(BindError::EmptyEvent);
        }
        if self.view.is_destroyed() {
            return Err(BindError::ViewDestroyed);
        }
        let descriptor = self.node.clone();
        let view = &self.view;
        let env = view.env().clone();
        let has_resolver = options.target.is_some();

        // A native listener is warranted for renderable elements and for
        // bindings with an external target; anything else exists purely to
        // relay behavior-unit outputs.
        if descriptor.is_element() || has_resolver {
            // Nodes without behavior units skip the coalescing search:
            // duplicate bindings cannot currently originate there. This is an
            // optimization, not an invariant a correct caller may rely on.
            if !has_resolver && descriptor.has_units() {
                if let Some(existing) = view.find_coalesced(descriptor.index(), event) {
                    // Output fan-out already happened on the first
                    // registration for this (node, event) pair.
                    existing.chain_handler(handler);
                    return Ok(self);
                }
            }

            let wrapped =
                DispatchListener::wrap(descriptor.clone(), view, event, handler, !has_resolver);
            let native = wrapped.native_listener();
            let (target, ledger_target) = match &options.target {
                Some(resolver) => {
                    let node = view.node_handle(descriptor.index()).ok();
                    (resolver(node.as_ref()), LedgerTarget::Resolver)
                }
                None => (
                    EventTarget::Node(view.node_handle(descriptor.index())?),
                    LedgerTarget::Node(descriptor.index()),
                ),
            };
            env.replay().stash(&target, event, &native);
            let dispose = env.renderer().listen(&target, event, native, options.capture);

            let listener_index = view.push_cleanup(CleanupSlot::Listener(wrapped.clone()));
            let dispose_index = view.push_cleanup(CleanupSlot::Dispose(Some(dispose)));
            if view.template().first_pass() {
                view.template().ledger().record_native_listener(
                    event,
                    ledger_target,
                    listener_index,
                    dispose_index,
                );
            }
            outputs::fan_out(view, &descriptor, event, &wrapped)?;
        } else {
            // No renderer involvement, but the handler still gets wrapped so
            // dirty marking fires when an output delivers.
            let wrapped = DispatchListener::wrap(descriptor.clone(), view, event, handler, false);
            outputs::fan_out(view, &descriptor, event, &wrapped)?;
        }
        Ok(self)
    }

    /// Imperative variant: binds `handler` against the outputs of one
    /// specific behavior-unit type on the current node. Under validation,
    /// failing to match anything is a caller error.
    pub fn listen_to<U: BehaviorUnit>(
        &mut self,
        event: &str,
        handler: EventHandler,
    ) -> Result<&mut Self, BindError> {
        if event.is_empty() {
            return Err(BindError::EmptyEvent);
        }
        if self.view.is_destroyed() {
            return Err(BindError::ViewDestroyed);
        }
        let descriptor = self.node.clone();
        let wrapped = DispatchListener::wrap(descriptor.clone(), &self.view, event, handler, false);
        let matched = match descriptor.unit_range::<U>() {
            Some(range) => {
                outputs::bind_unit_outputs(&self.view, &descriptor, range, event, &wrapped)?
            }
            None => false,
        };
        if !matched && self.view.env().validate() {
            return Err(BindError::UnknownOutput {
                unit: std::any::type_name::<U>(),
                event: event.to_string(),
            });
        }
        Ok(self)
    }
}

thread_local! {
    static CURRENT_PASS: RefCell<Vec<*mut CreatePass>> = RefCell::new(Vec::new());
}

/// Installs `pass` as the ambient creation pass for the duration of `f`.
pub fn enter_create_pass<R>(pass: &mut CreatePass, f: impl FnOnce() -> R) -> R {
    CURRENT_PASS.with(|stack| stack.borrow_mut().push(pass as *mut CreatePass));
    struct PopGuard;
    impl Drop for PopGuard {
        fn drop(&mut self) {
            CURRENT_PASS.with(|stack| {
                stack.borrow_mut().pop();
            });
        }
    }
    let _guard = PopGuard;
    f()
}

/// Runs `f` against the innermost installed creation pass.
///
/// Panics when no pass is installed.
pub fn with_current_pass<R>(f: impl FnOnce(&mut CreatePass) -> R) -> R {
    let ptr = CURRENT_PASS.with(|stack| {
        *stack
            .borrow()
            .last()
            .expect("no create pass installed")
    });
    // The pointer stays valid for the whole `enter_create_pass` scope, and
    // passes are only ever reached through this accessor while installed.
    let pass = unsafe { &mut *ptr };
    f(pass)
}

/// Binds `event` on the current node of the ambient creation pass.
pub fn listen(event: &str, handler: EventHandler) -> Result<(), BindError> {
    with_current_pass(|pass| pass.listen(event, handler).map(|_| ()))
}

pub fn listen_with(
    event: &str,
    handler: EventHandler,
    options: ListenOptions,
) -> Result<(), BindError> {
    with_current_pass(|pass| pass.listen_with(event, handler, options).map(|_| ()))
}

pub fn listen_to<U: BehaviorUnit>(event: &str, handler: EventHandler) -> Result<(), BindError> {
    with_current_pass(|pass| pass.listen_to::<U>(event, handler).map(|_| ()))
}

