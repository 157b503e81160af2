#![doc = r"Event binding and output dispatch for the Trellis retained-mode UI runtime.

Templates call [`CreatePass::listen`] (or the ambient [`listen`]) once per
static event binding while a view is being created. The engine decides
whether a native listener is warranted, coalesces bindings that share a
`(node, event)` pair onto one native listener, fans the wrapped handler out
to every matching behavior-unit output, and records exactly what it
registered so [`ViewInstance::destroy`] can tear everything down again."]

pub mod bind;
pub mod cleanup;
pub mod descriptor;
pub mod dispatch;
pub mod env;
pub mod error;
pub mod observer;
pub mod outputs;
pub mod renderer;
pub mod unit;
pub mod view;

pub use bind::{
    enter_create_pass, listen, listen_to, listen_with, with_current_pass, CreatePass,
    ListenOptions,
};
pub use cleanup::{CleanupLedger, CleanupSlot, LedgerEntry, LedgerTarget};
pub use descriptor::{NodeDescriptor, NodeKind, OutputTarget, SlotRange, TemplateShape};
pub use dispatch::{handler, DispatchListener, EventHandler};
pub use env::{
    DefaultScheduler, HostEnv, NoopProfiler, NoopReplayStash, Profiler, RenderScheduler,
    ReplayStash,
};
pub use error::{BindError, HandlerError};
pub use outputs::{Emitter, OutputListener, Subscribable, Subscription};
pub use renderer::{
    global_target, DisposeFn, EventTarget, NativeListener, NodeHandle, Renderer, TargetResolver,
};
pub use unit::BehaviorUnit;
pub use view::{DirtySource, ViewInstance, ViewSlot};

use std::any::Any;
use std::rc::Rc;

pub type NodeId = usize;

/// Payload delivered to handlers: the native event object or an output
/// emission, opaque to the engine.
pub type EventPayload = Rc<dyn Any>;
