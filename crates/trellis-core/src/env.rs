//! Host capability bundle injected into the engine at construction.
//!
//! Every hook carries a no-op default so a bare renderer is enough to run;
//! hosts override the pieces they care about.

use std::rc::Rc;

use crate::error::HandlerError;
use crate::renderer::{EventTarget, NativeListener, Renderer};

/// Server-side replay stash, called once per native-listener registration
/// before the renderer attaches it. No-op by default; a replay feature module
/// substitutes its own recorder.
pub trait ReplayStash {
    fn stash(&self, target: &EventTarget, event: &str, listener: &NativeListener);
}

#[derive(Default)]
pub struct NoopReplayStash;

impl ReplayStash for NoopReplayStash {
    fn stash(&self, _target: &EventTarget, _event: &str, _listener: &NativeListener) {}
}

/// Instrumentation signals emitted around every handler execution. Consumers
/// must not rely on these for control flow.
pub trait Profiler {
    fn handler_start(&self, event: &str, node_index: usize) {
        let _ = (event, node_index);
    }

    fn handler_end(&self, event: &str, node_index: usize) {
        let _ = (event, node_index);
    }
}

#[derive(Default)]
pub struct NoopProfiler;

impl Profiler for NoopProfiler {}

/// Poked when dirty marking reaches a clean view. How and when a re-render
/// actually runs is the host's business.
pub trait RenderScheduler {
    fn schedule_render(&self);
}

#[derive(Default)]
pub struct DefaultScheduler;

impl RenderScheduler for DefaultScheduler {
    fn schedule_render(&self) {}
}

/// Capabilities shared by every view wired to the same host.
pub struct HostEnv {
    renderer: Rc<dyn Renderer>,
    replay: Rc<dyn ReplayStash>,
    profiler: Rc<dyn Profiler>,
    scheduler: Rc<dyn RenderScheduler>,
    validate: bool,
    fallback_error_handler: Rc<dyn Fn(HandlerError)>,
}

impl HostEnv {
    pub fn new(renderer: Rc<dyn Renderer>) -> Self {
        Self {
            renderer,
            replay: Rc::new(NoopReplayStash),
            profiler: Rc::new(NoopProfiler),
            scheduler: Rc::new(DefaultScheduler),
            validate: cfg!(debug_assertions),
            fallback_error_handler: Rc::new(|error| {
                eprintln!("unhandled listener error: {error}");
            }),
        }
    }

    pub fn with_replay_stash(mut self, replay: Rc<dyn ReplayStash>) -> Self {
        self.replay = replay;
        self
    }

    pub fn with_profiler(mut self, profiler: Rc<dyn Profiler>) -> Self {
        self.profiler = profiler;
        self
    }

    pub fn with_scheduler(mut self, scheduler: Rc<dyn RenderScheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Enables or disables the bind-time misuse checks. Defaults to the build
    /// profile (`cfg!(debug_assertions)`).
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Last-resort handler for errors no view in the ancestor chain claims.
    pub fn with_fallback_error_handler(
        mut self,
        handler: impl Fn(HandlerError) + 'static,
    ) -> Self {
        self.fallback_error_handler = Rc::new(handler);
        self
    }

    pub fn renderer(&self) -> &Rc<dyn Renderer> {
        &self.renderer
    }

    pub fn replay(&self) -> &Rc<dyn ReplayStash> {
        &self.replay
    }

    pub fn profiler(&self) -> &Rc<dyn Profiler> {
        &self.profiler
    }

    pub fn scheduler(&self) -> &Rc<dyn RenderScheduler> {
        &self.scheduler
    }

    pub fn validate(&self) -> bool {
        self.validate
    }

    pub fn fallback_error_handler(&self) -> &Rc<dyn Fn(HandlerError)> {
        &self.fallback_error_handler
    }
}
