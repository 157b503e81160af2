//! Stub behavior units exposing named emitter outputs.

use std::rc::Rc;

use trellis_core::{BehaviorUnit, Emitter, Subscribable};

/// Behavior unit whose outputs are plain emitters registered by name.
#[derive(Default)]
pub struct StubUnit {
    outputs: Vec<(String, Emitter)>,
}

impl StubUnit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(mut self, property: &str, emitter: Emitter) -> Self {
        self.outputs.push((property.to_string(), emitter));
        self
    }
}

impl BehaviorUnit for StubUnit {
    fn output(&self, property: &str) -> Option<Rc<dyn Subscribable>> {
        self.outputs
            .iter()
            .find(|(name, _)| name == property)
            .map(|(_, emitter)| Rc::new(emitter.clone()) as Rc<dyn Subscribable>)
    }
}

/// Second stub unit type, for tests that need a distinct unit type on the
/// same node (e.g. targeted bind-by-type lookups).
#[derive(Default)]
pub struct HostStubUnit {
    outputs: Vec<(String, Emitter)>,
}

impl HostStubUnit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(mut self, property: &str, emitter: Emitter) -> Self {
        self.outputs.push((property.to_string(), emitter));
        self
    }
}

impl BehaviorUnit for HostStubUnit {
    fn output(&self, property: &str) -> Option<Rc<dyn Subscribable>> {
        self.outputs
            .iter()
            .find(|(name, _)| name == property)
            .map(|(_, emitter)| Rc::new(emitter.clone()) as Rc<dyn Subscribable>)
    }
}
