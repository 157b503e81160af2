//! Testing utilities and harness for Trellis.

pub mod probes;
pub mod renderer;
pub mod units;

pub use probes::*;
pub use renderer::*;
pub use units::*;

use std::rc::Rc;

use trellis_core::{EventPayload, HostEnv};

/// Host environment around a recording renderer, with validation enabled the
/// way tests want it regardless of build profile.
pub fn test_env(renderer: &RecordingRenderer) -> Rc<HostEnv> {
    Rc::new(HostEnv::new(Rc::new(renderer.clone())).with_validation(true))
}

/// Wraps a value as an event payload.
pub fn payload<T: 'static>(value: T) -> EventPayload {
    Rc::new(value)
}

pub mod prelude {
    pub use crate::probes::*;
    pub use crate::renderer::*;
    pub use crate::units::*;
    pub use crate::{payload, test_env};
}
