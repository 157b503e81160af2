use std::rc::Rc;

use crate::outputs::Subscribable;

/// Attached logic object on a node: a directive or a component controller.
///
/// A unit exposes its declared outputs by property name. The returned value
/// is the live output for this instance; the engine subscribes to it and
/// owns only the subscription handle, never the output itself.
pub trait BehaviorUnit: 'static {
    fn output(&self, property: &str) -> Option<Rc<dyn Subscribable>> {
        let _ = property;
        None
    }
}
