//! Ambient read-observer plumbing.
//!
//! Reactive sources report reads through [`report_read`] so the currently
//! installed observer can register a dependency. Event dispatch is not a
//! reactive read: the dispatch wrapper executes handlers under
//! [`untracked`], which suspends delivery for the duration of the call.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::thread_local;

pub type ReadObserver = Rc<dyn Fn(usize)>;

thread_local! {
    static OBSERVERS: RefCell<Vec<ReadObserver>> = RefCell::new(Vec::new());
    static SUSPENDED: Cell<usize> = Cell::new(0);
}

struct SuspendGuard;

impl Drop for SuspendGuard {
    fn drop(&mut self) {
        SUSPENDED.with(|depth| depth.set(depth.get() - 1));
    }
}

struct ObserverGuard;

impl Drop for ObserverGuard {
    fn drop(&mut self) {
        OBSERVERS.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Installs `observer` as the active read observer for the duration of `f`.
pub fn with_observer<R>(observer: ReadObserver, f: impl FnOnce() -> R) -> R {
    OBSERVERS.with(|stack| stack.borrow_mut().push(observer));
    let _guard = ObserverGuard;
    f()
}

/// Runs `f` with read tracking suspended. Nests.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    SUSPENDED.with(|depth| depth.set(depth.get() + 1));
    let _guard = SuspendGuard;
    f()
}

pub fn is_tracking() -> bool {
    SUSPENDED.with(|depth| depth.get() == 0)
        && OBSERVERS.with(|stack| !stack.borrow().is_empty())
}

/// Delivers a read of `key` to the innermost observer, unless tracking is
/// suspended or no observer is installed.
pub fn report_read(key: usize) {
    if SUSPENDED.with(|depth| depth.get() > 0) {
        return;
    }
    let observer = OBSERVERS.with(|stack| stack.borrow().last().cloned());
    if let Some(observer) = observer {
        observer(key);
    }
}
