//! Cleanup ledger: the shared per-template record of every registration a
//! creation pass performs, paired with the per-instance list that holds the
//! live handles.
//!
//! The two sides must correspond exactly. Every instantiation of a template
//! replays the same binding sequence, so the indices recorded during the
//! first pass address the right slots in every instance's list. A mismatch is
//! a binding/teardown bug, not a runtime condition; teardown reports it as
//! [`BindError::LedgerMismatch`](crate::error::BindError::LedgerMismatch)
//! when validation is enabled.

use std::cell::RefCell;
use std::rc::Rc;

use crate::dispatch::DispatchListener;
use crate::outputs::Subscription;
use crate::renderer::DisposeFn;

/// Where a native listener was attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedgerTarget {
    /// The node handle at this slot index.
    Node(usize),
    /// An alternate target produced by a resolver.
    Resolver,
}

/// One shared per-template record of a registration performed during the
/// first creation pass. The indices address the per-instance cleanup list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerEntry {
    NativeListener {
        event: Rc<str>,
        target: LedgerTarget,
        listener_index: usize,
        dispose_index: usize,
    },
    Subscription {
        event: Rc<str>,
        node_index: usize,
        listener_index: usize,
        subscription_index: usize,
    },
}

#[derive(Default)]
pub struct CleanupLedger {
    entries: RefCell<Vec<LedgerEntry>>,
}

impl CleanupLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_native_listener(
        &self,
        event: &str,
        target: LedgerTarget,
        listener_index: usize,
        dispose_index: usize,
    ) -> usize {
        let mut entries = self.entries.borrow_mut();
        entries.push(LedgerEntry::NativeListener {
            event: Rc::from(event),
            target,
            listener_index,
            dispose_index,
        });
        entries.len() - 1
    }

    pub fn record_subscription(
        &self,
        event: &str,
        node_index: usize,
        listener_index: usize,
        subscription_index: usize,
    ) -> usize {
        let mut entries = self.entries.borrow_mut();
        entries.push(LedgerEntry::Subscription {
            event: Rc::from(event),
            node_index,
            listener_index,
            subscription_index,
        });
        entries.len() - 1
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Snapshot of the recorded entries, in recording order.
    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.entries.borrow().clone()
    }
}

/// One slot of a per-instance cleanup list. Entries are appended in pairs,
/// `(Listener, Dispose)` for native listeners and `(Listener, Subscription)`
/// for output subscriptions, and consumed exactly once at view destruction.
pub enum CleanupSlot {
    Listener(Rc<DispatchListener>),
    Dispose(Option<DisposeFn>),
    Subscription(Option<Subscription>),
}

