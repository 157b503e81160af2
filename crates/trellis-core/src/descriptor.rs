//! Static per-template-shape metadata.
//!
//! A [`NodeDescriptor`] is built during the first creation pass of a template
//! and shared read-only by every later instantiation of that template. The
//! enclosing [`TemplateShape`] enforces the single-writer discipline with its
//! first-pass flag.

use std::any::TypeId;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use ahash::AHashMap;
use indexmap::IndexMap;

use crate::cleanup::CleanupLedger;
use crate::unit::BehaviorUnit;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Container,
    Other,
}

/// Half-open range of behavior-unit slot indices within a view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotRange {
    pub start: usize,
    pub end: usize,
}

impl SlotRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn single(slot: usize) -> Self {
        Self {
            start: slot,
            end: slot + 1,
        }
    }

    pub fn contains(&self, slot: usize) -> bool {
        slot >= self.start && slot < self.end
    }

    fn cover(self, other: SlotRange) -> SlotRange {
        SlotRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// One declared output match: the unit slot exposing it and the property the
/// live value is read from.
#[derive(Clone, Debug)]
pub struct OutputTarget {
    pub slot: usize,
    pub property: Rc<str>,
}

pub struct NodeDescriptor {
    kind: NodeKind,
    index: usize,
    host_view_slot: Option<usize>,
    unit_slots: Option<SlotRange>,
    outputs: IndexMap<Rc<str>, Vec<OutputTarget>>,
    host_outputs: IndexMap<Rc<str>, Vec<OutputTarget>>,
    unit_ranges: AHashMap<TypeId, SlotRange>,
}

impl NodeDescriptor {
    fn new(kind: NodeKind, index: usize) -> Self {
        Self {
            kind,
            index,
            host_view_slot: None,
            unit_slots: None,
            outputs: IndexMap::new(),
            host_outputs: IndexMap::new(),
            unit_ranges: AHashMap::new(),
        }
    }

    pub fn element(index: usize) -> Self {
        Self::new(NodeKind::Element, index)
    }

    pub fn container(index: usize) -> Self {
        Self::new(NodeKind::Container, index)
    }

    pub fn other(index: usize) -> Self {
        Self::new(NodeKind::Other, index)
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Slot index of this node's handle within its view.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    /// Marks this node as a component host whose own view lives at `slot`.
    pub fn set_host_view(&mut self, slot: usize) {
        self.host_view_slot = Some(slot);
    }

    pub fn host_view_slot(&self) -> Option<usize> {
        self.host_view_slot
    }

    pub fn set_unit_slots(&mut self, range: SlotRange) {
        self.unit_slots = Some(range);
    }

    pub fn has_units(&self) -> bool {
        self.unit_slots
            .map(|range| range.end > range.start)
            .unwrap_or(false)
    }

    /// Declares that the unit at `slot` exposes an output named `event`,
    /// readable from `property` on the unit instance.
    pub fn declare_output(&mut self, event: &str, slot: usize, property: &str) {
        self.outputs
            .entry(Rc::from(event))
            .or_default()
            .push(OutputTarget {
                slot,
                property: Rc::from(property),
            });
        self.cover_unit_slots(SlotRange::single(slot));
    }

    /// Same as [`declare_output`](Self::declare_output), for outputs exposed
    /// through a host-delegated unit.
    pub fn declare_host_output(&mut self, event: &str, slot: usize, property: &str) {
        self.host_outputs
            .entry(Rc::from(event))
            .or_default()
            .push(OutputTarget {
                slot,
                property: Rc::from(property),
            });
        self.cover_unit_slots(SlotRange::single(slot));
    }

    /// Records the resolved slot range of a unit type on this node.
    pub fn register_unit<U: BehaviorUnit>(&mut self, range: SlotRange) {
        self.unit_ranges.insert(TypeId::of::<U>(), range);
        self.cover_unit_slots(range);
    }

    pub fn unit_range<U: BehaviorUnit>(&self) -> Option<SlotRange> {
        self.unit_ranges.get(&TypeId::of::<U>()).copied()
    }

    pub fn outputs_for(&self, event: &str) -> &[OutputTarget] {
        self.outputs.get(event).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn host_outputs_for(&self, event: &str) -> &[OutputTarget] {
        self.host_outputs
            .get(event)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn cover_unit_slots(&mut self, range: SlotRange) {
        self.unit_slots = Some(match self.unit_slots {
            Some(current) => current.cover(range),
            None => range,
        });
    }
}

/// Shared shape of one template: node descriptors plus the per-template half
/// of the cleanup ledger. Mutated only while `first_pass` is set; read-only
/// for every instantiation after [`complete_first_pass`](Self::complete_first_pass).
pub struct TemplateShape {
    nodes: RefCell<Vec<Rc<NodeDescriptor>>>,
    ledger: CleanupLedger,
    first_pass: Cell<bool>,
}

impl TemplateShape {
    pub fn new() -> Self {
        Self {
            nodes: RefCell::new(Vec::new()),
            ledger: CleanupLedger::new(),
            first_pass: Cell::new(true),
        }
    }

    pub fn push_node(&self, descriptor: NodeDescriptor) -> Rc<NodeDescriptor> {
        debug_assert!(
            self.first_pass.get(),
            "template shape is immutable after the first creation pass"
        );
        let descriptor = Rc::new(descriptor);
        self.nodes.borrow_mut().push(descriptor.clone());
        descriptor
    }

    pub fn node(&self, index: usize) -> Option<Rc<NodeDescriptor>> {
        self.nodes
            .borrow()
            .iter()
            .find(|descriptor| descriptor.index() == index)
            .cloned()
    }

    pub fn first_pass(&self) -> bool {
        self.first_pass.get()
    }

    /// Freezes the shape. Later instantiations reuse the descriptors and the
    /// recorded ledger instead of re-recording them.
    pub fn complete_first_pass(&self) {
        self.first_pass.set(false);
    }

    pub fn ledger(&self) -> &CleanupLedger {
        &self.ledger
    }
}

impl Default for TemplateShape {
    fn default() -> Self {
        Self::new()
    }
}
