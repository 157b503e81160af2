use std::cell::RefCell;
use std::rc::Rc;

use trellis_testing::prelude::*;

use trellis_core::descriptor::{NodeDescriptor, SlotRange, TemplateShape};
use trellis_core::dispatch::handler;
use trellis_core::error::BindError;
use trellis_core::outputs::{Subscribable, Subscription};
use trellis_core::view::{ViewInstance, ViewSlot};
use trellis_core::{CreatePass, Emitter, HostEnv};

#[test]
fn emitter_delivers_to_every_subscriber() {
    let emitter = Emitter::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let first = seen.clone();
    let second = seen.clone();
    let sub_a = emitter.subscribe(Rc::new(move |_| first.borrow_mut().push("a")));
    let sub_b = emitter.subscribe(Rc::new(move |_| second.borrow_mut().push("b")));
    assert_eq!(emitter.listener_count(), 2);

    emitter.emit(&payload(()));
    assert_eq!(*seen.borrow(), vec!["a", "b"]);

    sub_a.unsubscribe();
    emitter.emit(&payload(()));
    assert_eq!(*seen.borrow(), vec!["a", "b", "b"]);

    sub_b.unsubscribe();
    assert_eq!(emitter.listener_count(), 0);
}

#[test]
fn a_listener_may_unsubscribe_another_during_delivery() {
    let emitter = Emitter::new();
    let hits = Rc::new(RefCell::new(0));
    let parked: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

    let stealing = parked.clone();
    let _sub_a = emitter.subscribe(Rc::new(move |_| {
        if let Some(sub) = stealing.borrow_mut().take() {
            sub.unsubscribe();
        }
    }));
    let counter = hits.clone();
    let sub_b = emitter.subscribe(Rc::new(move |_| *counter.borrow_mut() += 1));
    *parked.borrow_mut() = Some(sub_b);

    // Delivery works off a snapshot, so the round in flight still reaches the
    // listener being removed.
    emitter.emit(&payload(()));
    assert_eq!(*hits.borrow(), 1);
    assert_eq!(emitter.listener_count(), 1);

    emitter.emit(&payload(()));
    assert_eq!(*hits.borrow(), 1);
}

/// Relay node with a direct output at slot 1 and a host-delegated one at
/// slot 2, both declared under the event name "selected".
fn relay_view(
    env: Rc<HostEnv>,
    direct: &Emitter,
    delegated: &Emitter,
) -> (Rc<TemplateShape>, Rc<ViewInstance>) {
    let template = Rc::new(TemplateShape::new());
    let mut node = NodeDescriptor::other(0);
    node.declare_output("selected", 1, "selected");
    node.declare_host_output("selected", 2, "selection");
    node.register_unit::<StubUnit>(SlotRange::single(1));
    node.register_unit::<HostStubUnit>(SlotRange::single(2));
    template.push_node(node);

    let view = ViewInstance::new(template.clone(), env);
    view.push_slot(ViewSlot::Context(Rc::new(())));
    view.push_slot(ViewSlot::Unit(Rc::new(
        StubUnit::new().with_output("selected", direct.clone()),
    )));
    view.push_slot(ViewSlot::Unit(Rc::new(
        HostStubUnit::new().with_output("selection", delegated.clone()),
    )));
    (template, view)
}

#[test]
fn declared_outputs_fan_out_to_direct_and_host_targets() {
    let renderer = RecordingRenderer::new();
    let env = test_env(&renderer);
    let direct = Emitter::new();
    let delegated = Emitter::new();
    let (template, view) = relay_view(env, &direct, &delegated);

    let hits = Rc::new(RefCell::new(0));
    let counter = hits.clone();
    let mut pass = CreatePass::new(&view, 0).unwrap();
    pass.listen("selected", handler(move |_| *counter.borrow_mut() += 1))
        .unwrap();
    template.complete_first_pass();

    assert_eq!(direct.listener_count(), 1);
    assert_eq!(delegated.listener_count(), 1);

    direct.emit(&payload(()));
    delegated.emit(&payload(()));
    assert_eq!(*hits.borrow(), 2);

    view.destroy().unwrap();
    assert_eq!(direct.listener_count(), 0);
    assert_eq!(delegated.listener_count(), 0);
}

#[test]
fn a_non_subscribable_property_fails_under_validation() {
    let renderer = RecordingRenderer::new();
    let env = test_env(&renderer);
    let template = Rc::new(TemplateShape::new());
    let mut node = NodeDescriptor::other(0);
    node.declare_output("toggle", 1, "missing");
    template.push_node(node);
    let view = ViewInstance::new(template, env);
    view.push_slot(ViewSlot::Context(Rc::new(())));
    view.push_slot(ViewSlot::Unit(Rc::new(StubUnit::new())));

    let mut pass = CreatePass::new(&view, 0).unwrap();
    assert_eq!(
        pass.listen("toggle", handler(|_| {})).err(),
        Some(BindError::NotSubscribable {
            property: "missing".to_string(),
            slot: 1,
        })
    );
}

#[test]
fn production_mode_skips_unmatched_declarations() {
    let renderer = RecordingRenderer::new();
    let env = Rc::new(HostEnv::new(Rc::new(renderer.clone())).with_validation(false));
    let template = Rc::new(TemplateShape::new());
    let mut node = NodeDescriptor::other(0);
    node.declare_output("toggle", 1, "missing");
    node.declare_output("toggle", 5, "absent");
    template.push_node(node);
    let view = ViewInstance::new(template.clone(), env);
    view.push_slot(ViewSlot::Context(Rc::new(())));
    view.push_slot(ViewSlot::Unit(Rc::new(StubUnit::new())));

    let mut pass = CreatePass::new(&view, 0).unwrap();
    assert!(pass.listen("toggle", handler(|_| {})).is_ok());
    template.complete_first_pass();
    assert!(template.ledger().is_empty());
    view.destroy().unwrap();
}

#[test]
fn a_missing_unit_slot_fails_under_validation() {
    let renderer = RecordingRenderer::new();
    let env = test_env(&renderer);
    let template = Rc::new(TemplateShape::new());
    let mut node = NodeDescriptor::other(0);
    node.declare_output("toggle", 5, "toggle");
    template.push_node(node);
    let view = ViewInstance::new(template, env);
    view.push_slot(ViewSlot::Context(Rc::new(())));

    let mut pass = CreatePass::new(&view, 0).unwrap();
    assert!(matches!(
        pass.listen("toggle", handler(|_| {})).err(),
        Some(BindError::MissingSlot { slot: 5, .. })
    ));
}

#[test]
fn listen_to_matches_the_units_own_output() {
    let renderer = RecordingRenderer::new();
    let env = test_env(&renderer);
    let emitter = Emitter::new();
    let template = Rc::new(TemplateShape::new());
    let mut node = NodeDescriptor::other(0);
    node.register_unit::<StubUnit>(SlotRange::single(1));
    template.push_node(node);
    let view = ViewInstance::new(template.clone(), env);
    view.push_slot(ViewSlot::Context(Rc::new(())));
    view.push_slot(ViewSlot::Unit(Rc::new(
        StubUnit::new().with_output("picked", emitter.clone()),
    )));

    let hits = Rc::new(RefCell::new(0));
    let counter = hits.clone();
    let mut pass = CreatePass::new(&view, 0).unwrap();
    pass.listen_to::<StubUnit>("picked", handler(move |_| *counter.borrow_mut() += 1))
        .unwrap();
    template.complete_first_pass();

    assert_eq!(emitter.listener_count(), 1);
    emitter.emit(&payload(()));
    assert_eq!(*hits.borrow(), 1);
    assert!(view.is_dirty());
    view.destroy().unwrap();
    assert_eq!(emitter.listener_count(), 0);
}

#[test]
fn listen_to_matches_host_delegations_within_the_units_slots() {
    let renderer = RecordingRenderer::new();
    let env = test_env(&renderer);
    let in_range = Emitter::new();
    let out_of_range = Emitter::new();
    let template = Rc::new(TemplateShape::new());
    let mut node = NodeDescriptor::other(0);
    node.declare_host_output("picked", 2, "selection");
    node.declare_host_output("picked", 1, "selection");
    node.register_unit::<StubUnit>(SlotRange::single(1));
    node.register_unit::<HostStubUnit>(SlotRange::single(2));
    template.push_node(node);
    let view = ViewInstance::new(template.clone(), env);
    view.push_slot(ViewSlot::Context(Rc::new(())));
    view.push_slot(ViewSlot::Unit(Rc::new(
        StubUnit::new().with_output("selection", out_of_range.clone()),
    )));
    view.push_slot(ViewSlot::Unit(Rc::new(
        HostStubUnit::new().with_output("selection", in_range.clone()),
    )));

    let mut pass = CreatePass::new(&view, 0).unwrap();
    pass.listen_to::<HostStubUnit>("picked", handler(|_| {}))
        .unwrap();
    template.complete_first_pass();

    // Only the delegation inside the named unit's slot range is honored.
    assert_eq!(in_range.listener_count(), 1);
    assert_eq!(out_of_range.listener_count(), 0);
    view.destroy().unwrap();
    assert_eq!(in_range.listener_count(), 0);
}

#[test]
fn listen_to_with_no_match_fails_under_validation() {
    let renderer = RecordingRenderer::new();
    let env = test_env(&renderer);
    let template = Rc::new(TemplateShape::new());
    let mut node = NodeDescriptor::other(0);
    node.register_unit::<StubUnit>(SlotRange::single(1));
    template.push_node(node);
    let view = ViewInstance::new(template, env);
    view.push_slot(ViewSlot::Context(Rc::new(())));
    view.push_slot(ViewSlot::Unit(Rc::new(StubUnit::new())));

    let mut pass = CreatePass::new(&view, 0).unwrap();
    let error = pass.listen_to::<StubUnit>("nope", handler(|_| {})).err();
    assert!(matches!(
        error,
        Some(BindError::UnknownOutput { event, .. }) if event == "nope"
    ));
}

#[test]
fn listen_to_with_no_match_is_silent_in_production() {
    let renderer = RecordingRenderer::new();
    let env = Rc::new(HostEnv::new(Rc::new(renderer.clone())).with_validation(false));
    let template = Rc::new(TemplateShape::new());
    let mut node = NodeDescriptor::other(0);
    node.register_unit::<StubUnit>(SlotRange::single(1));
    template.push_node(node);
    let view = ViewInstance::new(template.clone(), env);
    view.push_slot(ViewSlot::Context(Rc::new(())));
    view.push_slot(ViewSlot::Unit(Rc::new(StubUnit::new())));

    let mut pass = CreatePass::new(&view, 0).unwrap();
    assert!(pass.listen_to::<StubUnit>("nope", handler(|_| {})).is_ok());
    template.complete_first_pass();
    assert!(template.ledger().is_empty());
    view.destroy().unwrap();
}
