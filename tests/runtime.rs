//! Tests for executing lowered chains against a manager service.
mod common;
use common::*;
use tenkai::binding::BindFailure;
use tenkai::runtime::{StepTrace, UnresolvedReason};
use tenkai::value::Text;
use tenkai::prelude::*;

fn lower(node: &NodeSchema) -> ExpansionPlan {
    lower_node(node).expect("Failed to lower node")
}

#[test]
fn test_popup_run_sets_every_property() {
    let plan = lower(&create_popup_node());
    let mut manager = create_popup_manager();

    let outcome = ChainRunner::new(&plan)
        .run(&mut manager, &ExternalValues::new(), ObjectHandle::INVALID)
        .unwrap();

    assert!(outcome.output.is_valid());
    assert_eq!(manager.locate_count(), 1);
    assert_eq!(manager.priority(outcome.output), Some(10));

    let popup = manager.object::<DynamicObject>(outcome.output).unwrap();
    assert_eq!(popup.get("Title"), Some(&Value::String("Alert".into())));
    assert_eq!(popup.get("Message"), Some(&Value::String("Saved".into())));
    assert_eq!(popup.get("Seconds"), Some(&Value::Float(0.0)));

    assert_eq!(
        TraceFormatter::format_trace(&outcome.trace),
        "show_popup: Locate -> CreateOrShow(UI/Popup) = #1 -> Title set -> Message set"
    );
}

#[test]
fn test_second_run_shows_existing_object() {
    let plan = lower(&create_popup_node());
    let mut manager = create_popup_manager();
    let runner = ChainRunner::new(&plan);

    let first = runner
        .run(&mut manager, &ExternalValues::new(), ObjectHandle::INVALID)
        .unwrap();
    let second = runner
        .run(&mut manager, &ExternalValues::new(), ObjectHandle::INVALID)
        .unwrap();

    assert_eq!(first.output, second.output);
    assert_eq!(manager.live_objects(), 1);
    assert_eq!(manager.requests().len(), 2);
}

#[test]
fn test_invalid_handle_skips_all_property_steps() {
    let mut node = create_popup_node();
    node.set_item_id(Some("Missing"));
    let plan = lower(&node);
    let mut manager = create_popup_manager();

    let outcome = ChainRunner::new(&plan)
        .with_diagnostics(true)
        .run(&mut manager, &ExternalValues::new(), ObjectHandle::INVALID)
        .unwrap();

    assert!(!outcome.output.is_valid());
    assert_eq!(outcome.trace.properties_attempted(), 0);
    assert!(outcome.unresolved.is_empty());
    assert_eq!(
        outcome.trace.entries.last(),
        Some(&StepTrace::ShortCircuited {
            step: StepId(1),
            skipped: vec!["Title".to_string(), "Message".to_string()],
        })
    );
}

#[test]
fn test_missing_property_is_skipped_silently() {
    let mut node = create_popup_node();
    node.add_slot_with_default(Some("Colour"), Value::String("red".into()));
    node.add_slot_with_default(Some("Seconds"), Value::Float(2.5));
    let plan = lower(&node);
    let mut manager = create_popup_manager();

    let outcome = ChainRunner::new(&plan)
        .run(&mut manager, &ExternalValues::new(), ObjectHandle::INVALID)
        .unwrap();

    // The miss on Colour does not stop the chain.
    assert_eq!(outcome.trace.properties_attempted(), 4);
    assert!(outcome.unresolved.is_empty());
    let popup = manager.object::<DynamicObject>(outcome.output).unwrap();
    assert_eq!(popup.get("Seconds"), Some(&Value::Float(2.5)));
    assert_eq!(popup.get("Colour"), None);
}

#[test]
fn test_diagnostics_report_unresolved_bindings() {
    let mut node = create_popup_node();
    node.add_slot_with_default(Some("Colour"), Value::String("red".into()));
    node.add_slot_with_default(Some("Seconds"), Value::String("soon".into()));
    let plan = lower(&node);
    let mut manager = create_popup_manager();

    let outcome = ChainRunner::new(&plan)
        .with_diagnostics(true)
        .run(&mut manager, &ExternalValues::new(), ObjectHandle::INVALID)
        .unwrap();

    assert!(outcome.output.is_valid());
    assert_eq!(outcome.unresolved.len(), 2);

    let colour = &outcome.unresolved[0];
    assert_eq!(colour.property, "Colour");
    assert_eq!(colour.object_type.as_deref(), Some("Popup"));
    assert_eq!(
        colour.reason,
        UnresolvedReason::Binding(BindFailure::MissingProperty)
    );

    let seconds = &outcome.unresolved[1];
    assert_eq!(seconds.property, "Seconds");
    assert_eq!(
        seconds.reason,
        UnresolvedReason::Binding(BindFailure::TypeMismatch {
            expected: SlotType::String,
            found: SlotType::Float,
        })
    );
}

#[test]
fn test_connected_values_come_from_upstream() {
    let mut node = create_popup_node();
    let title = node.slots().by_name("Title").unwrap().id;
    let seconds = node.add_slot(Some("Seconds"), SlotType::Float);
    node.connect(
        PinKey::Slot(title),
        PinRef::new("format", "result"),
        SlotType::String,
        LinkMode::Shared,
    )
    .unwrap();
    node.connect(
        PinKey::Slot(seconds),
        PinRef::new("timer", "count"),
        SlotType::Integer,
        LinkMode::Exclusive,
    )
    .unwrap();
    let plan = lower(&node);
    let mut manager = create_popup_manager();

    let external = ExternalValues::new()
        .with(PinRef::new("format", "result"), Value::String("Upload done".into()))
        .with(PinRef::new("timer", "count"), Value::Integer(3));
    let outcome = ChainRunner::new(&plan)
        .run(&mut manager, &external, ObjectHandle::INVALID)
        .unwrap();

    let popup = manager.object::<DynamicObject>(outcome.output).unwrap();
    assert_eq!(popup.get("Title"), Some(&Value::String("Upload done".into())));
    assert_eq!(popup.get("Seconds"), Some(&Value::Float(3.0)));
}

#[test]
fn test_missing_upstream_value_is_an_error() {
    let mut node = create_popup_node();
    let message = node.slots().by_name("Message").unwrap().id;
    node.connect(
        PinKey::Slot(message),
        PinRef::new("format", "result"),
        SlotType::String,
        LinkMode::Shared,
    )
    .unwrap();
    let plan = lower(&node);
    let mut manager = create_popup_manager();

    let result = ChainRunner::new(&plan).run(
        &mut manager,
        &ExternalValues::new(),
        ObjectHandle::INVALID,
    );
    assert_eq!(
        result.unwrap_err(),
        ExecutionError::MissingExternalValue {
            step: StepId(3),
            link: PinRef::new("format", "result"),
        }
    );
}

#[test]
fn test_context_reaches_the_manager() {
    let plan = lower(&create_popup_node());
    let mut manager = create_popup_manager();
    let context = ObjectHandle::new(42);

    ChainRunner::new(&plan)
        .run(&mut manager, &ExternalValues::new(), context)
        .unwrap();
    assert_eq!(manager.requests()[0].context, context);
}

#[test]
fn test_statically_reflected_object_is_configured() {
    let mut node = NodeSchema::new("toast");
    node.set_path(Some("UI"));
    node.set_item_id(Some("Toast"));
    node.add_slot_with_default(Some("Title"), Value::String("Copied".into()));
    node.add_slot_with_default(Some("Body"), Value::Text("2 files".into()));
    node.add_slot_with_default(Some("Count"), Value::Integer(2));
    node.add_slot_with_default(Some("Pinned"), Value::Bool(true));
    let plan = lower(&node);

    let mut manager = MemoryManager::new();
    manager.register("UI", "Toast", Toast::default);
    let outcome = ChainRunner::new(&plan)
        .with_diagnostics(true)
        .run(&mut manager, &ExternalValues::new(), ObjectHandle::INVALID)
        .unwrap();

    assert!(outcome.unresolved.is_empty());
    let toast = manager.object::<Toast>(outcome.output).unwrap();
    assert_eq!(toast.title, "Copied");
    assert_eq!(toast.body, Text::from("2 files"));
    assert_eq!(toast.count, 2);
    assert!(toast.pinned);
    assert_eq!(manager.priority(outcome.output), Some(0));
}

#[test]
fn test_binding_helpers_on_reflected_target() {
    let mut toast = Toast::default();
    assert!(bind_property(&mut toast, "Count", &Value::Integer(7), SlotType::Integer));
    assert!(!bind_property(&mut toast, "Count", &Value::Float(7.5), SlotType::Float));
    assert!(!bind_property(&mut toast, "Missing", &Value::Bool(true), SlotType::Boolean));
    assert_eq!(toast.count, 7);
}

#[test]
fn test_looping_control_flow_is_reported() {
    use tenkai::plan::{ControlTarget, Guard};

    let mut plan = lower(&create_popup_node());
    let last = plan.steps.last().unwrap().id;
    let edge = plan
        .control
        .iter_mut()
        .find(|e| e.from == last)
        .unwrap();
    edge.to = ControlTarget::Step(StepId(2));
    edge.guard = Guard::Always;

    let mut manager = create_popup_manager();
    let result = ChainRunner::new(&plan).run(
        &mut manager,
        &ExternalValues::new(),
        ObjectHandle::INVALID,
    );
    assert!(matches!(result, Err(ExecutionError::MalformedPlan(_))));
}
