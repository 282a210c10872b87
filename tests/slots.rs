//! Tests for the slot editing surface and schema migrations.
mod common;
use common::*;
use tenkai::prelude::*;
use tenkai::schema::CommandOutcome;

#[test]
fn test_added_slots_get_unique_names() {
    let mut node = create_popup_node();
    let a = SlotEditor::add_slot(&mut node, Some("Title"), SlotType::String);
    let b = SlotEditor::add_slot(&mut node, None, SlotType::Boolean);
    let c = SlotEditor::add_slot(&mut node, Some("Priority"), SlotType::Integer);

    let names: Vec<_> = node.slot_list().into_iter().map(|d| d.name).collect();
    assert_eq!(names, ["Title", "Message", "Title_1", "Param", "Priority_1"]);
    assert_eq!(node.slot(a).unwrap().name, "Title_1");
    assert_eq!(node.slot(b).unwrap().slot_type, SlotType::Boolean);
    assert_eq!(node.slot(c).unwrap().default, None);
}

#[test]
fn test_slot_ids_are_not_reused() {
    let mut node = create_popup_node();
    let extra = node.add_slot(Some("Extra"), SlotType::Float);
    node.remove_slot(extra).unwrap();
    let again = node.add_slot(Some("Extra"), SlotType::Float);
    assert_ne!(extra, again);
    assert_eq!(
        node.remove_slot(extra).unwrap_err(),
        SchemaError::SlotNotFound(extra)
    );
}

#[test]
fn test_remove_keeps_order_and_drops_wiring() {
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

    SlotEditor::remove_slot(&mut node, title).unwrap();

    let list = node.slot_list();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].name, "Message");
    assert_eq!(list[1].id, seconds);
    assert_eq!(list[1].position, 1);
    assert!(node.links().is_empty());
}

#[test]
fn test_rename_collision_is_rejected_unless_suffixed() {
    let mut node = create_popup_node();
    let message = node.slots().by_name("Message").unwrap().id;

    assert!(matches!(
        SlotEditor::rename_slot(&mut node, message, "Title"),
        Err(SchemaError::DuplicateName { .. })
    ));
    assert!(matches!(
        node.rename_slot(message, "ItemId"),
        Err(SchemaError::DuplicateName { .. })
    ));
    assert!(matches!(
        node.rename_slot(message, "  "),
        Err(SchemaError::InvalidName(_))
    ));
    // Renaming to its own name is a no-op, not a collision.
    node.rename_slot(message, "Message").unwrap();

    assert_eq!(node.rename_slot_disambiguated(message, "Title").unwrap(), "Title_1");
    assert_eq!(node.suggest_name("Title", None), "Title_2");
    assert_eq!(node.suggest_name("Title_1", Some(message)), "Title_1");
}

#[test]
fn test_rename_keeps_connection() {
    let mut node = create_popup_node();
    let title = node.slots().by_name("Title").unwrap().id;
    node.connect(
        PinKey::Slot(title),
        PinRef::new("format", "result"),
        SlotType::String,
        LinkMode::Shared,
    )
    .unwrap();

    node.rename_slot(title, "Caption").unwrap();

    let list = node.slot_list();
    assert_eq!(list[0].name, "Caption");
    assert!(list[0].connected);
    assert!(!list[1].connected);
}

#[test]
fn test_retype_drops_only_incompatible_links() {
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
        LinkMode::Shared,
    )
    .unwrap();

    let warnings = node.change_slot_type(title, SlotType::Integer).unwrap();
    assert_eq!(warnings.len(), 2);
    assert!(warnings.contains(&SchemaWarning::DefaultDiscarded {
        slot: "Title".to_string(),
        new_type: SlotType::Integer,
    }));
    assert!(warnings.contains(&SchemaWarning::LinkDropped {
        slot: "Title".to_string(),
        source: PinRef::new("format", "result"),
        source_type: SlotType::String,
        new_type: SlotType::Integer,
    }));
    assert!(node.connection(PinKey::Slot(title)).is_none());
    assert_eq!(node.slot(title).unwrap().default, None);

    let warnings = node.change_slot_type(seconds, SlotType::Integer).unwrap();
    assert!(warnings.is_empty());
    assert!(node.connection(PinKey::Slot(seconds)).is_some());

    // Lowering after a retype still succeeds.
    let plan = lower_node(&node).unwrap();
    assert_eq!(plan.steps[2].input(tenkai::plan::InputPin::Value), Some(&PinSource::Literal(Value::Integer(0))));
}

#[test]
fn test_retype_converts_compatible_default() {
    let mut node = create_popup_node();
    let count = node.add_slot_with_default(Some("Count"), Value::Integer(4));
    let warnings = node.change_slot_type(count, SlotType::Float).unwrap();
    assert!(warnings.is_empty());
    assert_eq!(node.slot(count).unwrap().default, Some(Value::Float(4.0)));
}

#[test]
fn test_connect_checks_types() {
    let mut node = create_popup_node();
    let result = node.connect_fixed(FixedSlot::Priority, PinRef::new("rank", "out"), LinkMode::Shared);
    assert!(result.is_ok());

    let title = node.slots().by_name("Title").unwrap().id;
    assert!(matches!(
        node.connect(PinKey::Slot(title), PinRef::new("n", "flag"), SlotType::Boolean, LinkMode::Shared),
        Err(SchemaError::IncompatibleLink { .. })
    ));

    let previous = node
        .connect_fixed(FixedSlot::Priority, PinRef::new("rank", "alt"), LinkMode::Shared)
        .unwrap();
    assert_eq!(previous.map(|c| c.source), Some(PinRef::new("rank", "out")));
    assert_eq!(node.links().len(), 1);
}

#[test]
fn test_commands_from_json() {
    let mut node = create_popup_node();
    let commands: Vec<SlotCommand> = serde_json::from_str(
        r#"[
            {"op": "add", "name": "Seconds", "type": "Float"},
            {"op": "add", "type": "Boolean"},
            {"op": "rename", "slot": 0, "name": "Message", "auto_suffix": true},
            {"op": "retype", "slot": 1, "type": "Text"},
            {"op": "remove", "slot": 3}
        ]"#,
    )
    .unwrap();

    let outcomes: Vec<CommandOutcome> = commands
        .into_iter()
        .map(|command| apply_command(&mut node, command).unwrap())
        .collect();

    assert_eq!(outcomes[0].slot, Some(SlotId(2)));
    assert_eq!(outcomes[1].slot, Some(SlotId(3)));
    assert_eq!(outcomes[3].warnings.len(), 1);

    let names: Vec<_> = node.slot_list().into_iter().map(|d| d.name).collect();
    assert_eq!(names, ["Message_1", "Message", "Seconds"]);
    assert_eq!(node.slot(SlotId(1)).unwrap().slot_type, SlotType::Text);
}

#[test]
fn test_failed_command_leaves_node_untouched() {
    let mut node = create_popup_node();
    let before = node.clone();
    let command = SlotCommand::Rename {
        slot: SlotId(0),
        name: "Message".to_string(),
        auto_suffix: false,
    };
    assert!(apply_command(&mut node, command).is_err());
    assert_eq!(node, before);
}

#[test]
fn test_suffixed_rename_rejects_blank_names() {
    let mut node = create_popup_node();
    let command: SlotCommand =
        serde_json::from_str(r#"{"op": "rename", "slot": 0, "name": "   ", "auto_suffix": true}"#)
            .unwrap();

    assert_eq!(
        apply_command(&mut node, command),
        Err(SchemaError::InvalidName("   ".to_string()))
    );
    assert_eq!(node.slot(SlotId(0)).unwrap().name, "Title");
    assert_eq!(
        node.rename_slot_disambiguated(SlotId(0), "   "),
        Err(SchemaError::InvalidName("   ".to_string()))
    );
}
