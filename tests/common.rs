//! Common test utilities for building node schemas and runtime fixtures.
use tenkai::prelude::*;
use tenkai::value::Text;

/// Creates the canonical popup node.
///
/// Fixed pins: `Path = "UI"`, `ItemId = "Popup"`, `Priority = 10`.
/// Slots: `Title: String = "Alert"`, `Message: String = "Saved"`.
#[allow(dead_code)]
pub fn create_popup_node() -> NodeSchema {
    let mut node = NodeSchema::new("show_popup");
    node.set_path(Some("UI"));
    node.set_item_id(Some("Popup"));
    node.set_priority(Some(10));
    node.add_slot_with_default(Some("Title"), Value::String("Alert".to_string()));
    node.add_slot_with_default(Some("Message"), Value::String("Saved".to_string()));
    node
}

#[allow(dead_code)]
pub fn create_popup_document() -> GraphDocument {
    GraphDocument::with_nodes(vec![create_popup_node()])
}

/// Describes the `UI/Popup` object the in-memory manager creates.
#[allow(dead_code)]
pub fn popup_descriptor() -> TypeDescriptor {
    TypeDescriptor::new("Popup")
        .with_property("Title", SlotType::String)
        .with_property("Message", SlotType::String)
        .with_property("Seconds", SlotType::Float)
}

/// A manager that knows how to create `UI/Popup`.
#[allow(dead_code)]
pub fn create_popup_manager() -> MemoryManager {
    let mut manager = MemoryManager::new();
    manager.register_descriptor("UI", "Popup", popup_descriptor());
    manager
}

/// A statically shaped target, exposed through the reflection macro.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct Toast {
    pub title: String,
    pub body: Text,
    pub count: i64,
    pub pinned: bool,
}

tenkai::reflect_properties!(Toast {
    "Title" => title: String,
    "Body" => body: Text,
    "Count" => count: i64,
    "Pinned" => pinned: bool,
});

/// Step kinds of a plan, in order, with property names inlined.
#[allow(dead_code)]
pub fn step_names(plan: &ExpansionPlan) -> Vec<String> {
    plan.steps
        .iter()
        .map(|step| match &step.kind {
            StepKind::SetNamedProperty { property, .. } => format!("SetNamedProperty({})", property),
            other => other.name().to_string(),
        })
        .collect()
}
