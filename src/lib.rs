//! # Tenkai - Dynamic-Parameter Node Lowering
//!
//! **Tenkai** expands a single high-level graph node, "create or show an item and
//! configure an arbitrary set of named properties on it", into a deterministic chain of
//! primitive call steps, and provides the reflection-style property binder that chain
//! relies on at run time.
//!
//! ## Core Workflow
//!
//! 1.  **Author**: Build or load a `GraphDocument`. Each `NodeSchema` carries fixed
//!     locator pins (path, item id, priority, context) and an ordered, renamable,
//!     retypable list of parameter slots, edited through the `SlotEditor` surface.
//! 2.  **Lower**: Use `Compiler::builder` to turn every node into an `ExpansionPlan`:
//!     `Locate`, `CreateOrShow`, then one `SetNamedProperty` per slot, guarded so an
//!     invalid handle skips straight to the output.
//! 3.  **Run**: Execute a plan with a `ChainRunner` against any `ManagerService`. Properties
//!     are resolved by name on whatever object the manager returns; misses are silent
//!     unless diagnostics are requested.
//!
//! ## Quick Start
//!
//! ```rust
//! use tenkai::prelude::*;
//!
//! # fn main() -> Result<()> {
//! // 1. Author a node: show UI/Popup with two string properties.
//! let mut node = NodeSchema::new("show_popup");
//! node.set_path(Some("UI"));
//! node.set_item_id(Some("Popup"));
//! node.set_priority(Some(10));
//! node.add_slot_with_default(Some("Title"), Value::String("Alert".into()));
//! node.add_slot_with_default(Some("Message"), Value::String("Saved".into()));
//!
//! // 2. Lower the document.
//! let lowered = Compiler::builder(GraphDocument::with_nodes(vec![node]))
//!     .build()
//!     .compile()?;
//! let plan = &lowered[0].plan;
//! assert_eq!(plan.bound_properties(), ["Title", "Message"]);
//!
//! // 3. Run it against an in-memory manager.
//! let mut manager = MemoryManager::new();
//! manager.register_descriptor(
//!     "UI",
//!     "Popup",
//!     TypeDescriptor::new("Popup")
//!         .with_property("Title", SlotType::String)
//!         .with_property("Message", SlotType::String),
//! );
//! let outcome = ChainRunner::new(plan).run(&mut manager, &ExternalValues::new(), ObjectHandle::INVALID)?;
//! assert!(outcome.output.is_valid());
//! println!("{}", TraceFormatter::format_trace(&outcome.trace));
//! # Ok(())
//! # }
//! ```

pub mod binding;
pub mod compiler;
pub mod error;
pub mod plan;
pub mod prelude;
pub mod runtime;
pub mod schema;
pub mod value;
