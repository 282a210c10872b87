//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the tenkai crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use tenkai::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let document = GraphDocument::from_file("path/to/graph.json")?;
//! let lowered = Compiler::builder(document).build().compile()?;
//!
//! for node in &lowered {
//!     println!("{}", visualize_plan(&node.plan));
//! }
//! # Ok(())
//! # }
//! ```

// Authoring
pub use crate::schema::{
    Connection, FixedSlot, GraphDocument, IntoDocument, LinkMode, NodeSchema, ParameterSlot,
    PinKey, PinRef, SlotCommand, SlotDescriptor, SlotEditor, SlotId, apply_command,
};

// Lowering
pub use crate::compiler::{Compiler, LoweredNode, lower_node};
pub use crate::plan::visualizer::visualize_plan;
pub use crate::plan::{ExpansionPlan, PinSource, Step, StepId, StepKind};

// Binding and execution
pub use crate::binding::{DynamicObject, PropertyTarget, TypeDescriptor, bind_property};
pub use crate::runtime::{
    CatalogEntry, ChainRunner, ExternalValues, ManagerService, MemoryManager, RunOutcome,
    ShowRequest, TraceFormatter,
};
pub use crate::value::{ObjectHandle, SlotType, Value};

// Error types
pub use crate::error::{
    CompileError, ExecutionError, LoweringError, SchemaError, SchemaWarning,
};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
