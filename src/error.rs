use crate::plan::StepId;
use crate::schema::{PinKey, PinRef, SlotId};
use crate::value::SlotType;
use thiserror::Error;

/// Errors raised while editing a node's slot schema.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("A slot named '{name}' already exists (slot {existing})")]
    DuplicateName { name: String, existing: String },

    #[error("Slot {0} does not exist on this node")]
    SlotNotFound(SlotId),

    #[error("'{0}' is not a valid slot name")]
    InvalidName(String),

    #[error("Default for '{slot}' must be {expected}, but a {found} literal was given")]
    DefaultTypeMismatch {
        slot: String,
        expected: SlotType,
        found: SlotType,
    },

    #[error("Pin '{pin}' of type {expected} cannot accept a {found} connection")]
    IncompatibleLink {
        pin: String,
        expected: SlotType,
        found: SlotType,
    },

    #[error("Node '{node_id}' is inconsistent: {message}")]
    Corrupt { node_id: String, message: String },
}

/// Non-fatal notices produced by schema migrations.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaWarning {
    /// A connection was removed because its source no longer fits the slot type.
    LinkDropped {
        slot: String,
        source: PinRef,
        source_type: SlotType,
        new_type: SlotType,
    },
    /// A literal default could not be converted to the new slot type.
    DefaultDiscarded { slot: String, new_type: SlotType },
}

impl std::fmt::Display for SchemaWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaWarning::LinkDropped {
                slot,
                source,
                source_type,
                new_type,
            } => write!(
                f,
                "Dropped link {} -> '{}': a {} source does not fit {}",
                source, slot, source_type, new_type
            ),
            SchemaWarning::DefaultDiscarded { slot, new_type } => {
                write!(f, "Discarded default of '{}': not convertible to {}", slot, new_type)
            }
        }
    }
}

/// Errors that make lowering of a single node impossible.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoweringError {
    #[error("Node '{node_id}': required input '{slot}' has neither a connection nor a default")]
    MissingRequiredInput { node_id: String, slot: String },

    #[error(
        "Node '{node_id}': input '{slot}' expects {expected}, but is connected to a {found} source"
    )]
    IncompatibleConnection {
        node_id: String,
        slot: String,
        expected: SlotType,
        found: SlotType,
    },

    #[error("Node '{node_id}': exclusive link {link} on {pin} cannot fan out to several steps")]
    ExclusiveFanOut {
        node_id: String,
        pin: PinKey,
        link: PinRef,
    },

    #[error("Node '{node_id}' produced a malformed plan: {message}")]
    InvalidPlan { node_id: String, message: String },
}

/// Errors that reject an entire graph build.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Node id '{0}' appears more than once in the document")]
    DuplicateNode(String),

    #[error(transparent)]
    Lowering(#[from] LoweringError),

    #[error("Failed to write debug output: {0}")]
    DebugOutput(String),
}

/// Host contract violations detected while running a lowered chain.
///
/// Soft failures (invalid handles, unresolved properties) are never reported here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("Step {step} reads {link}, but no upstream value was provided")]
    MissingExternalValue { step: StepId, link: PinRef },

    #[error("Step {step} reads output of step {from}, which has not produced it")]
    UnavailableStepOutput { step: StepId, from: StepId },

    #[error("Step {step} expected {expected} on its {pin} input, but received '{found}'")]
    InputTypeMismatch {
        step: StepId,
        pin: String,
        expected: String,
        found: String,
    },

    #[error("Malformed plan: {0}")]
    MalformedPlan(String),
}

/// Errors raised while saving or loading authoring documents and catalogs.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Binary encoding failed: {0}")]
    Encode(String),

    #[error("Binary decoding failed: {0}")]
    Decode(String),

    #[error("Unsupported document version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Errors that can occur when converting a custom authoring format into a `GraphDocument`.
#[derive(Error, Debug, Clone)]
pub enum ConversionError {
    #[error("Invalid custom data: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
