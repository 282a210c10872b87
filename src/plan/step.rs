use crate::schema::{PinRef, SlotId};
use crate::value::{SlotType, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a step within its plan. Assigned in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StepId(pub u32);

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// The primitive calls a create-or-show node lowers into.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepKind {
    /// Obtains the manager service for the execution context.
    Locate,
    /// Asks the manager for an object. The resulting handle may be invalid.
    CreateOrShow,
    /// Binds one named property on the object by reflection.
    SetNamedProperty {
        property: String,
        value_type: SlotType,
    },
}

impl StepKind {
    pub fn name(&self) -> &'static str {
        match self {
            StepKind::Locate => "Locate",
            StepKind::CreateOrShow => "CreateOrShow",
            StepKind::SetNamedProperty { .. } => "SetNamedProperty",
        }
    }

    pub fn outputs(&self) -> &'static [OutputPin] {
        match self {
            StepKind::Locate => &[OutputPin::Manager],
            StepKind::CreateOrShow => &[OutputPin::Handle],
            StepKind::SetNamedProperty { .. } => &[OutputPin::Success],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InputPin {
    Context,
    Manager,
    Path,
    ItemId,
    Priority,
    Target,
    Value,
}

impl fmt::Display for InputPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InputPin::Context => "context",
            InputPin::Manager => "manager",
            InputPin::Path => "path",
            InputPin::ItemId => "item_id",
            InputPin::Priority => "priority",
            InputPin::Target => "target",
            InputPin::Value => "value",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OutputPin {
    Manager,
    Handle,
    Success,
}

impl fmt::Display for OutputPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputPin::Manager => "manager",
            OutputPin::Handle => "handle",
            OutputPin::Success => "success",
        };
        f.write_str(name)
    }
}

/// Where a step input takes its value from.
///
/// There is no variant naming another node's *input* pin: external
/// values always enter through the output of an upstream producer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinSource {
    Literal(Value),
    /// A redirected link from an upstream producer's output.
    External(PinRef),
    /// The output of an earlier step in the same plan.
    Step { step: StepId, pin: OutputPin },
    /// The context of the graph that executes the chain.
    ImplicitContext,
}

impl fmt::Display for PinSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinSource::Literal(v) => write!(f, "{}", v),
            PinSource::External(pin) => write!(f, "@{}", pin),
            PinSource::Step { step, pin } => write!(f, "{}.{}", step, pin),
            PinSource::ImplicitContext => f.write_str("self"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepInput {
    pub pin: InputPin,
    pub source: PinSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Step {
    pub id: StepId,
    pub kind: StepKind,
    pub inputs: Vec<StepInput>,
    /// The parameter slot this step was lowered from, if any.
    pub origin: Option<SlotId>,
}

impl Step {
    pub fn input(&self, pin: InputPin) -> Option<&PinSource> {
        self.inputs.iter().find(|i| i.pin == pin).map(|i| &i.source)
    }
}
