//! Executes lowered chains against a manager service.
//!
//! Each step runs to completion before the next begins. An invalid handle from
//! `CreateOrShow` takes the guard's exit branch; unresolved properties are skipped
//! silently unless diagnostics are requested.

use crate::binding::{BindFailure, PropertyTarget, try_bind};
use crate::error::ExecutionError;
use crate::plan::{
    ControlTarget, ExpansionPlan, Guard, InputPin, OutputPin, PinSource, Step, StepId, StepKind,
};
use crate::schema::PinRef;
use crate::value::{ManagerHandle, ObjectHandle, SlotType, Value};
use ahash::AHashMap;
use log::trace;

mod memory;
mod trace;

pub use memory::*;
pub use trace::*;

/// What `CreateOrShow` asks the manager for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShowRequest {
    pub path: String,
    pub item_id: String,
    pub priority: i64,
    pub context: ObjectHandle,
}

/// The external service that creates, finds and hands out the configured objects.
pub trait ManagerService {
    fn locate(&mut self, context: ObjectHandle) -> ManagerHandle;

    /// Returns the object for the request, creating it if needed. May be invalid.
    fn create_or_show(&mut self, manager: ManagerHandle, request: &ShowRequest) -> ObjectHandle;

    fn object_mut(&mut self, handle: ObjectHandle) -> Option<&mut dyn PropertyTarget>;
}

/// Values produced by upstream nodes, keyed by their output pin.
#[derive(Debug, Clone, Default)]
pub struct ExternalValues {
    values: AHashMap<PinRef, Value>,
}

impl ExternalValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pin: PinRef, value: Value) -> Option<Value> {
        self.values.insert(pin, value)
    }

    pub fn with(mut self, pin: PinRef, value: Value) -> Self {
        self.values.insert(pin, value);
        self
    }

    pub fn get(&self, pin: &PinRef) -> Option<&Value> {
        self.values.get(pin)
    }
}

/// Why a property step had no effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedReason {
    Binding(BindFailure),
    /// The manager no longer knows the handle.
    ObjectUnavailable,
}

/// A property step that did not take effect, collected when diagnostics are on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedBinding {
    pub step: StepId,
    pub property: String,
    pub object_type: Option<String>,
    pub reason: UnresolvedReason,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    /// The node's output handle. Invalid when `CreateOrShow` failed.
    pub output: ObjectHandle,
    pub trace: ExecutionTrace,
    /// Always empty unless the runner was built with diagnostics.
    pub unresolved: Vec<UnresolvedBinding>,
}

#[derive(Debug, Clone, Copy)]
enum Produced {
    Manager(ManagerHandle),
    Handle(ObjectHandle),
    Success(bool),
}

/// Runs one expansion plan.
pub struct ChainRunner<'p> {
    plan: &'p ExpansionPlan,
    diagnostics: bool,
}

impl<'p> ChainRunner<'p> {
    pub fn new(plan: &'p ExpansionPlan) -> Self {
        Self {
            plan,
            diagnostics: false,
        }
    }

    /// Collects unresolved property bindings into [`RunOutcome::unresolved`].
    pub fn with_diagnostics(mut self, enabled: bool) -> Self {
        self.diagnostics = enabled;
        self
    }

    pub fn run<M: ManagerService + ?Sized>(
        &self,
        manager: &mut M,
        external: &ExternalValues,
        context: ObjectHandle,
    ) -> Result<RunOutcome, ExecutionError> {
        let mut run = Run {
            plan: self.plan,
            external,
            context,
            produced: AHashMap::new(),
            trace: ExecutionTrace::new(&self.plan.node_id),
            unresolved: Vec::new(),
            diagnostics: self.diagnostics,
        };

        let mut cursor = self
            .plan
            .entry()
            .ok_or_else(|| ExecutionError::MalformedPlan(self.plan.node_id.clone()))?;
        let mut executed = 0;
        loop {
            // A well-formed chain runs every step at most once.
            executed += 1;
            if executed > self.plan.steps.len() {
                return Err(ExecutionError::MalformedPlan(format!(
                    "control flow of '{}' loops back to {}",
                    self.plan.node_id, cursor
                )));
            }
            let step = self
                .plan
                .step(cursor)
                .ok_or_else(|| ExecutionError::MalformedPlan(format!("missing step {}", cursor)))?;
            run.execute(step, manager)?;

            match run.next(step)? {
                ControlTarget::Step(next) => cursor = next,
                ControlTarget::Exit => break,
            }
        }

        let output = match &self.plan.output {
            PinSource::Step { step, pin } => match run.produced.get(&(*step, *pin)) {
                Some(Produced::Handle(handle)) => *handle,
                _ => {
                    return Err(ExecutionError::MalformedPlan(format!(
                        "node output {}.{} was never produced",
                        step, pin
                    )));
                }
            },
            other => {
                return Err(ExecutionError::MalformedPlan(format!(
                    "node output is bound to {}",
                    other
                )));
            }
        };
        Ok(RunOutcome {
            output,
            trace: run.trace,
            unresolved: run.unresolved,
        })
    }
}

struct Run<'a> {
    plan: &'a ExpansionPlan,
    external: &'a ExternalValues,
    context: ObjectHandle,
    produced: AHashMap<(StepId, OutputPin), Produced>,
    trace: ExecutionTrace,
    unresolved: Vec<UnresolvedBinding>,
    diagnostics: bool,
}

impl Run<'_> {
    fn execute<M: ManagerService + ?Sized>(
        &mut self,
        step: &Step,
        manager: &mut M,
    ) -> Result<(), ExecutionError> {
        match &step.kind {
            StepKind::Locate => {
                let context = self.object_input(step, InputPin::Context)?;
                let handle = manager.locate(context);
                self.produced
                    .insert((step.id, OutputPin::Manager), Produced::Manager(handle));
                self.trace.push(StepTrace::Located {
                    step: step.id,
                    manager: handle,
                });
            }
            StepKind::CreateOrShow => {
                let manager_handle = self.manager_input(step)?;
                let request = ShowRequest {
                    path: self.string_input(step, InputPin::Path)?,
                    item_id: self.string_input(step, InputPin::ItemId)?,
                    priority: self.integer_input(step, InputPin::Priority)?,
                    context: self.object_input(step, InputPin::Context)?,
                };
                let handle = manager.create_or_show(manager_handle, &request);
                self.produced
                    .insert((step.id, OutputPin::Handle), Produced::Handle(handle));
                self.trace.push(StepTrace::Created {
                    step: step.id,
                    path: request.path,
                    item_id: request.item_id,
                    handle,
                });
            }
            StepKind::SetNamedProperty {
                property,
                value_type,
            } => {
                let target = self.object_input(step, InputPin::Target)?;
                let value = self.typed_input(step, InputPin::Value, *value_type)?;
                let bound = self.bind(step, manager, target, property, &value, *value_type);
                self.produced
                    .insert((step.id, OutputPin::Success), Produced::Success(bound));
                self.trace.push(StepTrace::Bound {
                    step: step.id,
                    property: property.clone(),
                    bound,
                });
            }
        }
        Ok(())
    }

    fn bind<M: ManagerService + ?Sized>(
        &mut self,
        step: &Step,
        manager: &mut M,
        handle: ObjectHandle,
        property: &str,
        value: &Value,
        value_type: SlotType,
    ) -> bool {
        let (object_type, result) = match manager.object_mut(handle) {
            Some(target) => (
                Some(target.type_name().to_string()),
                try_bind(target, property, value, value_type).map_err(UnresolvedReason::Binding),
            ),
            None => (None, Err(UnresolvedReason::ObjectUnavailable)),
        };
        match result {
            Ok(()) => true,
            Err(reason) => {
                trace!(
                    "Node '{}': property '{}' not bound on {}: {:?}",
                    self.plan.node_id, property, handle, reason
                );
                if self.diagnostics {
                    self.unresolved.push(UnresolvedBinding {
                        step: step.id,
                        property: property.to_string(),
                        object_type,
                        reason,
                    });
                }
                false
            }
        }
    }

    /// Picks the outgoing control edge whose guard holds.
    fn next(&mut self, step: &Step) -> Result<ControlTarget, ExecutionError> {
        let handle_valid = match self.produced.get(&(step.id, OutputPin::Handle)) {
            Some(Produced::Handle(handle)) => Some(handle.is_valid()),
            _ => None,
        };
        let edge = self
            .plan
            .successors(step.id)
            .find(|edge| match edge.guard {
                Guard::Always => true,
                Guard::IfValid => handle_valid == Some(true),
                Guard::IfInvalid => handle_valid == Some(false),
            })
            .ok_or_else(|| {
                ExecutionError::MalformedPlan(format!("no control edge leaves {}", step.id))
            })?;

        if edge.guard == Guard::IfInvalid {
            let skipped = self
                .plan
                .steps
                .iter()
                .filter(|s| s.id > step.id)
                .filter_map(|s| match &s.kind {
                    StepKind::SetNamedProperty { property, .. } => Some(property.clone()),
                    _ => None,
                })
                .collect();
            self.trace.push(StepTrace::ShortCircuited {
                step: step.id,
                skipped,
            });
        }
        Ok(edge.to)
    }

    fn source<'s>(&self, step: &'s Step, pin: InputPin) -> Result<&'s PinSource, ExecutionError> {
        step.input(pin)
            .ok_or_else(|| ExecutionError::MalformedPlan(format!("{} has no {} input", step.id, pin)))
    }

    fn resolve_value(&self, step: StepId, source: &PinSource) -> Result<Value, ExecutionError> {
        match source {
            PinSource::Literal(value) => Ok(value.clone()),
            PinSource::External(pin) => {
                self.external
                    .get(pin)
                    .cloned()
                    .ok_or_else(|| ExecutionError::MissingExternalValue {
                        step,
                        link: pin.clone(),
                    })
            }
            PinSource::Step { step: from, pin } => match self.produced.get(&(*from, *pin)) {
                Some(Produced::Handle(handle)) => Ok(Value::Object(*handle)),
                Some(Produced::Success(bound)) => Ok(Value::Bool(*bound)),
                Some(Produced::Manager(_)) | None => {
                    Err(ExecutionError::UnavailableStepOutput { step, from: *from })
                }
            },
            PinSource::ImplicitContext => Ok(Value::Object(self.context)),
        }
    }

    fn typed_input(
        &self,
        step: &Step,
        pin: InputPin,
        expected: SlotType,
    ) -> Result<Value, ExecutionError> {
        let value = self.resolve_value(step.id, self.source(step, pin)?)?;
        value
            .coerce_to(expected)
            .ok_or_else(|| ExecutionError::InputTypeMismatch {
                step: step.id,
                pin: pin.to_string(),
                expected: expected.to_string(),
                found: value.to_string(),
            })
    }

    fn string_input(&self, step: &Step, pin: InputPin) -> Result<String, ExecutionError> {
        match self.typed_input(step, pin, SlotType::String)? {
            Value::String(s) => Ok(s),
            other => Err(mismatch(step, pin, "String", &other)),
        }
    }

    fn integer_input(&self, step: &Step, pin: InputPin) -> Result<i64, ExecutionError> {
        match self.typed_input(step, pin, SlotType::Integer)? {
            Value::Integer(i) => Ok(i),
            other => Err(mismatch(step, pin, "Integer", &other)),
        }
    }

    fn object_input(&self, step: &Step, pin: InputPin) -> Result<ObjectHandle, ExecutionError> {
        match self.typed_input(step, pin, SlotType::Object)? {
            Value::Object(handle) => Ok(handle),
            other => Err(mismatch(step, pin, "Object", &other)),
        }
    }

    fn manager_input(&self, step: &Step) -> Result<ManagerHandle, ExecutionError> {
        match self.source(step, InputPin::Manager)? {
            PinSource::Step { step: from, pin } => match self.produced.get(&(*from, *pin)) {
                Some(Produced::Manager(handle)) => Ok(*handle),
                _ => Err(ExecutionError::UnavailableStepOutput {
                    step: step.id,
                    from: *from,
                }),
            },
            other => Err(ExecutionError::MalformedPlan(format!(
                "{} takes its manager from {}",
                step.id, other
            ))),
        }
    }
}

fn mismatch(step: &Step, pin: InputPin, expected: &str, found: &Value) -> ExecutionError {
    ExecutionError::InputTypeMismatch {
        step: step.id,
        pin: pin.to_string(),
        expected: expected.to_string(),
        found: found.to_string(),
    }
}
