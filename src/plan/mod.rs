//! The expansion plan: the intermediate form a create-or-show node lowers into.
//!
//! A plan is an ordered list of [`Step`]s joined by control edges, with data flowing
//! into step inputs from literals, redirected upstream links, or earlier steps. Plans
//! are never persisted; they are rebuilt from the node schema on every compile.

use crate::schema::{PinKey, PinRef};
use ahash::AHashMap;
use itertools::Itertools;
use serde::Serialize;
use std::fmt;

mod step;
pub mod visualizer;

pub use step::*;

/// Condition attached to a control edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Guard {
    Always,
    /// Taken when the source step's handle output is valid.
    IfValid,
    /// Taken when the source step's handle output is invalid.
    IfInvalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ControlTarget {
    Step(StepId),
    /// Leaves the chain; the node output is published.
    Exit,
}

impl fmt::Display for ControlTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlTarget::Step(id) => write!(f, "{}", id),
            ControlTarget::Exit => f.write_str("exit"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ControlEdge {
    pub from: StepId,
    pub to: ControlTarget,
    pub guard: Guard,
}

/// A non-literal data dependency of a step input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DataEdge<'a> {
    pub source: &'a PinSource,
    pub target: StepId,
    pub pin: InputPin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RedirectAction {
    /// The original link stays; a duplicate feeds the step.
    Copied,
    /// The original link is removed and re-attached to the step.
    Moved,
}

/// How one of the node's original connections was rewired onto a step input.
///
/// The host graph applies these when it splices the plan in place of the node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LinkRedirect {
    pub original: PinKey,
    pub source: PinRef,
    pub action: RedirectAction,
    pub target: StepId,
    pub pin: InputPin,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ExpansionPlan {
    pub node_id: String,
    pub steps: Vec<Step>,
    pub control: Vec<ControlEdge>,
    pub redirects: Vec<LinkRedirect>,
    /// The value published on the node's output pin.
    pub output: PinSource,
}

impl ExpansionPlan {
    pub fn step(&self, id: StepId) -> Option<&Step> {
        self.steps.get(id.0 as usize).filter(|s| s.id == id)
    }

    pub fn entry(&self) -> Option<StepId> {
        self.steps.first().map(|s| s.id)
    }

    /// Control edges leaving `from`, in plan order.
    pub fn successors(&self, from: StepId) -> impl Iterator<Item = &ControlEdge> {
        self.control.iter().filter(move |e| e.from == from)
    }

    pub fn data_edges(&self) -> Vec<DataEdge<'_>> {
        self.steps
            .iter()
            .flat_map(|step| {
                step.inputs
                    .iter()
                    .filter(|input| !matches!(input.source, PinSource::Literal(_)))
                    .map(move |input| DataEdge {
                        source: &input.source,
                        target: step.id,
                        pin: input.pin,
                    })
            })
            .collect()
    }

    /// The property names bound by this plan, in execution order.
    pub fn bound_properties(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter_map(|s| match &s.kind {
                StepKind::SetNamedProperty { property, .. } => Some(property.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Equality of everything but the node identity.
    pub fn is_isomorphic(&self, other: &ExpansionPlan) -> bool {
        self.steps == other.steps
            && self.control == other.control
            && self.redirects == other.redirects
            && self.output == other.output
    }

    /// Checks the structural invariants every lowered plan must satisfy.
    pub fn verify(&self) -> Result<(), String> {
        if self.steps.is_empty() {
            return Err("plan has no steps".to_string());
        }
        for (index, step) in self.steps.iter().enumerate() {
            if step.id.0 as usize != index {
                return Err(format!("step {} is stored at position {}", step.id, index));
            }
            if let Some(pin) = step.inputs.iter().map(|i| i.pin).duplicates().next() {
                return Err(format!("step {} has two sources for {}", step.id, pin));
            }
            for input in &step.inputs {
                self.verify_source(step, input)?;
            }
        }
        self.verify_redirects()?;
        self.verify_control()?;
        match &self.output {
            PinSource::Step {
                step,
                pin: OutputPin::Handle,
            } if self
                .step(*step)
                .is_some_and(|s| s.kind == StepKind::CreateOrShow) => Ok(()),
            other => Err(format!("node output is bound to {}, not a handle", other)),
        }
    }

    fn verify_source(&self, step: &Step, input: &StepInput) -> Result<(), String> {
        match &input.source {
            PinSource::Step { step: from, pin } => {
                let producer = self
                    .step(*from)
                    .filter(|_| *from < step.id)
                    .ok_or_else(|| format!("{} reads from later or missing step {}", step.id, from))?;
                if !producer.kind.outputs().contains(pin) {
                    return Err(format!("{} reads {}.{}, which does not exist", step.id, from, pin));
                }
            }
            PinSource::External(source) => {
                let recorded = self.redirects.iter().any(|r| {
                    r.target == step.id && r.pin == input.pin && &r.source == source
                });
                if !recorded {
                    return Err(format!(
                        "{}.{} reads {} without a recorded redirect",
                        step.id, input.pin, source
                    ));
                }
            }
            PinSource::Literal(_) | PinSource::ImplicitContext => {}
        }
        Ok(())
    }

    fn verify_redirects(&self) -> Result<(), String> {
        let mut moves: AHashMap<&PinKey, usize> = AHashMap::new();
        for redirect in &self.redirects {
            let target = self
                .step(redirect.target)
                .ok_or_else(|| format!("redirect of {} targets a missing step", redirect.source))?;
            if target.input(redirect.pin) != Some(&PinSource::External(redirect.source.clone())) {
                return Err(format!(
                    "redirect of {} does not match {}.{}",
                    redirect.source, redirect.target, redirect.pin
                ));
            }
            if redirect.action == RedirectAction::Moved {
                let count = moves.entry(&redirect.original).or_default();
                *count += 1;
                if *count > 1 {
                    return Err(format!("link on {} was moved more than once", redirect.original));
                }
            }
        }
        Ok(())
    }

    fn verify_control(&self) -> Result<(), String> {
        let mut guarded = 0;
        for step in &self.steps {
            let edges: Vec<_> = self.successors(step.id).collect();
            for edge in &edges {
                if let ControlTarget::Step(to) = edge.to {
                    if to <= step.id || self.step(to).is_none() {
                        return Err(format!("control edge {} -> {} does not go forward", step.id, to));
                    }
                }
            }
            match edges.as_slice() {
                [single] if single.guard == Guard::Always => {}
                [a, b] if a.guard == Guard::IfValid && b.guard == Guard::IfInvalid => {
                    if step.kind != StepKind::CreateOrShow {
                        return Err(format!("{} branches but produces no handle", step.id));
                    }
                    if b.to != ControlTarget::Exit {
                        return Err(format!("invalid-handle branch of {} must exit", step.id));
                    }
                    guarded += 1;
                }
                _ => return Err(format!("{} has malformed control edges", step.id)),
            }
        }
        if guarded != 1 {
            return Err(format!("expected exactly one handle guard, found {}", guarded));
        }

        // Every step is reached exactly once when walking the valid path.
        let mut cursor = self.entry();
        let mut visited = 0;
        while let Some(current) = cursor {
            visited += 1;
            cursor = self
                .successors(current)
                .find(|e| e.guard != Guard::IfInvalid)
                .and_then(|e| match e.to {
                    ControlTarget::Step(next) => Some(next),
                    ControlTarget::Exit => None,
                });
            if visited > self.steps.len() {
                return Err("control flow loops".to_string());
            }
        }
        if visited != self.steps.len() {
            return Err(format!(
                "only {} of {} steps are reachable",
                visited,
                self.steps.len()
            ));
        }
        Ok(())
    }
}
