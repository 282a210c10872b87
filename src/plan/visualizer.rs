use super::{ControlTarget, ExpansionPlan, Guard, RedirectAction, StepKind};
use itertools::Itertools;
use std::fmt;

/// Formats a complete `ExpansionPlan` into a human-readable listing for debugging.
pub fn visualize_plan(plan: &ExpansionPlan) -> String {
    DisplayPlan { plan }.to_string()
}

/// A wrapper that renders a plan as a numbered step listing.
pub struct DisplayPlan<'a> {
    pub plan: &'a ExpansionPlan,
}

impl fmt::Display for DisplayPlan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plan = self.plan;
        writeln!(f, "======== EXPANSION PLAN for Node: {} ========", plan.node_id)?;

        writeln!(f, "\n--- STEPS ---")?;
        for step in &plan.steps {
            let args = step
                .inputs
                .iter()
                .map(|input| format!("{}={}", input.pin, input.source))
                .join(", ");
            let label = match &step.kind {
                StepKind::SetNamedProperty {
                    property,
                    value_type,
                } => format!("{}[\"{}\": {}]", step.kind.name(), property, value_type),
                other => other.name().to_string(),
            };
            writeln!(f, "{}: {:<36} ({})", step.id, label, args)?;
        }

        writeln!(f, "\n--- CONTROL ---")?;
        for edge in &plan.control {
            let guard = match edge.guard {
                Guard::Always => "",
                Guard::IfValid => " [if valid]",
                Guard::IfInvalid => " [if invalid]",
            };
            match edge.to {
                ControlTarget::Step(to) => writeln!(f, "{} -> {}{}", edge.from, to, guard)?,
                ControlTarget::Exit => writeln!(f, "{} -> exit{}", edge.from, guard)?,
            }
        }

        if !plan.redirects.is_empty() {
            writeln!(f, "\n--- LINKS ---")?;
            for redirect in &plan.redirects {
                let action = match redirect.action {
                    RedirectAction::Copied => "copy",
                    RedirectAction::Moved => "move",
                };
                writeln!(
                    f,
                    "{:<4} {} ({}) -> {}.{}",
                    action, redirect.source, redirect.original, redirect.target, redirect.pin
                )?;
            }
        }

        writeln!(f, "\nOUTPUT {}", plan.output)?;
        write!(f, "================ END OF PLAN ================")
    }
}
