use super::redirect::LinkRedirector;
use crate::error::LoweringError;
use crate::plan::{
    ControlEdge, ControlTarget, ExpansionPlan, Guard, InputPin, OutputPin, PinSource, Step,
    StepId, StepInput, StepKind,
};
use crate::schema::{FixedSlot, NodeSchema, PinKey};
use crate::value::Value;

/// Lowers one create-or-show node into its expansion plan.
///
/// The result depends on nothing but the schema and its wiring, so identical
/// schemas always lower to identical plans. The emitted chain is:
///
/// 1. `Locate` the manager for the execution context.
/// 2. `CreateOrShow` the item addressed by the fixed locator pins.
/// 3. One `SetNamedProperty` per parameter slot, in slot order.
///
/// An explicit guard after `CreateOrShow` sends an invalid handle straight to the
/// exit, skipping every property step. The `CreateOrShow` handle is the node output.
pub fn lower_node(node: &NodeSchema) -> Result<ExpansionPlan, LoweringError> {
    let mut redirector = LinkRedirector::new(node);
    let mut steps = Vec::with_capacity(node.slots().len() + 2);

    let locate = StepId(0);
    let context = context_source(&mut redirector, locate)?;
    steps.push(Step {
        id: locate,
        kind: StepKind::Locate,
        inputs: vec![StepInput {
            pin: InputPin::Context,
            source: context,
        }],
        origin: None,
    });

    let create = StepId(1);
    let mut inputs = vec![StepInput {
        pin: InputPin::Manager,
        source: PinSource::Step {
            step: locate,
            pin: OutputPin::Manager,
        },
    }];
    for (slot, pin) in [
        (FixedSlot::Path, InputPin::Path),
        (FixedSlot::ItemId, InputPin::ItemId),
        (FixedSlot::Priority, InputPin::Priority),
    ] {
        let source = required_source(node, &mut redirector, slot, create, pin)?;
        inputs.push(StepInput { pin, source });
    }
    inputs.push(StepInput {
        pin: InputPin::Context,
        source: context_source(&mut redirector, create)?,
    });
    steps.push(Step {
        id: create,
        kind: StepKind::CreateOrShow,
        inputs,
        origin: None,
    });

    let handle = PinSource::Step {
        step: create,
        pin: OutputPin::Handle,
    };
    for slot in node.slots().iter() {
        let id = StepId(steps.len() as u32);
        let value = redirector
            .consume(PinKey::Slot(slot.id), id, InputPin::Value)?
            .unwrap_or_else(|| {
                PinSource::Literal(
                    slot.default
                        .clone()
                        .unwrap_or_else(|| Value::default_for(slot.slot_type)),
                )
            });
        steps.push(Step {
            id,
            kind: StepKind::SetNamedProperty {
                property: slot.name.clone(),
                value_type: slot.slot_type,
            },
            inputs: vec![
                StepInput {
                    pin: InputPin::Target,
                    source: handle.clone(),
                },
                StepInput {
                    pin: InputPin::Value,
                    source: value,
                },
            ],
            origin: Some(slot.id),
        });
    }

    let control = chain_control(&steps, create);
    let redirects = redirector.finish()?;

    Ok(ExpansionPlan {
        node_id: node.id().to_string(),
        steps,
        control,
        redirects,
        output: handle,
    })
}

fn context_source(
    redirector: &mut LinkRedirector<'_>,
    step: StepId,
) -> Result<PinSource, LoweringError> {
    Ok(redirector
        .consume(PinKey::Fixed(FixedSlot::Context), step, InputPin::Context)?
        .unwrap_or(PinSource::ImplicitContext))
}

/// A connected pin is redirected; an unconnected one falls back to its literal default.
fn required_source(
    node: &NodeSchema,
    redirector: &mut LinkRedirector<'_>,
    slot: FixedSlot,
    step: StepId,
    pin: InputPin,
) -> Result<PinSource, LoweringError> {
    if let Some(source) = redirector.consume(PinKey::Fixed(slot), step, pin)? {
        return Ok(source);
    }
    node.fixed()
        .literal(slot)
        .map(PinSource::Literal)
        .ok_or_else(|| LoweringError::MissingRequiredInput {
            node_id: node.id().to_string(),
            slot: slot.name().to_string(),
        })
}

/// Strict sequence, with the handle guard right after `CreateOrShow`.
fn chain_control(steps: &[Step], guard_step: StepId) -> Vec<ControlEdge> {
    let mut control = Vec::with_capacity(steps.len() + 1);
    for (index, step) in steps.iter().enumerate() {
        let next = steps
            .get(index + 1)
            .map_or(ControlTarget::Exit, |s| ControlTarget::Step(s.id));
        if step.id == guard_step {
            control.push(ControlEdge {
                from: step.id,
                to: next,
                guard: Guard::IfValid,
            });
            control.push(ControlEdge {
                from: step.id,
                to: ControlTarget::Exit,
                guard: Guard::IfInvalid,
            });
        } else {
            control.push(ControlEdge {
                from: step.id,
                to: next,
                guard: Guard::Always,
            });
        }
    }
    control
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::RedirectAction;
    use crate::schema::{LinkMode, PinRef};
    use crate::value::SlotType;

    fn popup_node() -> NodeSchema {
        let mut node = NodeSchema::new("show_popup");
        node.set_path(Some("UI"));
        node.set_item_id(Some("Popup"));
        node.set_priority(Some(10));
        node
    }

    #[test]
    fn schema_without_slots_still_guards_the_handle() {
        let plan = lower_node(&popup_node()).unwrap();
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(
            plan.control,
            vec![
                ControlEdge {
                    from: StepId(0),
                    to: ControlTarget::Step(StepId(1)),
                    guard: Guard::Always
                },
                ControlEdge {
                    from: StepId(1),
                    to: ControlTarget::Exit,
                    guard: Guard::IfValid
                },
                ControlEdge {
                    from: StepId(1),
                    to: ControlTarget::Exit,
                    guard: Guard::IfInvalid
                },
            ]
        );
        plan.verify().unwrap();
    }

    #[test]
    fn unconnected_slot_without_default_uses_zero_literal() {
        let mut node = popup_node();
        node.add_slot(Some("Count"), SlotType::Integer);
        let plan = lower_node(&node).unwrap();
        assert_eq!(
            plan.steps[2].input(InputPin::Value),
            Some(&PinSource::Literal(Value::Integer(0)))
        );
    }

    #[test]
    fn context_link_is_copied_then_moved() {
        let mut node = popup_node();
        node.connect_fixed(FixedSlot::Context, PinRef::new("world", "self"), LinkMode::Shared)
            .unwrap();
        let plan = lower_node(&node).unwrap();

        let actions: Vec<_> = plan
            .redirects
            .iter()
            .map(|r| (r.target, r.pin, r.action))
            .collect();
        assert_eq!(
            actions,
            vec![
                (StepId(0), InputPin::Context, RedirectAction::Copied),
                (StepId(1), InputPin::Context, RedirectAction::Moved),
            ]
        );
        plan.verify().unwrap();
    }

    #[test]
    fn exclusive_context_cannot_fan_out() {
        let mut node = popup_node();
        node.connect_fixed(FixedSlot::Context, PinRef::new("world", "self"), LinkMode::Exclusive)
            .unwrap();
        assert!(matches!(
            lower_node(&node),
            Err(LoweringError::ExclusiveFanOut { .. })
        ));
    }

    #[test]
    fn exclusive_value_link_is_moved_once() {
        let mut node = popup_node();
        let body = node.add_slot(Some("Body"), SlotType::Text);
        node.connect(PinKey::Slot(body), PinRef::new("loc", "text"), SlotType::Text, LinkMode::Exclusive)
            .unwrap();
        let plan = lower_node(&node).unwrap();
        assert_eq!(plan.redirects.len(), 1);
        assert_eq!(plan.redirects[0].action, RedirectAction::Moved);
        assert_eq!(plan.redirects[0].target, StepId(2));
    }
}
