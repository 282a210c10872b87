use crate::error::LoweringError;
use crate::plan::{InputPin, LinkRedirect, PinSource, RedirectAction, StepId};
use crate::schema::{LinkMode, NodeSchema, PinKey};

/// Tracks which step inputs consume each of the node's original connections and
/// decides, once lowering is done, whether each link is copied or moved there.
///
/// A shared link is copied to every consumer except the last, which takes it over.
/// An exclusive link must have exactly one consumer and is moved to it.
pub(super) struct LinkRedirector<'a> {
    node: &'a NodeSchema,
    consumers: Vec<(PinKey, StepId, InputPin)>,
}

impl<'a> LinkRedirector<'a> {
    pub(super) fn new(node: &'a NodeSchema) -> Self {
        Self {
            node,
            consumers: Vec::new(),
        }
    }

    /// Returns the external source feeding `pin`, recording `step.input` as a consumer.
    /// `None` means the pin is not connected.
    pub(super) fn consume(
        &mut self,
        pin: PinKey,
        step: StepId,
        input: InputPin,
    ) -> Result<Option<PinSource>, LoweringError> {
        let Some(connection) = self.node.connection(pin) else {
            return Ok(None);
        };
        let expected = self
            .node
            .pin_type(pin)
            .ok_or_else(|| LoweringError::InvalidPlan {
                node_id: self.node.id().to_string(),
                message: format!("connection targets unknown pin {}", pin),
            })?;
        if !expected.accepts(connection.source_type) {
            return Err(LoweringError::IncompatibleConnection {
                node_id: self.node.id().to_string(),
                slot: self.node.pin_name(pin),
                expected,
                found: connection.source_type,
            });
        }
        self.consumers.push((pin, step, input));
        Ok(Some(PinSource::External(connection.source.clone())))
    }

    pub(super) fn finish(self) -> Result<Vec<LinkRedirect>, LoweringError> {
        let mut redirects = Vec::with_capacity(self.consumers.len());
        let mut seen: Vec<PinKey> = Vec::new();

        for &(pin, _, _) in &self.consumers {
            if seen.contains(&pin) {
                continue;
            }
            seen.push(pin);

            let Some(connection) = self.node.connection(pin) else {
                continue;
            };
            let targets: Vec<_> = self
                .consumers
                .iter()
                .filter(|(p, _, _)| *p == pin)
                .map(|&(_, step, input)| (step, input))
                .collect();

            if connection.mode == LinkMode::Exclusive && targets.len() > 1 {
                return Err(LoweringError::ExclusiveFanOut {
                    node_id: self.node.id().to_string(),
                    pin,
                    link: connection.source.clone(),
                });
            }

            let last = targets.len() - 1;
            for (index, (target, input)) in targets.into_iter().enumerate() {
                let action = if index == last {
                    RedirectAction::Moved
                } else {
                    RedirectAction::Copied
                };
                redirects.push(LinkRedirect {
                    original: pin,
                    source: connection.source.clone(),
                    action,
                    target,
                    pin: input,
                });
            }
        }
        Ok(redirects)
    }
}
