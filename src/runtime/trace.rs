use crate::plan::StepId;
use crate::value::{ManagerHandle, ObjectHandle};
use itertools::Itertools;

/// A record of one executed (or skipped) part of a chain.
#[derive(Debug, Clone, PartialEq)]
pub enum StepTrace {
    Located {
        step: StepId,
        manager: ManagerHandle,
    },
    Created {
        step: StepId,
        path: String,
        item_id: String,
        handle: ObjectHandle,
    },
    Bound {
        step: StepId,
        property: String,
        bound: bool,
    },
    /// The handle guard took the exit branch; these property steps never ran.
    ShortCircuited { step: StepId, skipped: Vec<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionTrace {
    pub node_id: String,
    pub entries: Vec<StepTrace>,
}

impl ExecutionTrace {
    pub fn new(node_id: &str) -> Self {
        Self {
            node_id: node_id.to_string(),
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: StepTrace) {
        self.entries.push(entry);
    }

    /// Number of property steps that actually ran.
    pub fn properties_attempted(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, StepTrace::Bound { .. }))
            .count()
    }
}

/// Formats execution traces into human-readable strings.
pub struct TraceFormatter;

impl TraceFormatter {
    /// One line per run: the chain of steps in execution order.
    pub fn format_trace(trace: &ExecutionTrace) -> String {
        let body = trace.entries.iter().map(Self::format_entry).join(" -> ");
        format!("{}: {}", trace.node_id, body)
    }

    fn format_entry(entry: &StepTrace) -> String {
        match entry {
            StepTrace::Located { .. } => "Locate".to_string(),
            StepTrace::Created {
                path,
                item_id,
                handle,
                ..
            } => format!("CreateOrShow({}/{}) = {}", path, item_id, handle),
            StepTrace::Bound {
                property, bound, ..
            } => {
                if *bound {
                    format!("{} set", property)
                } else {
                    format!("{} unbound", property)
                }
            }
            StepTrace::ShortCircuited { skipped, .. } if skipped.is_empty() => {
                "exit (invalid handle)".to_string()
            }
            StepTrace::ShortCircuited { skipped, .. } => {
                format!("exit (invalid handle, skipped {})", skipped.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_a_short_circuited_run() {
        let mut trace = ExecutionTrace::new("popup");
        trace.push(StepTrace::Located {
            step: StepId(0),
            manager: ManagerHandle(1),
        });
        trace.push(StepTrace::Created {
            step: StepId(1),
            path: "UI".into(),
            item_id: "Missing".into(),
            handle: ObjectHandle::INVALID,
        });
        trace.push(StepTrace::ShortCircuited {
            step: StepId(1),
            skipped: vec!["Title".into()],
        });
        assert_eq!(
            TraceFormatter::format_trace(&trace),
            "popup: Locate -> CreateOrShow(UI/Missing) = <invalid> -> exit (invalid handle, skipped Title)"
        );
        assert_eq!(trace.properties_attempted(), 0);
    }
}
