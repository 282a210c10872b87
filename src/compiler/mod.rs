use crate::error::{CompileError, LoweringError};
use crate::plan::ExpansionPlan;
use crate::schema::{GraphDocument, NodeSchema};
use itertools::Itertools;
use log::debug;

#[cfg(feature = "debug-tools")]
use {crate::plan::visualizer, std::fs, std::path::PathBuf};

mod lowering;
mod redirect;

pub use lowering::lower_node;

/// The lowered form of one node, ready to be spliced into the host graph.
#[derive(Debug, Clone, PartialEq)]
pub struct LoweredNode {
    pub node_id: String,
    pub plan: ExpansionPlan,
}

/// Lowers every create-or-show node of a document.
///
/// A build is all-or-nothing: the first failing node rejects the whole document and
/// no plans are returned.
pub struct Compiler {
    document: GraphDocument,
    verify: bool,
    #[cfg(feature = "debug-tools")]
    debug_dir: Option<PathBuf>,
}

pub struct CompilerBuilder {
    document: GraphDocument,
    verify: bool,
    #[cfg(feature = "debug-tools")]
    debug_dir: Option<PathBuf>,
}

impl CompilerBuilder {
    pub fn new(document: GraphDocument) -> Self {
        Self {
            document,
            verify: true,
            #[cfg(feature = "debug-tools")]
            debug_dir: Some(PathBuf::from("tmp")),
        }
    }

    /// Re-checks every plan's structural invariants after lowering. On by default.
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Where plan listings are written; `None` disables them.
    #[cfg(feature = "debug-tools")]
    pub fn with_debug_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.debug_dir = dir;
        self
    }

    pub fn build(self) -> Compiler {
        Compiler {
            document: self.document,
            verify: self.verify,
            #[cfg(feature = "debug-tools")]
            debug_dir: self.debug_dir,
        }
    }
}

impl Compiler {
    pub fn builder(document: GraphDocument) -> CompilerBuilder {
        CompilerBuilder::new(document)
    }

    pub fn compile(self) -> Result<Vec<LoweredNode>, CompileError> {
        if let Some(id) = self.document.nodes.iter().map(NodeSchema::id).duplicates().next() {
            return Err(CompileError::DuplicateNode(id.to_string()));
        }

        let mut lowered = Vec::with_capacity(self.document.nodes.len());
        for node in &self.document.nodes {
            let plan = self.compile_node(node)?;
            debug!(
                "Lowered node '{}' into {} steps ({} properties)",
                node.id(),
                plan.steps.len(),
                node.slots().len()
            );

            #[cfg(feature = "debug-tools")]
            self.write_debug_file(&plan)?;

            lowered.push(LoweredNode {
                node_id: node.id().to_string(),
                plan,
            });
        }
        Ok(lowered)
    }

    fn compile_node(&self, node: &NodeSchema) -> Result<ExpansionPlan, LoweringError> {
        let plan = lower_node(node)?;
        if self.verify {
            plan.verify().map_err(|message| LoweringError::InvalidPlan {
                node_id: node.id().to_string(),
                message,
            })?;
        }
        Ok(plan)
    }

    #[cfg(feature = "debug-tools")]
    fn write_debug_file(&self, plan: &ExpansionPlan) -> Result<(), CompileError> {
        let Some(dir) = &self.debug_dir else {
            return Ok(());
        };
        let sanitized: String = plan
            .node_id
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        fs::create_dir_all(dir).map_err(|e| {
            CompileError::DebugOutput(format!("Failed to create debug directory: {}", e))
        })?;
        fs::write(
            dir.join(format!("plan_{}.txt", sanitized)),
            visualizer::visualize_plan(plan),
        )
        .map_err(|e| CompileError::DebugOutput(format!("Failed to write debug file: {}", e)))
    }
}
