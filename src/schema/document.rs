use super::NodeSchema;
use crate::error::{ConversionError, DocumentError};
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Current on-disk format version of a [`GraphDocument`].
pub const DOCUMENT_VERSION: u32 = 1;

/// The authoring document: every create-or-show node of one graph, in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub version: u32,
    pub nodes: Vec<NodeSchema>,
}

impl Default for GraphDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphDocument {
    pub fn new() -> Self {
        Self {
            version: DOCUMENT_VERSION,
            nodes: Vec::new(),
        }
    }

    pub fn with_nodes(nodes: Vec<NodeSchema>) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            nodes,
        }
    }

    pub fn node(&self, id: &str) -> Option<&NodeSchema> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut NodeSchema> {
        self.nodes.iter_mut().find(|n| n.id() == id)
    }

    /// Removes a node together with its schema. Its wiring goes with it.
    pub fn remove_node(&mut self, id: &str) -> Option<NodeSchema> {
        let index = self.nodes.iter().position(|n| n.id() == id)?;
        Some(self.nodes.remove(index))
    }

    /// Checks the version and every node's invariants.
    pub fn validate(&self) -> Result<(), DocumentError> {
        if self.version != DOCUMENT_VERSION {
            return Err(DocumentError::Version {
                found: self.version,
                expected: DOCUMENT_VERSION,
            });
        }
        for node in &self.nodes {
            node.validate()?;
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let document: GraphDocument = serde_json::from_str(json)?;
        document.validate()?;
        Ok(document)
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Serializes the document into the compact binary form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DocumentError> {
        encode_to_vec(self, standard()).map_err(|e| DocumentError::Encode(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocumentError> {
        let document: GraphDocument = decode_from_slice(bytes, standard())
            .map(|(document, _)| document)
            .map_err(|e| DocumentError::Decode(e.to_string()))?;
        document.validate()?;
        Ok(document)
    }

    /// Saves the document. A `.json` extension selects JSON, anything else binary.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DocumentError> {
        let path = path.as_ref();
        let bytes = if is_json(path) {
            self.to_json()?.into_bytes()
        } else {
            self.to_bytes()?
        };
        fs::write(path, bytes).map_err(|source| DocumentError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Loads a document written by [`GraphDocument::save`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| DocumentError::Io {
            path: path.display().to_string(),
            source,
        })?;
        if is_json(path) {
            let json = String::from_utf8_lossy(&bytes);
            Self::from_json(&json)
        } else {
            Self::from_bytes(&bytes)
        }
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// A trait for custom authoring formats that can be converted into a `GraphDocument`.
///
/// Editors keep their own on-disk representation; implementing this trait is the
/// translation layer that lets the compiler consume it.
///
/// # Example
///
/// ```rust,no_run
/// use tenkai::error::ConversionError;
/// use tenkai::schema::{GraphDocument, IntoDocument, NodeSchema};
/// use tenkai::value::Value;
///
/// struct Popup { id: String, title: String }
/// struct PopupSheet(Vec<Popup>);
///
/// impl IntoDocument for PopupSheet {
///     fn into_document(self) -> Result<GraphDocument, ConversionError> {
///         let nodes = self
///             .0
///             .into_iter()
///             .map(|popup| {
///                 let mut node = NodeSchema::new(popup.id);
///                 node.set_path(Some("UI"));
///                 node.set_item_id(Some("Popup"));
///                 node.add_slot_with_default(Some("Title"), Value::String(popup.title));
///                 node
///             })
///             .collect();
///         Ok(GraphDocument::with_nodes(nodes))
///     }
/// }
/// ```
pub trait IntoDocument {
    fn into_document(self) -> Result<GraphDocument, ConversionError>;
}
