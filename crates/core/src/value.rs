//! Serialized document form. A `DocumentValue` is the JSON shape of a
//! tree: nested nodes carrying kind, alignment, and children, under a
//! schema/version envelope.

use serde::{Deserialize, Serialize};

use crate::editor::{Editor, EditorConfig, EngineError};
use crate::tree::{Alignment, DocumentTree, NodeBody, NodeKey};

fn default_schema() -> String {
    "inkstone".to_string()
}

fn default_version() -> u32 {
    1
}

fn is_left(align: &Alignment) -> bool {
    *align == Alignment::Left
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentValue {
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_version")]
    pub version: u32,
    pub root: NodeValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeValue {
    #[serde(flatten)]
    pub body: NodeBody,
    #[serde(default, skip_serializing_if = "is_left")]
    pub align: Alignment,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeValue>,
}

impl DocumentValue {
    pub fn from_tree(tree: &DocumentTree) -> Self {
        Self {
            schema: default_schema(),
            version: default_version(),
            root: node_value(tree, tree.root()),
        }
    }

    /// Rebuild a keyed tree. The envelope root must be a `Root` node and
    /// `Root` may not appear anywhere below it.
    pub fn into_tree(self) -> Result<DocumentTree, EngineError> {
        if !matches!(self.root.body, NodeBody::Root) {
            return Err(EngineError::InvalidStructure(
                "document root must be a root node".to_string(),
            ));
        }
        let mut tree = DocumentTree::bare();
        let root = tree.root();
        for child in self.root.children {
            build(&mut tree, root, child)?;
        }
        Ok(tree)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

fn node_value(tree: &DocumentTree, key: NodeKey) -> NodeValue {
    let body = tree
        .body(key)
        .cloned()
        .unwrap_or(NodeBody::Text {
            text: String::new(),
            formats: Default::default(),
        });
    NodeValue {
        body,
        align: tree.alignment(key),
        children: tree
            .children(key)
            .iter()
            .map(|child| node_value(tree, *child))
            .collect(),
    }
}

fn build(tree: &mut DocumentTree, parent: NodeKey, value: NodeValue) -> Result<(), EngineError> {
    if matches!(value.body, NodeBody::Root) {
        return Err(EngineError::InvalidStructure(
            "nested root node".to_string(),
        ));
    }
    let key = tree.create(value.body);
    tree.set_alignment_raw(key, value.align);
    let index = tree.children(parent).len();
    tree.attach(parent, index, key);
    for child in value.children {
        build(tree, key, child)?;
    }
    Ok(())
}

impl Editor {
    pub fn from_value(value: DocumentValue) -> Result<Self, EngineError> {
        Self::from_value_with_config(value, EditorConfig::default().with_defaults())
    }

    pub fn from_value_with_config(
        value: DocumentValue,
        config: EditorConfig,
    ) -> Result<Self, EngineError> {
        Ok(Self::from_parts(value.into_tree()?, config))
    }

    pub fn to_value(&self) -> DocumentValue {
        self.read(|tx| DocumentValue::from_tree(tx.tree()))
    }
}
