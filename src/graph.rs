//! # Workflow Graph Description
//!
//! Input records consumed from the surrounding document layer: the node
//! list, the edge list, and the designated entrypoint. Field names follow
//! the graph document's camelCase wire format.
//!
//! These are interface types only. Schema validation happens upstream;
//! the compiler takes the description as given and tolerates dangling
//! edges by omission.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A complete workflow graph as authored in the visual editor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDescription {
    /// Stable workflow id.
    pub id: String,
    /// Human-readable workflow name.
    pub name: String,
    /// Id of the single designated start node.
    pub entry_node_id: String,
    /// All nodes in the workflow, in document order.
    pub nodes: Vec<NodeDescription>,
    /// All edges between node ports, in document order.
    pub edges: Vec<EdgeDescription>,
}

/// One node of the visual graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescription {
    /// Stable node id.
    pub id: String,
    /// Display label from the editor.
    pub label: String,
    /// Node kind, controlling which ports the node exposes.
    pub kind: NodeKind,
    /// Explicit emitted-name metadata from an external node definition.
    ///
    /// When present it wins over label-derived naming.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<DefinitionRef>,
    /// Source-handle id of the default exit, when the document carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    /// Branch definitions for branching kinds; one named port each.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<BranchDescription>,
    /// Named inputs, each an ordered fallback rule list.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub inputs: BTreeMap<String, Vec<InputRule>>,
}

/// Kind of a node, as far as port derivation is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    /// Regular node with exactly one default exit port.
    Task,
    /// Conditional node with one named, non-default port per branch.
    Branch,
    /// Decorative node (annotations, stickies) with no ports at all.
    Note,
    /// Anything this compiler release does not know about.
    Unknown,
}

impl From<String> for NodeKind {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "task" => NodeKind::Task,
            "branch" => NodeKind::Branch,
            "note" => NodeKind::Note,
            _ => NodeKind::Unknown,
        }
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Task => "task",
            NodeKind::Branch => "branch",
            NodeKind::Note => "note",
            NodeKind::Unknown => "unknown",
        }
        .to_string()
    }
}

/// Emitted class/module names supplied by an external node definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionRef {
    /// Class name to emit for the node.
    pub class_name: String,
    /// Module path to emit the class under.
    pub module_path: String,
}

/// One branch of a branching node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchDescription {
    /// Source-handle id of the branch, referenced by edges.
    pub id: String,
    /// Display name of the branch.
    pub name: String,
}

/// A directed edge between two node ports.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDescription {
    /// Stable edge id.
    pub id: String,
    /// Id of the node the edge leaves.
    pub source_node_id: String,
    /// Id of the port the edge leaves through; `None` means the source
    /// node's default port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_port_id: Option<String>,
    /// Id of the node the edge enters.
    pub target_node_id: String,
    /// Id of the target-side port, carried through for layout purposes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_port_id: Option<String>,
}

/// One rule of a node-input fallback chain.
///
/// Rules are ordered; the first one that resolves at runtime wins. The
/// pointer resolver compiles the list into a coalesce expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum InputRule {
    /// A constant literal value. Never fails to resolve, so any rule
    /// after it is unreachable.
    Constant {
        /// The literal value.
        value: serde_json::Value,
    },
    /// A reference to another node's named output.
    NodeOutput {
        /// Id of the referenced node.
        node_id: String,
        /// Name of the referenced output.
        output: String,
    },
    /// A reference to a workflow-level input variable.
    WorkflowInput {
        /// Name of the workflow input.
        name: String,
    },
    /// A reference to a stored secret.
    Secret {
        /// Name of the secret.
        name: String,
    },
    /// A reference to a node's live invocation counter.
    InvocationCount {
        /// Id of the counted node.
        node_id: String,
    },
}
