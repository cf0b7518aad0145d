//! # Node & Port Context
//!
//! Registry of every node in a workflow, its declared ports, and its
//! emitted identity. Built once per workflow before compilation and
//! read-only afterwards: the graph compiler, the pointer resolver, and
//! the expression renderer all resolve ids through this context.

use std::collections::HashMap;

use crate::error::{CompileError, Result};
use crate::graph::{NodeDescription, NodeKind};

/// Arena handle to a registered [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle(usize);

/// Arena handle to a registered [`Port`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortHandle(usize);

/// A registered node with its emitted identity.
#[derive(Debug, Clone)]
pub struct Node {
    /// Stable id from the graph document.
    pub id: String,
    /// Display label from the editor.
    pub label: String,
    /// Class name the emitter will reference.
    pub class_name: String,
    /// Module name the class is emitted under, unique per workflow.
    pub module_name: String,
    /// Ports declared by the node, in declaration order.
    pub ports: Vec<PortHandle>,
    /// The port used for unconditional continuation, when the node has one.
    pub default_port: Option<PortHandle>,
}

/// A named exit point on a node.
#[derive(Debug, Clone)]
pub struct Port {
    /// Id derived from the document's source-handle id.
    pub id: String,
    /// Display name; `"default"` unless the port belongs to a branch.
    pub name: String,
    /// Whether this is the node's default continuation.
    pub is_default: bool,
    /// The one node this port belongs to.
    pub owner: NodeHandle,
}

/// Shared registry of nodes and ports for one workflow.
#[derive(Debug, Default)]
pub struct GraphContext {
    nodes: Vec<Node>,
    ports: Vec<Port>,
    nodes_by_id: HashMap<String, NodeHandle>,
    ports_by_id: HashMap<String, PortHandle>,
}

impl GraphContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a node, derives its emitted identity, and creates its
    /// kind-specific ports.
    ///
    /// Emitted names come from the node's explicit definition metadata
    /// when present, otherwise from the sanitized label. Module-name
    /// collisions are resolved by appending an incrementing numeric
    /// suffix. Registering the same node id twice is a hard error.
    pub fn register(&mut self, desc: &NodeDescription) -> Result<NodeHandle> {
        if self.nodes_by_id.contains_key(&desc.id) {
            return Err(CompileError::DuplicateNode(desc.id.clone()));
        }

        let (class_name, module_base) = match &desc.definition {
            Some(def) => (def.class_name.clone(), def.module_path.clone()),
            None => (class_case(&desc.label), module_case(&desc.label)),
        };
        let module_name = self.free_module_name(module_base);

        let handle = NodeHandle(self.nodes.len());
        self.nodes.push(Node {
            id: desc.id.clone(),
            label: desc.label.clone(),
            class_name,
            module_name,
            ports: Vec::new(),
            default_port: None,
        });
        self.nodes_by_id.insert(desc.id.clone(), handle);

        self.create_ports(handle, desc)?;

        tracing::debug!(
            "[FLOWC] registered node {} as {} ({} ports)",
            desc.id,
            self.nodes[handle.0].module_name,
            self.nodes[handle.0].ports.len(),
        );
        Ok(handle)
    }

    /// Derives a node's ports from its kind and indexes them globally.
    fn create_ports(&mut self, node: NodeHandle, desc: &NodeDescription) -> Result<()> {
        match desc.kind {
            NodeKind::Task => {
                let id = desc
                    .source_handle
                    .clone()
                    .unwrap_or_else(|| format!("{}:default", desc.id));
                let port = self.add_port(Port {
                    id,
                    name: "default".to_string(),
                    is_default: true,
                    owner: node,
                })?;
                self.nodes[node.0].ports.push(port);
                self.nodes[node.0].default_port = Some(port);
            }
            NodeKind::Branch => {
                for branch in &desc.branches {
                    let port = self.add_port(Port {
                        id: branch.id.clone(),
                        name: branch.name.clone(),
                        is_default: false,
                        owner: node,
                    })?;
                    self.nodes[node.0].ports.push(port);
                }
            }
            NodeKind::Note => {}
            NodeKind::Unknown => {
                return Err(CompileError::UnsupportedShape(format!(
                    "unknown kind on node {}",
                    desc.id
                )));
            }
        }
        Ok(())
    }

    fn add_port(&mut self, port: Port) -> Result<PortHandle> {
        if self.ports_by_id.contains_key(&port.id) {
            return Err(CompileError::DuplicatePort(port.id.clone()));
        }
        let handle = PortHandle(self.ports.len());
        self.ports_by_id.insert(port.id.clone(), handle);
        self.ports.push(port);
        Ok(handle)
    }

    /// Picks the first unused module name for `base`, suffixing `_2`,
    /// `_3`, … on collision.
    fn free_module_name(&self, base: String) -> String {
        let taken = |name: &str| self.nodes.iter().any(|n| n.module_name == name);
        if !taken(&base) {
            return base;
        }
        let mut counter = 2usize;
        loop {
            let candidate = format!("{base}_{counter}");
            if !taken(&candidate) {
                return candidate;
            }
            counter += 1;
        }
    }

    /// Resolves a node id to its handle.
    pub fn lookup_node(&self, id: &str) -> Result<NodeHandle> {
        self.nodes_by_id
            .get(id)
            .copied()
            .ok_or_else(|| CompileError::NodeNotFound(id.to_string()))
    }

    /// Resolves a port id to its handle.
    pub fn lookup_port(&self, id: &str) -> Result<PortHandle> {
        self.ports_by_id
            .get(id)
            .copied()
            .ok_or_else(|| CompileError::PortNotFound(id.to_string()))
    }

    /// Returns the node record for a handle.
    pub fn node(&self, handle: NodeHandle) -> &Node {
        &self.nodes[handle.0]
    }

    /// Returns the port record for a handle.
    pub fn port(&self, handle: PortHandle) -> &Port {
        &self.ports[handle.0]
    }

    /// Number of registered nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Lowercases a label into a module name: runs of non-alphanumerics
/// become single underscores.
fn module_case(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut gap = false;
    for ch in label.chars() {
        if ch.is_ascii_alphanumeric() {
            if gap && !out.is_empty() {
                out.push('_');
            }
            gap = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            gap = true;
        }
    }
    if out.is_empty() {
        out.push_str("node");
    } else if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, 'n');
    }
    out
}

/// Turns a label into a PascalCase class name.
fn class_case(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut start_word = true;
    for ch in label.chars() {
        if ch.is_ascii_alphanumeric() {
            if start_word {
                out.push(ch.to_ascii_uppercase());
            } else {
                out.push(ch);
            }
            start_word = false;
        } else {
            start_word = true;
        }
    }
    if out.is_empty() {
        out.push_str("Node");
    } else if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, 'N');
    }
    out
}
