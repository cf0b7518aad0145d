//! # Flowc — Workflow Graph Compiler
//!
//! Compiler core for transforming visually-authored workflow graphs
//! (nodes, typed ports, directed edges) into equivalent source
//! expressions against a workflow-execution SDK.
//!
//! The crate covers the graph compilation subsystem of the platform:
//! - The node/port identity model with emitted-name derivation
//! - The graph expression compiler (edge list -> control-flow topology)
//! - The node-input pointer resolver (fallback-chain compiler)
//! - Rendering of compiled expressions into SDK wiring statements
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flowc::{compile_graph, GraphContext, SdkRenderer, WorkflowDescription};
//!
//! let raw = std::fs::read_to_string("workflow.json")?;
//! let document: WorkflowDescription = serde_json::from_str(&raw)?;
//!
//! let mut ctx = GraphContext::new();
//! for node in &document.nodes {
//!     ctx.register(node)?;
//! }
//!
//! let expr = compile_graph(&ctx, &document.entry_node_id, &document.edges)?;
//! let wiring = SdkRenderer::new(&ctx).render_graph(&expr);
//! println!("graph = {wiring}");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! Compilation of one workflow runs through four phases:
//!
//! 1. **Registration** - Every node and its kind-specific ports enter the
//!    shared [`GraphContext`], which derives emitted class/module names
//! 2. **Graph compilation** - The edge list merges breadth-first into one
//!    [`GraphExpr`] describing control-flow topology
//! 3. **Pointer resolution** - Each node-input rule list resolves to a
//!    [`PointerExpr`] fallback chain
//! 4. **Rendering** - [`SdkRenderer`] turns both expression kinds into
//!    SDK source fragments for the surrounding emitter
//!
//! The compiler is synchronous and pure over its inputs: no I/O, no
//! concurrency, no retries. Errors propagate to the caller, which
//! decides whether to abort the run or record the failure and continue
//! with the next workflow.

pub mod codegen;
pub mod compiler;
pub mod context;
pub mod error;
pub mod expr;
pub mod graph;
pub mod pointer;

// Re-export the main compilation API
pub use compiler::compile_graph;
pub use pointer::{resolve_pointer, PointerExpr};

// Re-export the context and IR types
pub use context::{GraphContext, Node, NodeHandle, Port, PortHandle};
pub use error::{CompileError, Result};
pub use expr::{FlatEdge, GraphExpr};

// Re-export the document-layer types
pub use graph::{
    BranchDescription, DefinitionRef, EdgeDescription, InputRule, NodeDescription, NodeKind,
    WorkflowDescription,
};

// Re-export the renderer
pub use codegen::SdkRenderer;
